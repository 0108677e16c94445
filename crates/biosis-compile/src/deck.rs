//! Grid-button deck profiles.
//!
//! A profile directory holds a top-level `manifest.json` plus one nested
//! profile per folder under `Profiles/<id>.sdProfile/`. Each manifest maps a
//! `"row,col"` key to an action descriptor; folders are `Create Folder`
//! actions pointing at the nested profile by UUID.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::{env, thread, time::Duration};

use biosis_core::{Carrier, Icon, RegisteredFunction, Surface};
use serde_json::{Map, Value, json};

use crate::command::{DEFAULT_TIMEOUT, run_command};
use crate::compile::{SurfaceCompiler, print_function_header, print_key};
use crate::error::{CompileError, Result};
use crate::files::{clear_dir, copy_atomic, write_atomic};
use crate::launcher::CompileContext;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const IMAGES_DIR: &str = "Images";
const PROFILE_EXT: &str = "sdProfile";
const FOLDER_ACTION: &str = "Create Folder";
const OPEN_ACTION: &str = "Open";
const OPEN_UUID: &str = "com.elgato.streamdeck.system.open";
const ICON_FILE: &str = "state0.png";

/// Starts and stops the application that owns the profile files.
pub trait AppControl {
    fn terminate(&mut self) -> Result<()>;
    fn launch(&mut self) -> Result<()>;
}

/// The desktop deck application. Process control only happens on Windows;
/// elsewhere both calls are no-ops.
#[derive(Debug, Clone)]
pub struct DeckApp {
    exe: PathBuf,
}

impl Default for DeckApp {
    fn default() -> Self {
        Self {
            exe: PathBuf::from(r"C:\Program Files\Elgato\StreamDeck\StreamDeck.exe"),
        }
    }
}

impl AppControl for DeckApp {
    fn terminate(&mut self) -> Result<()> {
        if !cfg!(windows) {
            tracing::debug!("not on Windows; leaving the deck application alone");
            return Ok(());
        }
        let args = ["/IM", "StreamDeck.exe", "/T", "/F"].map(String::from);
        let output = run_command("taskkill", &args, DEFAULT_TIMEOUT)?;
        if output.success {
            thread::sleep(Duration::from_secs(1));
        }
        Ok(())
    }

    fn launch(&mut self) -> Result<()> {
        if !cfg!(windows) {
            return Ok(());
        }
        let args = vec![
            "/c".to_string(),
            "start".to_string(),
            String::new(),
            self.exe.display().to_string(),
            "--runinbk".to_string(),
        ];
        run_command("cmd", &args, DEFAULT_TIMEOUT)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Profile layout
// ---------------------------------------------------------------------------

/// One deck profile on disk.
#[derive(Debug, Clone)]
pub struct DeckProfile {
    pub path: PathBuf,
}

impl DeckProfile {
    /// Find the profile to compile into.
    ///
    /// `profiles_dir` defaults to the application's profile store under
    /// `%APPDATA%`; `profile_id` defaults to the first profile found.
    pub fn locate(profiles_dir: Option<&Path>, profile_id: Option<&str>) -> Result<Self> {
        let dir = match profiles_dir {
            Some(dir) => dir.to_path_buf(),
            None => env::var("APPDATA")
                .map(|appdata| Path::new(&appdata).join(r"Elgato\StreamDeck\ProfilesV2"))
                .map_err(|_| {
                    CompileError::environment(
                        "no deck profile directory",
                        "install the deck application or run `biosis config --set deck_profiles <dir>`",
                    )
                })?,
        };
        if !dir.is_dir() {
            return Err(CompileError::environment(
                format!("deck profile directory {} not found", dir.display()),
                "run `biosis config --set deck_profiles <dir>`",
            ));
        }

        let id = match profile_id {
            Some(id) => id.to_string(),
            None => first_profile(&dir)?.ok_or_else(|| {
                CompileError::environment(
                    format!("no profiles in {}", dir.display()),
                    "create a profile in the deck application first",
                )
            })?,
        };
        let path = dir.join(format!("{id}.{PROFILE_EXT}"));
        if !path.is_dir() {
            return Err(CompileError::environment(
                format!("deck profile {} not found", path.display()),
                "run `biosis config --set profile_id <id>`",
            ));
        }
        Ok(Self { path })
    }

    /// Directory of a folder's nested profile; `None` is the top level.
    pub fn folder_dir(&self, folder_id: Option<&str>) -> PathBuf {
        match folder_id {
            None => self.path.clone(),
            Some(id) => self
                .path
                .join("Profiles")
                .join(format!("{id}.{PROFILE_EXT}")),
        }
    }

    pub fn manifest_path(&self, folder_id: Option<&str>) -> PathBuf {
        self.folder_dir(folder_id).join(MANIFEST_FILE)
    }

    /// Custom icon directory of one slot.
    pub fn slot_images(&self, folder_id: Option<&str>, coords: &str) -> PathBuf {
        self.folder_dir(folder_id).join(coords).join("CustomImages")
    }

    /// Every reachable folder, keyed by its `/`-joined title path.
    pub fn folders(&self) -> Result<BTreeMap<String, String>> {
        let mut folders = BTreeMap::new();
        let top = read_manifest(&self.manifest_path(None))?;
        let mut trail = HashSet::new();
        for (title, id) in folder_actions(&top, &self.manifest_path(None))? {
            self.walk(&title, &id, &mut trail, &mut folders)?;
        }
        Ok(folders)
    }

    fn walk(
        &self,
        path: &str,
        id: &str,
        trail: &mut HashSet<String>,
        folders: &mut BTreeMap<String, String>,
    ) -> Result<()> {
        if !trail.insert(id.to_string()) {
            tracing::warn!("deck folder {path} loops back to an ancestor; not descending");
            return Ok(());
        }
        folders.insert(path.to_string(), id.to_string());

        let manifest_path = self.manifest_path(Some(id));
        let manifest = read_manifest(&manifest_path)?;
        for (title, child) in folder_actions(&manifest, &manifest_path)? {
            self.walk(&format!("{path}/{title}"), &child, trail, folders)?;
        }
        trail.remove(id);
        Ok(())
    }
}

fn first_profile(dir: &Path) -> Result<Option<String>> {
    let mut ids: Vec<String> = fs::read_dir(dir)
        .map_err(|e| CompileError::io(dir, e))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            (path.extension().is_some_and(|e| e == PROFILE_EXT))
                .then(|| path.file_stem()?.to_str().map(str::to_string))
                .flatten()
        })
        .collect();
    ids.sort();
    Ok(ids.into_iter().next())
}

fn read_manifest(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CompileError::MalformedManifest {
            path: path.to_path_buf(),
            message: "manifest is missing".to_string(),
        },
        _ => CompileError::io(path, e),
    })?;
    let manifest: Value = serde_json::from_str(&text).map_err(|e| CompileError::json(path, e))?;
    if !manifest.get("Actions").is_some_and(Value::is_object) {
        return Err(CompileError::MalformedManifest {
            path: path.to_path_buf(),
            message: "no `Actions` object".to_string(),
        });
    }
    Ok(manifest)
}

fn actions_mut<'a>(manifest: &'a mut Value, path: &Path) -> Result<&'a mut Map<String, Value>> {
    manifest
        .get_mut("Actions")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| CompileError::MalformedManifest {
            path: path.to_path_buf(),
            message: "no `Actions` object".to_string(),
        })
}

/// `(title, profile id)` for each folder action in a manifest.
fn folder_actions(manifest: &Value, path: &Path) -> Result<Vec<(String, String)>> {
    let malformed = |message: &str| CompileError::MalformedManifest {
        path: path.to_path_buf(),
        message: message.to_string(),
    };
    let mut folders = Vec::new();
    let Some(actions) = manifest.get("Actions").and_then(Value::as_object) else {
        return Err(malformed("no `Actions` object"));
    };
    for action in actions.values() {
        if action.get("Name").and_then(Value::as_str) != Some(FOLDER_ACTION) {
            continue;
        }
        let title = action
            .pointer("/States/0/Title")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("folder action without a title"))?;
        let id = action
            .pointer("/Settings/ProfileUUID")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("folder action without a ProfileUUID"))?;
        // Stray newlines typed into folder titles are not part of the path.
        folders.push((title.trim_matches('\n').to_string(), id.to_string()));
    }
    Ok(folders)
}

fn open_action(title: &str, launch: &str) -> Value {
    json!({
        "Name": OPEN_ACTION,
        "Settings": {
            "openInBrowser": true,
            "path": launch,
        },
        "State": 0,
        "States": [{
            "FFamily": "",
            "FSize": "9",
            "FStyle": "",
            "FUnderline": "off",
            "Image": ICON_FILE,
            "Title": title,
            "TitleAlignment": "top",
            "TitleColor": "#ffffff",
            "TitleShow": "",
        }],
        "UUID": OPEN_UUID,
    })
}

/// An action this tool wrote earlier: an `Open` pointing into `launchers`.
fn is_owned(action: &Value, launchers: &str) -> bool {
    action.get("Name").and_then(Value::as_str) == Some(OPEN_ACTION)
        && action
            .pointer("/Settings/path")
            .and_then(Value::as_str)
            .is_some_and(|path| path.contains(launchers))
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Where the profile lives; resolved on each compile.
#[derive(Debug, Clone, Default)]
pub struct DeckSettings {
    pub profiles_dir: Option<PathBuf>,
    pub profile_id: Option<String>,
}

struct Target<'a> {
    entry: &'a RegisteredFunction,
    index: usize,
    location: String,
    folder_id: Option<String>,
    coords: String,
    icon: Option<&'a Icon>,
    title: String,
}

pub struct DeckCompiler<A> {
    settings: DeckSettings,
    app: A,
}

impl<A: AppControl> DeckCompiler<A> {
    pub fn new(settings: DeckSettings, app: A) -> Self {
        Self { settings, app }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    /// Map every location to a folder id, checking folders and icons exist
    /// before anything is written.
    fn plan<'a>(
        &self,
        ctx: &CompileContext,
        entries: &'a [RegisteredFunction],
        folders: &BTreeMap<String, String>,
    ) -> Result<Vec<Target<'a>>> {
        let mut targets = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            let Carrier::Deck(deck) = &entry.carrier else {
                continue;
            };
            if let Some(Icon::File(name)) = &deck.icon {
                let source = ctx.root.join(IMAGES_DIR).join(name);
                if !source.is_file() {
                    return Err(CompileError::MissingIcon { path: source });
                }
            }
            for location in &deck.locations {
                let folder_id = match &location.folder {
                    None => None,
                    Some(folder) => Some(folders.get(folder).cloned().ok_or_else(|| {
                        CompileError::MissingFolder {
                            folder: folder.clone(),
                            function: entry.address(),
                        }
                    })?),
                };
                targets.push(Target {
                    entry,
                    index,
                    location: location.to_string(),
                    folder_id,
                    coords: location.coords(),
                    icon: deck.icon.as_ref(),
                    title: deck.label.clone().unwrap_or_else(|| entry.header.title.clone()),
                });
            }
        }
        Ok(targets)
    }
}

impl<A: AppControl> SurfaceCompiler for DeckCompiler<A> {
    fn surface(&self) -> Surface {
        Surface::Deck
    }

    fn compile(&mut self, ctx: &CompileContext, entries: &[RegisteredFunction]) -> Result<()> {
        let profile = DeckProfile::locate(
            self.settings.profiles_dir.as_deref(),
            self.settings.profile_id.as_deref(),
        )?;

        let folders = profile.folders()?;
        let targets = self.plan(ctx, entries, &folders)?;

        let launcher_dir = ctx.surface_dir(Surface::Deck);
        let owned_marker = launcher_dir.display().to_string();
        let targeted: HashSet<(Option<&str>, &str)> = targets
            .iter()
            .map(|t| (t.folder_id.as_deref(), t.coords.as_str()))
            .collect();

        // Load every known manifest and drop the slots we own.
        let mut manifests: BTreeMap<Option<String>, Value> = BTreeMap::new();
        let mut stale_images = Vec::new();
        let ids = std::iter::once(None).chain(folders.values().cloned().map(Some));
        for id in ids {
            if manifests.contains_key(&id) {
                continue;
            }
            let path = profile.manifest_path(id.as_deref());
            let mut manifest = read_manifest(&path)?;
            let actions = actions_mut(&mut manifest, &path)?;
            let owned: Vec<String> = actions
                .iter()
                .filter(|(_, action)| is_owned(action, &owned_marker))
                .map(|(coords, _)| coords.clone())
                .collect();
            for coords in &owned {
                actions.remove(coords);
                if !targeted.contains(&(id.as_deref(), coords.as_str())) {
                    stale_images.push(profile.slot_images(id.as_deref(), coords));
                }
            }
            if !owned.is_empty() {
                tracing::debug!("removed {} owned slots from {}", owned.len(), path.display());
            }
            manifests.insert(id, manifest);
        }

        // Every profile check has passed; the app may be stopped now.
        self.app.terminate()?;
        clear_dir(&launcher_dir)?;
        for images in &stale_images {
            if images.is_dir() {
                fs::remove_dir_all(images).map_err(|e| CompileError::io(images, e))?;
                tracing::debug!("removed stale icon {}", images.display());
            }
        }

        let mut launches: BTreeMap<usize, String> = BTreeMap::new();
        for target in &targets {
            if !launches.contains_key(&target.index) {
                print_function_header(ctx, target.index, target.entry);
                let launch = ctx.write_launcher(Surface::Deck, target.entry)?;
                print_key("Command", &launch);
                launches.insert(target.index, launch);
            }
            let launch = &launches[&target.index];
            print_key("Location", &target.location);

            let path = profile.manifest_path(target.folder_id.as_deref());
            let manifest = manifests
                .get_mut(&target.folder_id)
                .ok_or_else(|| CompileError::MalformedManifest {
                    path: path.clone(),
                    message: "folder manifest was not loaded".to_string(),
                })?;
            actions_mut(manifest, &path)?
                .insert(target.coords.clone(), open_action(&target.title, launch));

            let images = profile.slot_images(target.folder_id.as_deref(), &target.coords);
            match target.icon {
                None => {}
                Some(Icon::Default) => {
                    print_key("Image", "default");
                    let icon = images.join(ICON_FILE);
                    if icon.exists() {
                        fs::remove_file(&icon).map_err(|e| CompileError::io(&icon, e))?;
                    }
                    if images.is_dir() {
                        fs::remove_dir_all(&images).map_err(|e| CompileError::io(&images, e))?;
                    }
                }
                Some(Icon::File(name)) => {
                    print_key("Image", name);
                    copy_atomic(&ctx.root.join(IMAGES_DIR).join(name), &images.join(ICON_FILE))?;
                }
            }
        }
        println!();

        for (id, manifest) in &manifests {
            let path = profile.manifest_path(id.as_deref());
            let json =
                serde_json::to_vec_pretty(manifest).map_err(|e| CompileError::json(&path, e))?;
            write_atomic(&path, &json)?;
            tracing::info!("wrote {}", path.display());
        }

        if !targets.is_empty() {
            self.app.launch()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biosis_core::{Deck, Function, Meta, Registry};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeApp {
        calls: Vec<&'static str>,
    }

    impl AppControl for FakeApp {
        fn terminate(&mut self) -> Result<()> {
            self.calls.push("terminate");
            Ok(())
        }

        fn launch(&mut self) -> Result<()> {
            self.calls.push("launch");
            Ok(())
        }
    }

    fn folder_action(title: &str, id: &str) -> Value {
        json!({
            "Name": FOLDER_ACTION,
            "Settings": { "ProfileUUID": id },
            "States": [{ "Title": title }],
            "UUID": "com.elgato.streamdeck.profile.openchild",
        })
    }

    /// Profile `P` with folders `Home` (F1) and `Home/Lights` (F2).
    fn profile_fixture() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("P.sdProfile");
        let write = |path: PathBuf, value: Value| {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, serde_json::to_string(&value).unwrap()).unwrap();
        };
        write(
            profile.join(MANIFEST_FILE),
            json!({ "Actions": { "0,1": folder_action("Home", "F1") }, "Name": "Default" }),
        );
        write(
            profile.join("Profiles/F1.sdProfile").join(MANIFEST_FILE),
            json!({ "Actions": { "1,1": folder_action("Lights\n", "F2") } }),
        );
        write(
            profile.join("Profiles/F2.sdProfile").join(MANIFEST_FILE),
            json!({ "Actions": {} }),
        );
        (dir, profile)
    }

    fn settings(dir: &TempDir) -> DeckSettings {
        DeckSettings {
            profiles_dir: Some(dir.path().to_path_buf()),
            profile_id: None,
        }
    }

    fn manifest(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn discovers_nested_folders() {
        let (dir, _) = profile_fixture();
        let profile = DeckProfile::locate(Some(dir.path()), None).unwrap();
        let folders = profile.folders().unwrap();
        assert_eq!(folders.get("Home").map(String::as_str), Some("F1"));
        assert_eq!(folders.get("Home/Lights").map(String::as_str), Some("F2"));
    }

    #[test]
    fn missing_nested_manifest_is_fatal() {
        let (dir, profile) = profile_fixture();
        fs::remove_file(profile.join("Profiles/F2.sdProfile").join(MANIFEST_FILE)).unwrap();
        let located = DeckProfile::locate(Some(dir.path()), None).unwrap();
        assert!(matches!(
            located.folders(),
            Err(CompileError::MalformedManifest { .. })
        ));
    }

    #[test]
    fn missing_profile_dir_is_environment() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            DeckProfile::locate(Some(&dir.path().join("absent")), None),
            Err(CompileError::Environment { .. })
        ));
    }

    #[test]
    fn compile_writes_slots_and_is_idempotent() {
        let (dir, profile) = profile_fixture();
        let root = TempDir::new().unwrap();
        let ctx = CompileContext::new(root.path(), "biosis");

        let mut registry = Registry::new();
        registry.register(
            "home.lights",
            Function::new("lights_on", || Ok(()))
                .with(Deck::at_all(["Home/Lights/1,2", "2,3"]).unwrap())
                .with(Meta::new().title("Lights On")),
        );
        let entries = registry.all_entries_for(Surface::Deck).unwrap();

        let mut compiler = DeckCompiler::new(settings(&dir), FakeApp::default());
        compiler.compile(&ctx, &entries).unwrap();
        compiler.compile(&ctx, &entries).unwrap();
        assert_eq!(
            compiler.app().calls,
            vec!["terminate", "launch", "terminate", "launch"]
        );

        let nested = manifest(&profile.join("Profiles/F2.sdProfile").join(MANIFEST_FILE));
        let actions = nested["Actions"].as_object().unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions["1,2"]["Name"], "Open");
        assert_eq!(actions["1,2"]["States"][0]["Title"], "Lights On");

        let top = manifest(&profile.join(MANIFEST_FILE));
        assert_eq!(top["Actions"].as_object().unwrap().len(), 2);
        assert_eq!(top["Name"], "Default");
        assert!(root.path().join(".compilers/deck").is_dir());
    }

    #[test]
    fn removed_functions_leave_no_slots() {
        let (dir, profile) = profile_fixture();
        let root = TempDir::new().unwrap();
        let ctx = CompileContext::new(root.path(), "biosis");

        let mut registry = Registry::new();
        registry.register(
            "m",
            Function::new("gone", || Ok(())).with(Deck::at("Home/2,2").unwrap()),
        );
        let entries = registry.all_entries_for(Surface::Deck).unwrap();
        let mut compiler = DeckCompiler::new(settings(&dir), FakeApp::default());
        compiler.compile(&ctx, &entries).unwrap();
        compiler.compile(&ctx, &[]).unwrap();

        let home = manifest(&profile.join("Profiles/F1.sdProfile").join(MANIFEST_FILE));
        let actions = home["Actions"].as_object().unwrap();
        assert_eq!(actions.len(), 1, "only the Lights folder remains");
        assert_eq!(compiler.app().calls, vec!["terminate", "launch", "terminate"]);
    }

    #[test]
    fn unknown_folder_is_fatal_before_writing() {
        let (dir, profile) = profile_fixture();
        let root = TempDir::new().unwrap();
        let ctx = CompileContext::new(root.path(), "biosis");
        let before = fs::read_to_string(profile.join(MANIFEST_FILE)).unwrap();

        let mut registry = Registry::new();
        registry.register(
            "m",
            Function::new("f", || Ok(())).with(Deck::at("Nowhere/1,1").unwrap()),
        );
        let entries = registry.all_entries_for(Surface::Deck).unwrap();
        let mut compiler = DeckCompiler::new(settings(&dir), FakeApp::default());
        let err = compiler.compile(&ctx, &entries).unwrap_err();
        assert!(matches!(err, CompileError::MissingFolder { .. }));
        assert_eq!(fs::read_to_string(profile.join(MANIFEST_FILE)).unwrap(), before);
        assert!(compiler.app().calls.is_empty(), "app must keep running");
    }

    #[test]
    fn malformed_manifest_leaves_app_running() {
        let (dir, profile) = profile_fixture();
        fs::write(profile.join("Profiles/F2.sdProfile").join(MANIFEST_FILE), "{}").unwrap();
        let root = TempDir::new().unwrap();
        let ctx = CompileContext::new(root.path(), "biosis");

        let mut registry = Registry::new();
        registry.register(
            "m",
            Function::new("f", || Ok(())).with(Deck::at("Home/1,1").unwrap()),
        );
        let entries = registry.all_entries_for(Surface::Deck).unwrap();
        let mut compiler = DeckCompiler::new(settings(&dir), FakeApp::default());
        assert!(matches!(
            compiler.compile(&ctx, &entries),
            Err(CompileError::MalformedManifest { .. })
        ));
        assert!(compiler.app().calls.is_empty());
    }

    #[test]
    fn removed_slot_loses_its_icon() {
        let (dir, profile) = profile_fixture();
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join(IMAGES_DIR)).unwrap();
        fs::write(root.path().join(IMAGES_DIR).join("sun.png"), b"png").unwrap();
        let ctx = CompileContext::new(root.path(), "biosis");
        let images = profile.join("Profiles/F1.sdProfile/3,1/CustomImages");

        let mut registry = Registry::new();
        registry.register(
            "m",
            Function::new("f", || Ok(())).with(Deck::at("Home/3,1").unwrap().icon("sun.png")),
        );
        let entries = registry.all_entries_for(Surface::Deck).unwrap();
        let mut compiler = DeckCompiler::new(settings(&dir), FakeApp::default());

        compiler.compile(&ctx, &entries).unwrap();
        compiler.compile(&ctx, &entries).unwrap();
        assert_eq!(fs::read(images.join(ICON_FILE)).unwrap(), b"png");

        compiler.compile(&ctx, &[]).unwrap();
        assert!(!images.exists());
    }

    #[test]
    fn icons_are_copied_and_removed() {
        let (dir, profile) = profile_fixture();
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join(IMAGES_DIR)).unwrap();
        fs::write(root.path().join(IMAGES_DIR).join("sun.png"), b"png").unwrap();
        let ctx = CompileContext::new(root.path(), "biosis");
        let icon = profile
            .join("Profiles/F1.sdProfile/3,1/CustomImages")
            .join(ICON_FILE);

        let compile_with = |image: &str| {
            let mut registry = Registry::new();
            registry.register(
                "m",
                Function::new("f", || Ok(())).with(Deck::at("Home/3,1").unwrap().icon(image)),
            );
            let entries = registry.all_entries_for(Surface::Deck).unwrap();
            DeckCompiler::new(settings(&dir), FakeApp::default()).compile(&ctx, &entries)
        };

        compile_with("sun.png").unwrap();
        assert_eq!(fs::read(&icon).unwrap(), b"png");

        compile_with("default").unwrap();
        assert!(!icon.exists());
        assert!(!icon.parent().unwrap().exists());

        assert!(matches!(
            compile_with("missing.png"),
            Err(CompileError::MissingIcon { .. })
        ));
    }
}
