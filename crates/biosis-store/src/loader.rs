//! Discovery of units under the user root.

use std::fs;
use std::path::{Path, PathBuf};

use biosis_core::{Registry, module_path_from_file};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, StoreError};
use crate::unit::UnitManifest;

pub const UNIT_EXTENSION: &str = "toml";

/// Output directory for generated artifacts; never scanned for units.
pub const COMPILERS_DIR: &str = ".compilers";

/// A parsed unit file.
#[derive(Debug)]
pub struct Unit {
    pub module_path: String,
    pub path: PathBuf,
    pub manifest: UnitManifest,
}

/// Unit file for a module path: `pkg.mod` → `<root>/pkg/mod.toml`.
pub fn unit_file(root: &Path, module_path: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(module_path.split('.'));
    path.set_extension(UNIT_EXTENSION);
    path
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Every unit file under `root`, in lexical order, skipping hidden
/// directories (including the compiler output) and anything under
/// `exclude`.
pub fn discover(root: &Path, exclude: &[PathBuf]) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !is_hidden(entry) && !exclude.iter().any(|ex| entry.path().starts_with(ex))
        });

    let mut units = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|e| e == UNIT_EXTENSION)
                {
                    units.push(entry.into_path());
                }
            }
            Err(e) => tracing::warn!("skipping unreadable path during discovery: {e}"),
        }
    }
    tracing::debug!("discovered {} units under {}", units.len(), root.display());
    units
}

/// Read and parse one unit file, checking its requirements.
pub fn read_unit(root: &Path, path: &Path) -> Result<Unit> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let module_path = module_path_from_file(relative);

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::MissingRequirement {
                unit: module_path,
                reason: format!("{} does not exist", path.display()),
            });
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };
    let manifest: UnitManifest = toml::from_str(&text).map_err(|source| StoreError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;

    for program in &manifest.requires {
        if which::which(program).is_err() {
            return Err(StoreError::MissingRequirement {
                unit: module_path,
                reason: format!("required program '{program}' is not on PATH"),
            });
        }
    }

    Ok(Unit {
        module_path,
        path: path.to_path_buf(),
        manifest,
    })
}

/// Register every function of `unit` into `registry`.
pub fn register_unit(registry: &mut Registry, root: &Path, unit: Unit) -> Result<()> {
    let count = unit.manifest.functions.len();
    for spec in unit.manifest.functions {
        let function = spec.into_function(root, &unit.module_path)?;
        registry.register(&unit.module_path, function);
    }
    tracing::info!("loaded unit {} ({count} functions)", unit.module_path);
    Ok(())
}

/// Discover and load every unit under `root` into a fresh registry.
///
/// Units that cannot load on this machine are skipped with a warning; any
/// other failure aborts.
pub fn load_all(root: &Path, exclude: &[PathBuf]) -> Result<Registry> {
    let mut registry = Registry::new();
    for path in discover(root, exclude) {
        let unit = match read_unit(root, &path) {
            Ok(unit) => unit,
            Err(e) if e.is_skippable() => {
                tracing::warn!("{e}");
                continue;
            }
            Err(e) => return Err(e),
        };
        register_unit(&mut registry, root, unit)?;
    }
    Ok(registry)
}

/// Load a single unit by module path into a fresh registry.
pub fn load_unit(root: &Path, module_path: &str) -> Result<Registry> {
    let path = unit_file(root, module_path);
    let unit = read_unit(root, &path)?;
    let mut registry = Registry::new();
    register_unit(&mut registry, root, unit)?;
    Ok(registry)
}
