//! Flat key/value configuration persisted as `config.json` in the biosis
//! home directory.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde_json::Value;

use crate::error::{Result, StoreError};

pub const CONFIG_FILE: &str = "config.json";

/// Variables offered by interactive mode even when unset.
pub const CONFIG_VARIABLES: [&str; 4] = ["user_path", "profile_id", "deck_profiles", "driver"];

/// Values that clear a key in interactive mode.
const CLEAR_TOKENS: [&str; 2] = ["\"\"", "''"];

/// Default biosis home: `$BIOSIS_HOME`, else `~/.biosis`.
pub fn default_base_dir() -> PathBuf {
    if let Ok(dir) = env::var("BIOSIS_HOME")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    dirs_home().join(".biosis")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Flatten hand-edited values: numbers and booleans become strings, `null`
/// leaves the key unset, and nested values are rejected by key.
fn scalars(path: &Path, raw: BTreeMap<String, Value>) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    for (key, value) in raw {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(StoreError::InvalidConfig {
                    path: path.to_path_buf(),
                    key,
                    message: "expected a string, number or boolean".to_string(),
                });
            }
        };
        values.insert(key, text);
    }
    Ok(values)
}

/// The configuration document and the file it lives in.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl ConfigStore {
    /// Load `config.json` from `base_dir` (default home when `None`).
    /// A missing file is an empty configuration.
    pub fn open(base_dir: Option<&Path>) -> Result<Self> {
        let base = base_dir.map(PathBuf::from).unwrap_or_else(default_base_dir);
        Self::load(base.join(CONFIG_FILE))
    }

    pub fn load(path: PathBuf) -> Result<Self> {
        let values = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => {
                let raw: BTreeMap<String, Value> =
                    serde_json::from_str(&text).map_err(|source| StoreError::Json {
                        path: path.clone(),
                        source,
                    })?;
                scalars(&path, raw)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        tracing::debug!("loaded {} config values from {}", values.len(), path.display());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    /// Remove a key. Clearing an absent key is a no-op and writes nothing.
    pub fn clear(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `key: value` lines in key order.
    pub fn list(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.values).map_err(|source| {
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, json).map_err(|e| StoreError::io(&self.path, e))?;
        tracing::debug!("saved config to {}", self.path.display());
        Ok(())
    }

    /// Prompt for every known variable plus every key already set, in sorted
    /// order. Empty input skips, `""` or `''` clears, anything else sets.
    pub fn interactive<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> Result<()> {
        let mut keys: Vec<String> = CONFIG_VARIABLES.iter().map(|s| s.to_string()).collect();
        keys.extend(self.values.keys().cloned());
        keys.sort();
        keys.dedup();

        let io_err = |e| StoreError::io("<terminal>", e);
        writeln!(out, "Interactive mode:").map_err(io_err)?;
        for (i, key) in keys.iter().enumerate() {
            write!(out, "Set Key #{} `{key}`: ", i + 1).map_err(io_err)?;
            out.flush().map_err(io_err)?;

            let mut line = String::new();
            if input.read_line(&mut line).map_err(io_err)? == 0 {
                writeln!(out).map_err(io_err)?;
                break;
            }
            let answer = line.trim_end_matches(['\r', '\n']);
            if answer.is_empty() {
                let current = self.get(key).unwrap_or("<unset>");
                writeln!(out, "\tSkipping. `{key}` is `{current}`").map_err(io_err)?;
            } else if CLEAR_TOKENS.contains(&answer) {
                writeln!(out, "\tClearing {key}").map_err(io_err)?;
                self.clear(key)?;
            } else {
                writeln!(out, "\tSetting `{key}` to `{answer}`").map_err(io_err)?;
                self.set(key, answer)?;
            }
        }
        writeln!(out, "Exiting interactive mode.").map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = ConfigStore::open(Some(dir.path())).unwrap();
        assert!(config.is_empty());
        assert!(config.list().is_empty());
    }

    #[test]
    fn scalar_values_load_as_strings() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"user_path": "/units", "retries": 3, "debug": true, "driver": null}"#,
        )
        .unwrap();
        let config = ConfigStore::open(Some(dir.path())).unwrap();
        assert_eq!(config.get("user_path"), Some("/units"));
        assert_eq!(config.get("retries"), Some("3"));
        assert_eq!(config.get("debug"), Some("true"));
        assert_eq!(config.get("driver"), None);
    }

    #[test]
    fn nested_value_names_the_key() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"ok": "x", "profile_id": ["a"]}"#).unwrap();
        let err = ConfigStore::open(Some(dir.path())).unwrap_err();
        assert!(matches!(&err, StoreError::InvalidConfig { key, .. } if key == "profile_id"));
    }

    #[test]
    fn set_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let mut config = ConfigStore::open(Some(dir.path())).unwrap();
        config.set("user_path", "/home/me/automation").unwrap();

        let reloaded = ConfigStore::open(Some(dir.path())).unwrap();
        assert_eq!(reloaded.get("user_path"), Some("/home/me/automation"));
        assert_eq!(reloaded.list(), vec!["user_path: /home/me/automation"]);
    }

    #[test]
    fn clear_removes_key() {
        let dir = TempDir::new().unwrap();
        let mut config = ConfigStore::open(Some(dir.path())).unwrap();
        config.set("driver", "run.sh").unwrap();
        config.clear("driver").unwrap();
        config.clear("never_set").unwrap();
        let reloaded = ConfigStore::open(Some(dir.path())).unwrap();
        assert_eq!(reloaded.get("driver"), None);
    }

    #[test]
    fn list_is_sorted() {
        let dir = TempDir::new().unwrap();
        let mut config = ConfigStore::open(Some(dir.path())).unwrap();
        config.set("zeta", "1").unwrap();
        config.set("alpha", "2").unwrap();
        assert_eq!(config.list(), vec!["alpha: 2", "zeta: 1"]);
    }

    #[test]
    fn corrupt_file_is_json_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();
        let err = ConfigStore::open(Some(dir.path())).unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }

    #[test]
    fn interactive_skips_clears_and_sets() {
        let dir = TempDir::new().unwrap();
        let mut config = ConfigStore::open(Some(dir.path())).unwrap();
        config.set("custom", "keep").unwrap();
        config.set("driver", "old").unwrap();

        // Sorted keys: custom, deck_profiles, driver, profile_id, user_path
        let answers = "\n\n''\nABC-123\n/tmp/units\n";
        let mut out = Vec::new();
        config
            .interactive(Cursor::new(answers), &mut out)
            .unwrap();

        assert_eq!(config.get("custom"), Some("keep"));
        assert_eq!(config.get("deck_profiles"), None);
        assert_eq!(config.get("driver"), None);
        assert_eq!(config.get("profile_id"), Some("ABC-123"));
        assert_eq!(config.get("user_path"), Some("/tmp/units"));

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.starts_with("Interactive mode:"));
        assert!(transcript.contains("Set Key #1 `custom`"));
        assert!(transcript.contains("\tClearing driver"));
        assert!(transcript.trim_end().ends_with("Exiting interactive mode."));
    }

    #[test]
    fn interactive_stops_at_end_of_input() {
        let dir = TempDir::new().unwrap();
        let mut config = ConfigStore::open(Some(dir.path())).unwrap();
        let mut out = Vec::new();
        config.interactive(Cursor::new(""), &mut out).unwrap();
        assert!(config.is_empty());
    }
}
