//! Checks that must pass before units can be loaded or run.

use std::env;
use std::path::PathBuf;

use crate::config::ConfigStore;
use crate::error::{Result, StoreError};

pub const USER_PATH_ENV: &str = "BIOSIS_USER_PATH";
pub const USER_PATH_KEY: &str = "user_path";

/// Root directory holding the user's units.
///
/// `$BIOSIS_USER_PATH` wins over the `user_path` config value. The directory
/// must exist.
pub fn user_root(config: &ConfigStore) -> Result<PathBuf> {
    let from_env = env::var(USER_PATH_ENV).ok().filter(|v| !v.is_empty());
    let raw = from_env
        .or_else(|| config.get(USER_PATH_KEY).map(str::to_string))
        .ok_or_else(|| StoreError::Environment {
            message: "there is no user_path set".to_string(),
            hint: "run `biosis config --set user_path <dir>`".to_string(),
        })?;

    let root = PathBuf::from(&raw);
    if !root.is_dir() {
        return Err(StoreError::Environment {
            message: format!("user_path '{raw}' is not a directory"),
            hint: "point user_path at the directory holding your units".to_string(),
        });
    }
    Ok(root)
}

/// Driver program for the `user` subcommand: the `driver` config value,
/// resolved against the user root when relative.
pub fn driver_program(config: &ConfigStore, root: &std::path::Path) -> PathBuf {
    let driver = config.get("driver").unwrap_or("driver");
    let path = PathBuf::from(driver);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // The env override is exercised by the CLI tests; these only touch config.

    #[test]
    fn missing_user_path_has_hint() {
        if env::var(USER_PATH_ENV).is_ok() {
            return;
        }
        let home = TempDir::new().unwrap();
        let config = ConfigStore::open(Some(home.path())).unwrap();
        let err = user_root(&config).unwrap_err();
        assert!(err.to_string().contains("biosis config --set user_path"));
    }

    #[test]
    fn configured_user_path_must_exist() {
        if env::var(USER_PATH_ENV).is_ok() {
            return;
        }
        let home = TempDir::new().unwrap();
        let mut config = ConfigStore::open(Some(home.path())).unwrap();
        config
            .set(USER_PATH_KEY, &home.path().join("nope").to_string_lossy())
            .unwrap();
        assert!(matches!(
            user_root(&config),
            Err(StoreError::Environment { .. })
        ));

        let units = TempDir::new().unwrap();
        config
            .set(USER_PATH_KEY, &units.path().to_string_lossy())
            .unwrap();
        assert_eq!(user_root(&config).unwrap(), units.path());
    }

    #[test]
    fn driver_defaults_inside_root() {
        let home = TempDir::new().unwrap();
        let mut config = ConfigStore::open(Some(home.path())).unwrap();
        let root = std::path::Path::new("/units");
        assert_eq!(driver_program(&config, root), root.join("driver"));
        config.set("driver", "/usr/bin/env").unwrap();
        assert_eq!(driver_program(&config, root), PathBuf::from("/usr/bin/env"));
    }
}
