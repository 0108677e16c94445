//! Small filesystem helpers shared by the compilers.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{CompileError, Result};

/// Write `contents` to `path` through a temp file in the same directory, so
/// readers see either the old file or the new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| CompileError::io(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| CompileError::io(parent, e))?;
    temp.write_all(contents)
        .and_then(|()| temp.flush())
        .map_err(|e| CompileError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| CompileError::io(path, e.error))?;
    Ok(())
}

/// Copy `from` to `to` atomically.
pub fn copy_atomic(from: &Path, to: &Path) -> Result<()> {
    let bytes = fs::read(from).map_err(|e| CompileError::io(from, e))?;
    write_atomic(to, &bytes)
}

/// Delete every regular file directly inside `dir`; a missing directory is
/// already clear.
pub fn clear_dir(dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(CompileError::io(dir, e)),
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| CompileError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| CompileError::io(&path, e))?;
            removed += 1;
        }
    }
    tracing::debug!("removed {removed} stale files from {}", dir.display());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_atomic_creates_parents_and_replaces() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b/manifest.json");
        write_atomic(&target, b"one").unwrap();
        write_atomic(&target, b"two").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "two");
        // no temp files left behind
        assert_eq!(fs::read_dir(target.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn clear_dir_removes_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x.sh"), "").unwrap();
        fs::write(dir.path().join("y.sh"), "").unwrap();
        fs::create_dir(dir.path().join("keep")).unwrap();
        assert_eq!(clear_dir(dir.path()).unwrap(), 2);
        assert!(dir.path().join("keep").is_dir());
        assert_eq!(clear_dir(&dir.path().join("absent")).unwrap(), 0);
    }
}
