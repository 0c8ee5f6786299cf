//! Temp-file-then-rename file writes.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically replaces `path` with `bytes`.
///
/// Writes to a temp file in the destination directory, flushes and syncs it,
/// then renames it over `path`. On any error the temp file is removed and
/// `path` keeps its previous content (or stays absent).
pub fn write_file_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    // `Path::parent` yields `Some("")` for bare file names like `out.xlsx`.
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.as_file_mut().write_all(bytes)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;

    // Never delete `path` to make room: a failed rename must leave it intact.
    tmp.persist(path).map(|_| ()).map_err(|err| err.error)
}

#[cfg(test)]
mod tests {
    use super::write_file_atomic;

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"old content").unwrap();

        write_file_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.bin");
        write_file_atomic(&path, b"x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn failed_rename_keeps_destination_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("taken");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("child"), b"keep").unwrap();

        assert!(write_file_atomic(&target, b"x").is_err());
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(std::fs::read(target.join("child")).unwrap(), b"keep");
    }
}
