//! Storage layer: log path resolution and append-mode file handles.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::models::Durability;

/// Path of the log file `filename` inside `location`.
pub fn log_path(location: &Path, filename: &str) -> PathBuf {
    location.join(filename)
}

/// Open `path` for appending, creating the file but not its directory.
pub fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Append one encoded record and push it out according to `durability`.
pub fn append_record(file: &mut File, record: &[u8], durability: Durability) -> io::Result<()> {
    file.write_all(record)?;
    file.flush()?;
    if durability == Durability::Sync {
        file.sync_data()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn append_preserves_existing_content() {
        let tmp = TempDir::new().unwrap();
        let path = log_path(tmp.path(), "log.datamo");
        std::fs::write(&path, b"existing").unwrap();

        let mut file = open_append(&path).unwrap();
        append_record(&mut file, b"+new", Durability::Sync).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"existing+new");
    }

    #[test]
    fn missing_directory_is_not_created() {
        let tmp = TempDir::new().unwrap();
        let path = log_path(&tmp.path().join("missing"), "log.datamo");
        let err = open_append(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
