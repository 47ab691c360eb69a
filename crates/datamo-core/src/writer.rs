//! The log writer: one output file behind one lock.
//!
//! `Writer::write()` stamps and encodes the item, appends the whole record
//! with a single write and flushes before the lock is released, so records
//! from concurrent threads never interleave. `set_location()` and
//! `set_filename()` take the same lock, so no record spans two files.
//!
//! A file that fails to open does not make construction fail: the writer
//! remembers the failure and every `write()` reports it until a
//! reconfiguration opens a usable file.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::error::{DataMoError, Result};
use crate::models::{Durability, Item, WriterConfig};
use crate::record;
use crate::storage;

/// State of the output file.
enum Handle {
    Open(File),
    /// Opening failed; kept so every write can report why.
    Unavailable { kind: io::ErrorKind, message: String },
    Closed,
}

impl Handle {
    fn open(path: &Path) -> Self {
        match storage::open_append(path) {
            Ok(file) => {
                info!(path = %path.display(), "log file opened");
                Handle::Open(file)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to open log file");
                Handle::Unavailable {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        }
    }

    fn close(self, durability: Durability) {
        if let Handle::Open(mut file) = self {
            let result = match durability {
                Durability::Flush => file.flush(),
                Durability::Sync => file.sync_data(),
            };
            if let Err(e) = result {
                error!(error = %e, "failed to flush log file on close");
            }
        }
    }
}

/// Everything guarded by the writer's lock.
struct State {
    location: PathBuf,
    filename: String,
    handle: Handle,
}

impl State {
    fn path(&self) -> PathBuf {
        storage::log_path(&self.location, &self.filename)
    }

    /// Close the current file, then open the one named by the current
    /// location and filename.
    fn reopen(&mut self, durability: Durability) -> Result<()> {
        std::mem::replace(&mut self.handle, Handle::Closed).close(durability);
        self.handle = Handle::open(&self.path());
        self.ensure_open()
    }

    fn ensure_open(&self) -> Result<()> {
        match self.handle {
            Handle::Open(_) => Ok(()),
            _ => Err(self.unavailable()),
        }
    }

    fn unavailable(&self) -> DataMoError {
        let source = match &self.handle {
            Handle::Unavailable { kind, message } => io::Error::new(*kind, message.clone()),
            Handle::Open(_) | Handle::Closed => {
                io::Error::new(io::ErrorKind::NotConnected, "log file is closed")
            }
        };
        DataMoError::Unavailable {
            path: self.path(),
            source,
        }
    }

    fn append(&mut self, record: &[u8], durability: Durability) -> Result<()> {
        if let Handle::Open(file) = &mut self.handle {
            return storage::append_record(file, record, durability).map_err(DataMoError::from);
        }
        Err(self.unavailable())
    }
}

/// Append-only writer for one DataMo log file.
///
/// All methods take `&self`; share the writer between threads with an
/// `Arc` or scoped threads. Calls block until the lock is free. The lock
/// is not reentrant.
pub struct Writer {
    state: Mutex<State>,
    durability: Durability,
}

impl Writer {
    /// Create a writer appending to `location/log.datamo`.
    ///
    /// Never fails: if the file cannot be opened, the failure surfaces on
    /// the first `write()`.
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self::with_config(WriterConfig::new(location))
    }

    /// Create a writer from a full config, with the same lazy failure as
    /// [`Writer::new`].
    pub fn with_config(config: WriterConfig) -> Self {
        let WriterConfig {
            location,
            filename,
            durability,
        } = config;
        let handle = Handle::open(&storage::log_path(&location, &filename));

        Self {
            state: Mutex::new(State {
                location,
                filename,
                handle,
            }),
            durability,
        }
    }

    /// Create a writer, returning the open error right away instead of on
    /// the first write.
    pub fn open(config: WriterConfig) -> Result<Self> {
        let writer = Self::with_config(config);
        writer.state.lock().ensure_open()?;
        Ok(writer)
    }

    /// Encode `item` and append it as one record.
    ///
    /// The record is flushed (or synced, under [`Durability::Sync`]) before
    /// this returns. I/O failures are returned to the caller; nothing is
    /// retried or buffered for later.
    pub fn write(&self, item: &Item) -> Result<()> {
        let mut state = self.state.lock();
        let record = record::encode(item, &Local::now());
        state.append(&record, self.durability)?;

        debug!(
            kind = %item.kind(),
            name = %item.name(),
            bytes = record.len(),
            "record appended"
        );
        Ok(())
    }

    /// Move the log to `location`, keeping the current filename.
    ///
    /// The old file is closed first. If the new file cannot be opened the
    /// error is returned and later writes fail until the next successful
    /// reconfiguration.
    pub fn set_location(&self, location: impl Into<PathBuf>) -> Result<()> {
        let mut state = self.state.lock();
        state.location = location.into();
        debug!(location = %state.location.display(), "changing log location");
        state.reopen(self.durability)
    }

    /// Switch to `filename` inside the current location.
    pub fn set_filename(&self, filename: impl Into<String>) -> Result<()> {
        let mut state = self.state.lock();
        state.filename = filename.into();
        debug!(filename = %state.filename, "changing log filename");
        state.reopen(self.durability)
    }

    pub fn location(&self) -> PathBuf {
        self.state.lock().location.clone()
    }

    pub fn filename(&self) -> String {
        self.state.lock().filename.clone()
    }

    /// Full path of the current log file.
    pub fn path(&self) -> PathBuf {
        self.state.lock().path()
    }

    pub fn durability(&self) -> Durability {
        self.durability
    }

    /// Whether the current file is open and writes can succeed.
    pub fn is_available(&self) -> bool {
        self.state.lock().ensure_open().is_ok()
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        std::mem::replace(&mut state.handle, Handle::Closed).close(self.durability);
        debug!(path = %state.path().display(), "log writer closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Writer>();
    }

    #[test]
    fn write_appends_one_record() {
        let tmp = TempDir::new().unwrap();
        let writer = Writer::new(tmp.path());
        writer.write(&Item::scalar("Loss", 0.5)).unwrap();

        let bytes = std::fs::read(writer.path()).unwrap();
        assert_eq!(bytes.len(), record::HEADER_LEN + 8);
        assert_eq!(&bytes[..6], record::MAGIC);
    }

    #[test]
    fn accessors_reflect_reconfiguration() {
        let tmp = TempDir::new().unwrap();
        let writer = Writer::new(tmp.path());
        assert_eq!(writer.filename(), "log.datamo");
        assert_eq!(writer.location(), tmp.path());

        writer.set_filename("eval.datamo").unwrap();
        assert_eq!(writer.path(), tmp.path().join("eval.datamo"));
        assert!(writer.is_available());
    }

    #[test]
    fn failed_open_is_reported_on_write() {
        let tmp = TempDir::new().unwrap();
        let writer = Writer::new(tmp.path().join("missing"));
        assert!(!writer.is_available());

        let err = writer.write(&Item::meta_project("p")).unwrap_err();
        match err {
            DataMoError::Unavailable { path, source } => {
                assert_eq!(path, tmp.path().join("missing").join("log.datamo"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
