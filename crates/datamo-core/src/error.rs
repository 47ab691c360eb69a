//! Error types for datamo-core.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataMoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The output file could not be opened; every write fails until the
    /// writer is reconfigured to a path that opens.
    #[error("log file {} is unavailable: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid tensor: {0}")]
    InvalidTensor(String),
}

pub type Result<T> = std::result::Result<T, DataMoError>;
