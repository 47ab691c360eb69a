//! datamo-core: record encoding and the append-only writer for DataMo logs.
//!
//! A log is a flat sequence of self-describing binary records. Every
//! record is encoded in memory, appended in one write under the writer's
//! lock, and flushed before `Writer::write` returns, so concurrent
//! producers never interleave bytes.

pub mod error;
pub mod models;
pub mod record;
pub mod storage;
pub mod writer;

#[cfg(feature = "ndarray")]
pub mod ndarray_ext;

pub use error::{DataMoError, Result};
pub use models::{Durability, Item, Kind, Materialize, Payload, Tensor, WriterConfig};
pub use writer::Writer;
