//! Data models for datamo: loggable items, tensors and writer configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DataMoError, Result};
use crate::record::NAME_LEN;
use crate::storage;

/// File name used when none is configured.
pub const DEFAULT_FILENAME: &str = "log.datamo";

/// Kind of a record. The discriminants are the on-disk type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum Kind {
    Scalar = 0,
    Tensor = 1,
    MetaProject = 2,
    String = 3,
}

impl Kind {
    /// The 16-bit type tag written into the record header.
    pub fn code(self) -> i16 {
        self as i16
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Scalar => write!(f, "SCALAR"),
            Kind::Tensor => write!(f, "TENSOR"),
            Kind::MetaProject => write!(f, "META_PROJECT"),
            Kind::String => write!(f, "STRING"),
        }
    }
}

/// A dense float64 tensor in row-major order together with its dimension
/// descriptor `[rank, dim_0, ..., dim_{rank-1}]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f64>,
    descriptor: Vec<i32>,
}

impl Tensor {
    /// Build a tensor from a shape and its row-major values.
    ///
    /// Fails if `data` does not hold exactly as many values as the shape
    /// describes, or if the rank or any extent does not fit in 32 bits.
    pub fn new(shape: &[usize], data: Vec<f64>) -> Result<Self> {
        let rank = i32::try_from(shape.len()).map_err(|_| {
            DataMoError::InvalidTensor(format!("rank {} does not fit in 32 bits", shape.len()))
        })?;

        let mut descriptor = Vec::with_capacity(shape.len() + 1);
        descriptor.push(rank);

        let mut elements: usize = 1;
        for (axis, &extent) in shape.iter().enumerate() {
            let dim = i32::try_from(extent).map_err(|_| {
                DataMoError::InvalidTensor(format!(
                    "extent {extent} of axis {axis} does not fit in 32 bits"
                ))
            })?;
            descriptor.push(dim);
            elements = elements.checked_mul(extent).ok_or_else(|| {
                DataMoError::InvalidTensor(format!("shape {shape:?} overflows the element count"))
            })?;
        }

        if elements != data.len() {
            return Err(DataMoError::InvalidTensor(format!(
                "shape {shape:?} holds {elements} values but {} were supplied",
                data.len()
            )));
        }

        Ok(Self { data, descriptor })
    }

    /// A rank-0 tensor holding a single value.
    pub fn scalar(value: f64) -> Self {
        Self {
            data: vec![value],
            descriptor: vec![0],
        }
    }

    pub fn rank(&self) -> usize {
        self.descriptor.len() - 1
    }

    pub fn shape(&self) -> Vec<usize> {
        self.descriptor[1..].iter().map(|&d| d as usize).collect()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn descriptor(&self) -> &[i32] {
        &self.descriptor
    }

    /// Bytes taken by the dimension descriptor on disk.
    pub fn descriptor_len(&self) -> usize {
        self.descriptor.len() * std::mem::size_of::<i32>()
    }

    /// Bytes taken by the values on disk.
    pub fn data_len(&self) -> usize {
        self.data.len() * std::mem::size_of::<f64>()
    }
}

/// Conversion of a tensor-like value into a host-resident float64 buffer
/// plus its shape.
///
/// Implementors normalize device placement, dtype and memory layout away;
/// the encoder only ever sees the resulting [`Tensor`].
pub trait Materialize {
    fn materialize(&self) -> Result<Tensor>;
}

impl Materialize for Tensor {
    fn materialize(&self) -> Result<Tensor> {
        Ok(self.clone())
    }
}

impl Materialize for f64 {
    fn materialize(&self) -> Result<Tensor> {
        Ok(Tensor::scalar(*self))
    }
}

impl Materialize for [f64] {
    fn materialize(&self) -> Result<Tensor> {
        Tensor::new(&[self.len()], self.to_vec())
    }
}

impl Materialize for Vec<f64> {
    fn materialize(&self) -> Result<Tensor> {
        self.as_slice().materialize()
    }
}

/// Payload of an item, one variant per [`Kind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Scalar(f64),
    Tensor(Tensor),
    MetaProject,
    String(String),
}

/// One loggable item: a name and a typed payload.
///
/// Items are immutable once built and are consumed by a single
/// [`Writer::write`](crate::Writer::write) call.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    name: String,
    payload: Payload,
}

impl Item {
    pub fn scalar(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Scalar(value),
        }
    }

    /// Materialize `source` and wrap it as a tensor item.
    pub fn tensor<T>(name: impl Into<String>, source: &T) -> Result<Self>
    where
        T: Materialize + ?Sized,
    {
        Ok(Self::from_tensor(name, source.materialize()?))
    }

    pub fn from_tensor(name: impl Into<String>, tensor: Tensor) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Tensor(tensor),
        }
    }

    /// Project tag; carries no payload.
    pub fn meta_project(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::MetaProject,
        }
    }

    pub fn string(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::String(text.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn kind(&self) -> Kind {
        match self.payload {
            Payload::Scalar(_) => Kind::Scalar,
            Payload::Tensor(_) => Kind::Tensor,
            Payload::MetaProject => Kind::MetaProject,
            Payload::String(_) => Kind::String,
        }
    }

    /// Value of the header's payload-size field: everything that follows
    /// the header, including the dimension descriptor for tensors.
    pub fn payload_size(&self) -> usize {
        match &self.payload {
            Payload::Tensor(tensor) => tensor.descriptor_len() + tensor.data_len(),
            _ => self.raw_len(),
        }
    }

    /// Length of the raw payload bytes, excluding any descriptor.
    pub fn raw_len(&self) -> usize {
        match &self.payload {
            Payload::Scalar(_) => std::mem::size_of::<f64>(),
            Payload::Tensor(tensor) => tensor.data_len(),
            Payload::MetaProject => 0,
            Payload::String(text) => text.len(),
        }
    }

    /// Whether the name is longer than the record's name field and will be
    /// truncated when encoded.
    pub fn name_overflows(&self) -> bool {
        self.name.len() > NAME_LEN
    }
}

/// How far a record is pushed before `write` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Durability {
    /// Hand the bytes to the OS.
    #[default]
    Flush,
    /// Also wait for the OS to persist the file data.
    Sync,
}

/// Configuration for a [`Writer`](crate::Writer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Directory holding the log file
    pub location: PathBuf,
    /// Name of the log file inside `location` (default: "log.datamo")
    #[serde(default = "default_filename")]
    pub filename: String,
    /// Flush or sync after every record (default: flush)
    #[serde(default)]
    pub durability: Durability,
}

fn default_filename() -> String {
    DEFAULT_FILENAME.to_string()
}

impl WriterConfig {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            filename: default_filename(),
            durability: Durability::default(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    pub fn log_path(&self) -> PathBuf {
        storage::log_path(&self.location, &self.filename)
    }
}
