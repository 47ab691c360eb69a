#![doc = include_str!("../../../README.md")]
//!

//! This crate re-exports the item model and writer from `datamo-core`.

pub use datamo_core::*;
