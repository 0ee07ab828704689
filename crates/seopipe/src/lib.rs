//! Public facade crate for `seopipe`.
//!
//! This crate intentionally contains no engine logic of its own.
//! It re-exports the shared types from `seopipe-core` and the pure
//! computation modules from `seopipe-engine`.

pub use seopipe_core::*;
pub use seopipe_engine::{allocate, density, extract, schema, textprep};
