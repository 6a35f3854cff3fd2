//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration enums (`Chemistry`, `PtProfile`, `CloudSpecies`)
//! - prior bound value types (`Bound`, `DatasetBounds`, `BoundEntry`)
//! - the run configuration and its persisted record
//! - physical constants

pub mod constants;
pub mod types;

pub use types::*;
