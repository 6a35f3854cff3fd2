//! Input/output helpers.
//!
//! - retrieval input JSON (`inputs`)
//! - run artifacts persisted next to the sampler output (`run_files`)

pub mod inputs;
pub mod run_files;

pub use inputs::*;
pub use run_files::*;
