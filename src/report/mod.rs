//! Reporting utilities: formatted terminal output for schemas, parameter
//! vectors and evaluations.

pub mod format;

pub use format::*;
