//! Parameter Schema Builder.
//!
//! Responsibilities:
//!
//! - derive the ordered parameter list from the run configuration
//! - keep the name → index contract (and typed slots) for the whole run
//! - filter user bounds down to the ones that apply

pub mod bounds;
pub mod builder;

pub use bounds::*;
pub use builder::*;
