//! Temperature structure models.

pub mod pt_profile;

pub use pt_profile::*;
