//! Composition: solar reference abundances, free-chemistry helpers, and cloud
//! base mass fractions.

pub mod abundances;
pub mod clouds;
pub mod solar;

pub use abundances::*;
pub use clouds::*;
pub use solar::*;
