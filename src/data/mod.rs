//! Input data: observed spectra, the pressure grid, and synthetic observations.

pub mod pressure;
pub mod spectrum;
pub mod synthetic;

pub use pressure::*;
pub use spectrum::*;
pub use synthetic::*;
