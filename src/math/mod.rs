//! Numerical utilities: interpolation, line-spread smoothing, rebinning, and
//! distribution helpers.

pub mod convolve;
pub mod interp;
pub mod rebin;
pub mod stats;

pub use convolve::*;
pub use interp::*;
pub use rebin::*;
pub use stats::*;
