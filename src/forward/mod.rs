//! Forward model: physical parameters → model spectrum at the observer.

pub mod evaluator;
pub mod gray;
pub mod radtrans;

pub use evaluator::*;
pub use gray::*;
pub use radtrans::*;
