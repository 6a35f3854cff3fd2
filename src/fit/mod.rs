//! Scoring of a forward model against the observations.
//!
//! Responsibilities:
//!
//! - smooth, calibrate and rebin the model per dataset
//! - Gaussian log-likelihood (diagonal or inverse covariance)
//! - combine likelihood with the P-T smoothness prior

pub mod likelihood;
pub mod objective;

pub use likelihood::*;
pub use objective::*;
