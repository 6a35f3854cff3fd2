//! Sampler Driver.
//!
//! The nested-sampling engine itself is external: it is reached through the
//! [`NestedSampler`] trait and sees the retrieval only as a
//! [`SamplingProblem`].

pub mod driver;

pub use driver::*;
