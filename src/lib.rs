//! `atmo-retrieval` library crate.
//!
//! Bayesian retrieval of exoplanet and brown-dwarf emission spectra: a
//! parameter schema, a unit-cube prior transform, a forward model built on a
//! pluggable radiative-transfer evaluator, and a multi-dataset likelihood,
//! exposed to an external nested-sampling engine.
//!
//! The binary (`retrieve`) is a thin wrapper around this library so the core
//! logic is testable without spawning processes.

pub mod app;
pub mod chemistry;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forward;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod prior;
pub mod report;
pub mod retrieval;
pub mod sampler;
pub mod schema;
