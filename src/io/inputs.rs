//! Retrieval input file.
//!
//! One JSON document holds everything a run needs besides the radiative
//! transfer:
//!
//! ```json
//! {
//!   "config":   { "distance": 41.3, "line_species": ["H2O", "CO_all_iso"], ... },
//!   "bounds":   { "logg": [3.0, 5.0], "gpi": [[0.8, 1.2], null, null] },
//!   "datasets": [ { "name": "gpi", "wavelength": [...], ... } ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{DatasetRecord, bundle_from_records};
use crate::domain::RetrievalConfig;
use crate::error::{AppError, ConfigurationError};
use crate::io::run_files::{read_json, write_json};
use crate::retrieval::RetrievalContext;
use crate::schema::Bounds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalInput {
    pub config: RetrievalConfig,
    #[serde(default)]
    pub bounds: Bounds,
    #[serde(default)]
    pub datasets: Vec<DatasetRecord>,
}

impl RetrievalInput {
    /// Validate the datasets and build the immutable run context.
    pub fn into_context(self) -> Result<RetrievalContext, ConfigurationError> {
        let bundle = bundle_from_records(self.datasets)?;
        RetrievalContext::new(self.config, self.bounds, bundle)
    }
}

pub fn read_retrieval_input(path: &Path) -> Result<RetrievalInput, AppError> {
    read_json(path)
}

pub fn write_retrieval_input(path: &Path, input: &RetrievalInput) -> Result<(), AppError> {
    write_json(path, input)
}

/// Named parameter values, e.g. a posterior sample or a best fit.
pub fn read_named_parameters(path: &Path) -> Result<BTreeMap<String, f64>, AppError> {
    read_json(path)
}

pub fn write_datasets(path: &Path, datasets: &[DatasetRecord]) -> Result<(), AppError> {
    write_json(path, datasets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = r#"{
        "config": {
            "object_name": "test",
            "line_species": ["H2O", "CO"],
            "distance": 20.0,
            "quenching": false
        },
        "bounds": {
            "logg": [3.0, 5.0],
            "gpi": [[0.8, 1.2], [-15.0, -12.0], null],
            "unused": [0.0, 1.0]
        },
        "datasets": [{
            "name": "gpi",
            "wavelength": [1.0, 1.1, 1.2, 1.3],
            "flux": [1e-15, 1.1e-15, 1.2e-15, 1.1e-15],
            "error": [1e-16, 1e-16, 1e-16, 1e-16],
            "spectral_resolution": 50.0
        }]
    }"#;

    #[test]
    fn input_file_builds_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retrieval.json");
        std::fs::write(&path, INPUT).unwrap();

        let input = read_retrieval_input(&path).unwrap();
        let ctx = input.into_context().unwrap();
        let names = ctx.schema().names();
        assert_eq!(names.len(), 12);
        assert_eq!(names[10], "scaling_gpi");
        assert_eq!(names[11], "error_gpi");
        assert!(!ctx.bounds().contains("unused"));
    }

    #[test]
    fn rewritten_input_reads_back_equal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retrieval.json");
        let input: RetrievalInput = serde_json::from_str(INPUT).unwrap();

        write_retrieval_input(&path, &input).unwrap();
        assert_eq!(read_retrieval_input(&path).unwrap(), input);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_retrieval_input(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
