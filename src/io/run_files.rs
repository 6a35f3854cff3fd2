//! Run artifacts next to the sampler output.
//!
//! - `params.json`: ordered parameter names (the index contract of the run)
//! - `radtrans.json`: the [`RunRecord`] needed to rebuild the forward model

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::RunRecord;
use crate::error::AppError;

pub const PARAMS_FILE: &str = "params.json";
pub const RUN_RECORD_FILE: &str = "radtrans.json";

pub fn write_params(dir: &Path, names: &[String]) -> Result<PathBuf, AppError> {
    let path = dir.join(PARAMS_FILE);
    write_json(&path, &names)?;
    Ok(path)
}

/// Parameter names of an earlier run, `None` if the directory has none.
pub fn read_params(dir: &Path) -> Result<Option<Vec<String>>, AppError> {
    let path = dir.join(PARAMS_FILE);
    if !path.exists() {
        return Ok(None);
    }
    read_json(&path).map(Some)
}

pub fn write_run_record(dir: &Path, record: &RunRecord) -> Result<PathBuf, AppError> {
    let path = dir.join(RUN_RECORD_FILE);
    write_json(&path, record)?;
    Ok(path)
}

pub fn read_run_record(dir: &Path) -> Result<RunRecord, AppError> {
    read_json(&dir.join(RUN_RECORD_FILE))
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::new(4, format!("Failed to write '{}': {e}", path.display())))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(4, format!("Failed to open '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid JSON in '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Chemistry, PtProfile, RetrievalConfig};
    use chrono::{TimeZone, Utc};

    #[test]
    fn params_round_trip_and_absence() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_params(dir.path()).unwrap(), None);

        let names = vec!["logg".to_string(), "radius".to_string(), "tint".to_string()];
        write_params(dir.path(), &names).unwrap();
        assert_eq!(read_params(dir.path()).unwrap(), Some(names));
    }

    #[test]
    fn run_record_keeps_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let config = RetrievalConfig {
            object_name: "HR 8799 e".to_string(),
            line_species: vec!["H2O".to_string(), "CO_all_iso".to_string()],
            cloud_species: vec!["MgSiO3(c)_cd".to_string()],
            scattering: true,
            distance: 41.29,
            chemistry: Chemistry::Equilibrium,
            quenching: true,
            pt_profile: PtProfile::Molliere,
        };
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        write_run_record(dir.path(), &RunRecord::from_config(&config, created)).unwrap();

        let back = read_run_record(dir.path()).unwrap();
        assert_eq!(back.cloud_species, config.cloud_species);
        assert_eq!(back.created, created);
        assert!(back.scattering);

        let raw = std::fs::read_to_string(dir.path().join(RUN_RECORD_FILE)).unwrap();
        assert!(raw.contains("\"pt_profile\": \"molliere\""));
    }

    #[test]
    fn malformed_file_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PARAMS_FILE), "{not json").unwrap();
        assert_eq!(read_params(dir.path()).unwrap_err().exit_code(), 2);
    }
}
