use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::RunRecord;
use crate::error::{AppError, ConfigurationError};
use crate::forward::RadiativeTransfer;
use crate::io::{read_params, write_params, write_run_record};
use crate::retrieval::{Retrieval, RetrievalContext};

/// What a nested-sampling engine sees of a retrieval.
///
/// The engine calls `prior_transform` on a unit-cube sample and passes the
/// result to `log_probability`. Both are called concurrently.
pub trait SamplingProblem: Sync {
    fn dimension(&self) -> usize;

    fn parameter_names(&self) -> &[String];

    /// Overwrite a unit-cube sample with physical parameter values.
    ///
    /// A cube whose length differs from `dimension()` is left unchanged;
    /// `log_probability` rejects it afterwards.
    fn prior_transform(&self, cube: &mut [f64]);

    /// Log-posterior of a physical parameter vector; `-∞` for rejected points.
    fn log_probability(&self, params: &[f64]) -> f64;
}

/// Engine settings forwarded verbatim to the sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerSettings {
    pub live_points: usize,
    pub resume: bool,
    pub const_efficiency: bool,
    pub sampling_efficiency: f64,
    pub evidence_tolerance: f64,
    /// Prefix of the engine's output files inside the output directory.
    pub output_basename: String,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            live_points: 2000,
            resume: false,
            const_efficiency: true,
            sampling_efficiency: 0.05,
            evidence_tolerance: 0.5,
            output_basename: "retrieval_".to_string(),
        }
    }
}

/// Summary returned by an engine after convergence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerReport {
    pub log_evidence: f64,
    pub log_evidence_error: f64,
    /// Number of posterior samples written by the engine.
    pub samples: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("sampler engine failed: {0}")]
    Engine(String),
    #[error("sampler output could not be written: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SamplerError> for AppError {
    fn from(err: SamplerError) -> Self {
        match err {
            SamplerError::Engine(_) => AppError::new(3, err.to_string()),
            SamplerError::Io(_) => AppError::new(4, err.to_string()),
        }
    }
}

/// A nested-sampling engine.
pub trait NestedSampler {
    fn run(
        &mut self,
        problem: &dyn SamplingProblem,
        settings: &SamplerSettings,
        output_dir: &Path,
    ) -> Result<SamplerReport, SamplerError>;
}

/// Create `output_dir` and write `params.json` and `radtrans.json`.
///
/// On resume the parameter list already in `output_dir` must match the
/// current schema exactly, since the engine's stored samples are indexed by
/// position.
pub fn prepare_output(ctx: &RetrievalContext, resume: bool, output_dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create output directory '{}': {e}", output_dir.display()),
        )
    })?;

    let names = ctx.schema().names();
    if resume {
        if let Some(persisted) = read_params(output_dir)? {
            if persisted != names {
                return Err(ConfigurationError::ResumeMismatch {
                    persisted,
                    current: names.to_vec(),
                }
                .into());
            }
        }
    }

    write_params(output_dir, names)?;
    write_run_record(output_dir, &RunRecord::from_config(ctx.config(), Utc::now()))?;
    Ok(())
}

/// Persist the run artifacts and hand the retrieval to `engine`.
pub fn run_retrieval<R, S>(
    retrieval: &Retrieval<R>,
    engine: &mut S,
    settings: &SamplerSettings,
    output_dir: &Path,
) -> Result<SamplerReport, AppError>
where
    R: RadiativeTransfer,
    S: NestedSampler + ?Sized,
{
    prepare_output(retrieval.context(), settings.resume, output_dir)?;

    info!(
        dimension = retrieval.dimension(),
        live_points = settings.live_points,
        resume = settings.resume,
        output = %output_dir.display(),
        "starting nested sampling"
    );

    let report = engine.run(retrieval, settings, output_dir)?;

    info!(
        log_evidence = report.log_evidence,
        log_evidence_error = report.log_evidence_error,
        samples = report.samples,
        "nested sampling finished"
    );
    Ok(report)
}
