//! Error types.
//!
//! Three kinds of failure are kept apart:
//!
//! - [`ConfigurationError`]: invalid setup, fatal before sampling starts
//! - [`RejectReason`]: a physically invalid evaluation (designated −∞ outcome)
//! - [`UpstreamFailure`]: the radiative-transfer evaluator itself failed
//!
//! The last two share the same observable effect (the reject sentinel) and are
//! wrapped together in [`EvaluationFailure`]. [`AppError`] is the binary-facing
//! error carrying an exit code.

use crate::domain::Chemistry;

/// Log-probability returned to the sampler for any rejected evaluation.
pub const REJECT_LOG_PROBABILITY: f64 = f64::NEG_INFINITY;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ConfigurationError> for AppError {
    fn from(err: ConfigurationError) -> Self {
        AppError::new(2, format!("Invalid retrieval configuration: {err}"))
    }
}

/// Invalid combination of settings, bounds, or input data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("quenching can only be used with chemistry=equilibrium, got chemistry={chemistry}")]
    QuenchingRequiresEquilibrium { chemistry: Chemistry },

    #[error("cloud species {species:?} can only be used with chemistry=equilibrium, got chemistry={chemistry}")]
    CloudsRequireEquilibrium {
        species: Vec<String>,
        chemistry: Chemistry,
    },

    #[error("parameter name '{name}' appears more than once")]
    DuplicateParameter { name: String },

    #[error("bound '{name}' must be finite with low < high, got [{low}, {high}]")]
    InvalidBound { name: String, low: f64, high: f64 },

    #[error("dataset '{name}': {reason}")]
    InvalidDataset { name: String, reason: String },

    #[error("at least one dataset is required for a retrieval")]
    NoDatasets,

    #[error("distance must be finite and > 0 pc, got {value}")]
    InvalidDistance { value: f64 },

    #[error("unit cube has {actual} coordinates, schema expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("parameter '{name}' is required but missing")]
    MissingParameter { name: String },

    #[error("spectral smoothing and resampling can not be requested together")]
    SmoothingWithResampling,

    #[error("persisted parameters {persisted:?} do not match the current schema {current:?}")]
    ResumeMismatch {
        persisted: Vec<String>,
        current: Vec<String>,
    },
}

/// Designated low-probability outcomes of one evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectReason {
    #[error("negative temperature {value} K at pressure level {index}")]
    NegativeTemperature { index: usize, value: f64 },

    #[error("model spectrum contains {count} non-finite flux values")]
    NonFiniteSpectrum { count: usize },

    #[error("sum of free mass fractions {sum} exceeds unity")]
    AbundanceSumExceedsUnity { sum: f64 },

    #[error("{ratio} = {value} outside bounds [{low}, {high}]")]
    ElementalRatioOutOfBounds {
        ratio: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error("model spectrum does not cover dataset '{dataset}'")]
    ModelOutOfRange { dataset: String },

    #[error("non-finite log-likelihood for dataset '{dataset}'")]
    NonFiniteLikelihood { dataset: String },

    #[error("non-finite log-prior {value}")]
    NonFiniteLogPrior { value: f64 },
}

/// The radiative-transfer evaluator failed (e.g. a numerical fault in the
/// cloud optical depths).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("radiative transfer failed: {message}")]
pub struct UpstreamFailure {
    pub message: String,
}

impl UpstreamFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Any reason an evaluation yields the reject sentinel.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationFailure {
    #[error("evaluation rejected: {0}")]
    Reject(#[from] RejectReason),

    #[error(transparent)]
    Upstream(#[from] UpstreamFailure),
}

impl EvaluationFailure {
    /// The value handed to the sampler.
    pub fn log_probability(&self) -> f64 {
        REJECT_LOG_PROBABILITY
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, EvaluationFailure::Upstream(_))
    }
}
