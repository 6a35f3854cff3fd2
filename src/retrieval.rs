//! Immutable run context and the sampling problem built on it.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::data::{DatasetBundle, PressureGrid};
use crate::domain::RetrievalConfig;
use crate::error::{ConfigurationError, EvaluationFailure, REJECT_LOG_PROBABILITY};
use crate::fit::{Evaluation, log_posterior};
use crate::forward::{ForwardModel, RadiativeTransfer};
use crate::plot::DiagnosticPlot;
use crate::prior::PriorTransform;
use crate::sampler::SamplingProblem;
use crate::schema::{Bounds, ParameterSchema, build_schema};

/// Everything an evaluation reads. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct RetrievalContext {
    config: RetrievalConfig,
    bounds: Bounds,
    schema: ParameterSchema,
    datasets: DatasetBundle,
    pressure: PressureGrid,
    knot_pressures: Vec<f64>,
}

impl RetrievalContext {
    pub fn new(
        config: RetrievalConfig,
        bounds: Bounds,
        datasets: DatasetBundle,
    ) -> Result<Self, ConfigurationError> {
        if datasets.is_empty() {
            return Err(ConfigurationError::NoDatasets);
        }
        if !(config.distance.is_finite() && config.distance > 0.0) {
            return Err(ConfigurationError::InvalidDistance {
                value: config.distance,
            });
        }

        let names = datasets.names();
        let schema = build_schema(
            &bounds,
            config.chemistry,
            config.quenching,
            config.pt_profile,
            &config.cloud_species,
            &config.line_species,
            &names,
        )?;
        let bounds = bounds.restrict_to(&schema, config.chemistry, &names);
        bounds.validate()?;

        let pressure = PressureGrid::for_atmosphere(config.is_cloudy());
        let knot_pressures = if config.pt_profile.uses_knots() {
            pressure.knot_pressures()
        } else {
            Vec::new()
        };

        info!(
            parameters = schema.len(),
            datasets = datasets.len(),
            levels = pressure.len(),
            chemistry = %config.chemistry,
            pt_profile = %config.pt_profile,
            cloudy = config.is_cloudy(),
            "retrieval context ready"
        );

        Ok(Self {
            config,
            bounds,
            schema,
            datasets,
            pressure,
            knot_pressures,
        })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Bounds restricted to the entries that apply to this run.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    pub fn datasets(&self) -> &DatasetBundle {
        &self.datasets
    }

    pub fn pressure(&self) -> &PressureGrid {
        &self.pressure
    }

    pub fn knot_pressures(&self) -> &[f64] {
        &self.knot_pressures
    }

    pub fn prior(&self) -> PriorTransform<'_> {
        PriorTransform::new(&self.schema, &self.bounds)
    }

    pub fn dimension(&self) -> usize {
        self.schema.len()
    }
}

/// A run context bound to a radiative-transfer evaluator.
pub struct Retrieval<R> {
    ctx: RetrievalContext,
    radtrans: R,
    plot: Option<DiagnosticPlot>,
}

impl<R: RadiativeTransfer> Retrieval<R> {
    pub fn new(ctx: RetrievalContext, radtrans: R) -> Self {
        Self {
            ctx,
            radtrans,
            plot: None,
        }
    }

    /// Write a diagnostic figure of the first successful evaluation.
    pub fn with_diagnostic_plot(mut self, plot: DiagnosticPlot) -> Self {
        self.plot = Some(plot);
        self
    }

    pub fn context(&self) -> &RetrievalContext {
        &self.ctx
    }

    pub fn radtrans(&self) -> &R {
        &self.radtrans
    }

    pub fn forward_model(&self) -> ForwardModel<'_, R> {
        ForwardModel::new(&self.ctx, &self.radtrans)
    }

    pub fn evaluate(&self, params: &[f64]) -> Result<Evaluation, EvaluationFailure> {
        let evaluation = log_posterior(&self.ctx, &self.radtrans, params)?;
        if let Some(plot) = &self.plot {
            plot.record(&self.ctx, params, &evaluation);
        }
        Ok(evaluation)
    }

    /// Log-probabilities of many parameter vectors, evaluated in parallel.
    pub fn evaluate_batch(&self, batch: &[Vec<f64>]) -> Vec<f64> {
        batch.par_iter().map(|p| self.log_probability(p)).collect()
    }
}

impl<R: RadiativeTransfer> SamplingProblem for Retrieval<R> {
    fn dimension(&self) -> usize {
        self.ctx.dimension()
    }

    fn parameter_names(&self) -> &[String] {
        self.ctx.schema().names()
    }

    fn prior_transform(&self, cube: &mut [f64]) {
        // Length mismatches leave the cube as-is; log_probability rejects them.
        if let Err(err) = self.ctx.prior().transform_in_place(cube) {
            warn!(error = %err, "prior transform skipped");
        }
    }

    fn log_probability(&self, params: &[f64]) -> f64 {
        if params.len() != self.ctx.dimension() {
            warn!(
                expected = self.ctx.dimension(),
                actual = params.len(),
                "parameter vector has the wrong length"
            );
            return REJECT_LOG_PROBABILITY;
        }
        match self.evaluate(params) {
            Ok(evaluation) => evaluation.total(),
            Err(failure) => failure.log_probability(),
        }
    }
}
