//! Log-posterior of one physical parameter vector.

use tracing::debug;

use crate::error::{EvaluationFailure, RejectReason};
use crate::fit::likelihood::score;
use crate::forward::{ForwardModel, ForwardOutput, RadiativeTransfer};
use crate::models::roughness_log_prior;
use crate::retrieval::RetrievalContext;
use crate::schema::{ParameterSchema, PtSlots};

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub log_prior: f64,
    pub log_likelihood: f64,
    pub forward: ForwardOutput,
}

impl Evaluation {
    pub fn total(&self) -> f64 {
        self.log_prior + self.log_likelihood
    }
}

/// Extra prior terms not absorbed by the unit-cube transform (the `free`
/// profile smoothness prior); zero otherwise.
pub fn structure_log_prior(schema: &ParameterSchema, params: &[f64]) -> f64 {
    match &schema.slots().pt {
        PtSlots::Free { knots, gamma_r, .. } => {
            let t: Vec<f64> = knots.iter().map(|&i| params[i]).collect();
            roughness_log_prior(&t, params[*gamma_r])
        }
        _ => 0.0,
    }
}

pub fn log_posterior<R: RadiativeTransfer + ?Sized>(
    ctx: &RetrievalContext,
    radtrans: &R,
    params: &[f64],
) -> Result<Evaluation, EvaluationFailure> {
    let log_prior = structure_log_prior(ctx.schema(), params);
    if !log_prior.is_finite() {
        debug!(log_prior, "structure prior is not finite");
        return Err(RejectReason::NonFiniteLogPrior { value: log_prior }.into());
    }
    let forward = ForwardModel::new(ctx, radtrans).evaluate(params)?;
    let log_likelihood = score(
        &forward.spectrum,
        ctx.datasets(),
        &ctx.schema().slots().datasets,
        params,
    )?;

    Ok(Evaluation {
        log_prior,
        log_likelihood,
        forward,
    })
}
