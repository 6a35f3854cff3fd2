//! Prior Transform.

pub mod transform;

pub use transform::*;

use crate::retrieval::RetrievalContext;

/// `n` physical parameter vectors drawn from the prior of a run.
pub fn draw_prior_samples(ctx: &RetrievalContext, n: usize, seed: u64) -> Vec<Vec<f64>> {
    ctx.prior().draw(n, seed)
}
