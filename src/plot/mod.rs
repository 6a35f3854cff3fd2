//! Diagnostic spectrum figure.
//!
//! During sampling the figure is a side channel: the first successful
//! evaluation writes `spectrum.txt` to the output directory and later calls
//! are no-ops. Write failures are logged and never affect the score.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};

pub mod ascii;

pub use ascii::*;

use crate::fit::{Evaluation, Nuisance, dataset_model};
use crate::retrieval::RetrievalContext;

pub const DIAGNOSTIC_FILE: &str = "spectrum.txt";

#[derive(Debug)]
pub struct DiagnosticPlot {
    path: PathBuf,
    width: usize,
    height: usize,
    written: Mutex<bool>,
}

impl DiagnosticPlot {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            path: output_dir.join(DIAGNOSTIC_FILE),
            width: 100,
            height: 30,
            written: Mutex::new(false),
        }
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_written(&self) -> bool {
        self.written.lock().map(|w| *w).unwrap_or(true)
    }

    /// Write the figure for `evaluation` unless one was already written.
    pub fn record(&self, ctx: &RetrievalContext, params: &[f64], evaluation: &Evaluation) {
        let Ok(mut written) = self.written.lock() else {
            return;
        };
        if *written {
            return;
        }
        *written = true;

        let text = render_evaluation(ctx, params, evaluation, self.width, self.height);
        match std::fs::write(&self.path, text) {
            Ok(()) => info!(path = %self.path.display(), "wrote diagnostic spectrum"),
            Err(err) => warn!(path = %self.path.display(), error = %err, "failed to write diagnostic spectrum"),
        }
    }
}

/// ASCII figure of one evaluation: the smoothed model of the first dataset
/// as a curve, every dataset's observed and rebinned fluxes as overlays.
pub fn render_evaluation(
    ctx: &RetrievalContext,
    params: &[f64],
    evaluation: &Evaluation,
    width: usize,
    height: usize,
) -> String {
    let model = &evaluation.forward.spectrum;
    let slots = &ctx.schema().slots().datasets;

    let mut fits = Vec::new();
    for (dataset, slot) in ctx.datasets().iter().zip(slots) {
        let nuisance = Nuisance::from_slots(slot, params);
        if let Ok(fit) = dataset_model(model, &dataset.spectrum, &nuisance) {
            let observed: Vec<f64> = dataset.spectrum.flux.iter().map(|f| nuisance.scaling * f).collect();
            fits.push((fit, observed));
        }
    }

    let curve: Vec<(f64, f64)> = match fits.first() {
        Some((fit, _)) => model.wavelength.iter().copied().zip(fit.smoothed.iter().copied()).collect(),
        None => model.wavelength.iter().copied().zip(model.flux.iter().copied()).collect(),
    };

    let overlays: Vec<SpectrumOverlay<'_>> = fits
        .iter()
        .map(|(fit, observed)| SpectrumOverlay {
            wavelength: &fit.wavelength,
            observed,
            model: &fit.rebinned,
        })
        .collect();

    let mut out = render_spectrum_plot(&curve, &overlays, width, height);
    out.push_str(&format!(
        "log_prior={:.4} log_likelihood={:.4} total={:.4}\n",
        evaluation.log_prior,
        evaluation.log_likelihood,
        evaluation.total()
    ));
    out
}
