//! Forward Model Evaluator: physical parameters → observer-frame spectrum.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::chemistry::{bulk_composition, cloud_base_fractions, metal_ratios, total_mass_fraction};
use crate::data::bin_widths;
use crate::domain::constants::dilution_factor;
use crate::error::{ConfigurationError, EvaluationFailure, RejectReason};
use crate::forward::radtrans::{
    ClearChemistry, ClearSkyRequest, CloudyRequest, ModelSpectrum, RadiativeTransfer,
};
use crate::math::{RebinError, gaussian_lsf, rebin_with_widths};
use crate::models::{MolliereParams, first_negative, knot_profile, molliere_profile};
use crate::retrieval::RetrievalContext;
use crate::schema::{ChemSlots, PtSlots, RATIO_BOUNDS};

/// log10 quench pressure passed downstream when quenching is not fitted.
pub const NO_QUENCH_LOG_PRESSURE: f64 = -10.0;

/// Result of one forward evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOutput {
    /// Spectrum scaled to the observer, on the radiative-transfer grid.
    pub spectrum: ModelSpectrum,
    /// Temperature (K) on every level of the pressure grid.
    pub temperature: Vec<f64>,
}

/// Post-processing of a reconstructed model spectrum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumOptions {
    /// Smooth to this spectral resolution.
    pub resolution: Option<f64>,
    /// Rebin onto this wavelength grid (micron).
    pub resample: Option<Vec<f64>>,
    pub contribution: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationFailure),
    #[error("failed to resample model spectrum: {0}")]
    Rebin(#[from] RebinError),
}

/// Binds the run context to a radiative-transfer evaluator.
pub struct ForwardModel<'a, R: RadiativeTransfer + ?Sized> {
    ctx: &'a RetrievalContext,
    radtrans: &'a R,
}

impl<'a, R: RadiativeTransfer + ?Sized> ForwardModel<'a, R> {
    pub fn new(ctx: &'a RetrievalContext, radtrans: &'a R) -> Self {
        Self { ctx, radtrans }
    }

    /// Evaluate the model for a physical parameter vector in schema order.
    pub fn evaluate(&self, params: &[f64]) -> Result<ForwardOutput, EvaluationFailure> {
        self.evaluate_with(params, false)
    }

    fn evaluate_with(&self, params: &[f64], contribution: bool) -> Result<ForwardOutput, EvaluationFailure> {
        let slots = self.ctx.schema().slots();
        let (metallicity, c_o_ratio) = self.bulk(params);

        let temperature = self.temperature(params, metallicity, c_o_ratio);
        if let Some((index, value)) = first_negative(&temperature) {
            debug!(index, value, "negative temperature");
            return Err(RejectReason::NegativeTemperature { index, value }.into());
        }

        let log_p_quench = slots.quench.map_or(NO_QUENCH_LOG_PRESSURE, |i| params[i]);
        let grid = self.ctx.pressure();
        let pressure = grid.radtrans_levels();
        let t_rt = grid.subsample(&temperature);
        let logg = params[slots.logg];

        let spectrum = match (&slots.clouds, &slots.chemistry) {
            (Some(clouds), _) => {
                let fractions: Vec<_> = clouds.fractions.iter().map(|&(s, i)| (s, params[i])).collect();
                let request = CloudyRequest {
                    pressure: &pressure,
                    temperature: &t_rt,
                    logg,
                    c_o_ratio,
                    metallicity,
                    log_p_quench,
                    cloud_base: cloud_base_fractions(metallicity, c_o_ratio, &fractions),
                    fsed: params[clouds.fsed],
                    kzz: params[clouds.kzz],
                    sigma_lnorm: params[clouds.sigma_lnorm],
                    contribution,
                };
                self.radtrans.evaluate_clouds(&request)
            }
            (None, ChemSlots::Equilibrium { .. }) => {
                let request = ClearSkyRequest {
                    pressure: &pressure,
                    temperature: &t_rt,
                    logg,
                    chemistry: ClearChemistry::Equilibrium {
                        c_o_ratio,
                        metallicity,
                        log_p_quench,
                    },
                    contribution,
                };
                self.radtrans.evaluate_clear(&request)
            }
            (None, ChemSlots::Free { species }) => {
                let abundances: BTreeMap<String, f64> =
                    species.iter().map(|s| (s.name.clone(), params[s.index])).collect();
                self.check_free_abundances(&abundances)?;
                let request = ClearSkyRequest {
                    pressure: &pressure,
                    temperature: &t_rt,
                    logg,
                    chemistry: ClearChemistry::Free { abundances },
                    contribution,
                };
                self.radtrans.evaluate_clear(&request)
            }
        }
        .map_err(|err| {
            warn!(error = %err, "radiative transfer failed");
            EvaluationFailure::Upstream(err)
        })?;

        let count = spectrum.non_finite_count();
        if count > 0 {
            if spectrum.flux.len() > 1 {
                warn!(count, "spectrum with NaN values encountered");
            }
            return Err(RejectReason::NonFiniteSpectrum { count }.into());
        }

        let scale = dilution_factor(params[slots.radius], self.ctx.config().distance);
        Ok(ForwardOutput {
            spectrum: spectrum.scaled(scale),
            temperature,
        })
    }

    /// Temperature on every level of the pressure grid.
    pub fn temperature(&self, params: &[f64], metallicity: f64, c_o_ratio: f64) -> Vec<f64> {
        let levels = self.ctx.pressure().levels();
        match &self.ctx.schema().slots().pt {
            PtSlots::Molliere(s) => {
                let p = MolliereParams {
                    tint: params[s.tint],
                    t1: params[s.t1],
                    t2: params[s.t2],
                    t3: params[s.t3],
                    alpha: params[s.alpha],
                    log_delta: params[s.log_delta],
                };
                molliere_profile(&p, levels, |t| {
                    self.radtrans.adiabatic_gradient(levels, t, metallicity, c_o_ratio)
                })
            }
            PtSlots::Free { knots, .. } | PtSlots::Monotonic { knots } => {
                let t: Vec<f64> = knots.iter().map(|&i| params[i]).collect();
                knot_profile(self.ctx.knot_pressures(), &t, levels)
            }
        }
    }

    /// Metallicity and C/O: fitted under equilibrium chemistry, derived from
    /// the abundances under free chemistry.
    fn bulk(&self, params: &[f64]) -> (f64, f64) {
        match &self.ctx.schema().slots().chemistry {
            ChemSlots::Equilibrium {
                metallicity,
                c_o_ratio,
            } => (params[*metallicity], params[*c_o_ratio]),
            ChemSlots::Free { species } => {
                bulk_composition(species.iter().map(|s| (s.name.as_str(), params[s.index])))
            }
        }
    }

    fn check_free_abundances(&self, abundances: &BTreeMap<String, f64>) -> Result<(), RejectReason> {
        let pairs = || abundances.iter().map(|(k, v)| (k.as_str(), *v));

        let sum = total_mass_fraction(pairs());
        if sum > 1.0 {
            debug!(sum, "mass fractions exceed unity");
            return Err(RejectReason::AbundanceSumExceedsUnity { sum });
        }

        let bounds = self.ctx.bounds();
        let c_h_bound = bounds.range(RATIO_BOUNDS[0]);
        let o_h_bound = bounds.range(RATIO_BOUNDS[1]);
        if c_h_bound.is_none() && o_h_bound.is_none() {
            return Ok(());
        }

        let (c_h, o_h) = metal_ratios(pairs());
        for (ratio, value, bound) in [("C/H", c_h, c_h_bound), ("O/H", o_h, o_h_bound)] {
            if let Some(b) = bound {
                if !b.contains(value) {
                    debug!(ratio, value, "elemental ratio outside bounds");
                    return Err(RejectReason::ElementalRatioOutOfBounds {
                        ratio,
                        value,
                        low: b.low(),
                        high: b.high(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Rebuild a model spectrum from named parameter values (e.g. a posterior
    /// sample read back from disk).
    pub fn model_for_named(
        &self,
        named: &BTreeMap<String, f64>,
        options: &SpectrumOptions,
    ) -> Result<ModelSpectrum, ModelError> {
        if options.resolution.is_some() && options.resample.is_some() {
            return Err(ConfigurationError::SmoothingWithResampling.into());
        }

        let params = self.ctx.schema().vector_from_named(named)?;
        let mut spectrum = self.evaluate_with(&params, options.contribution)?.spectrum;

        if let Some(resolution) = options.resolution {
            spectrum.flux = gaussian_lsf(&spectrum.wavelength, &spectrum.flux, resolution);
        }

        if let Some(grid) = &options.resample {
            let widths = bin_widths(grid);
            spectrum.flux = rebin_with_widths(&spectrum.wavelength, &spectrum.flux, grid, &widths)?;
            spectrum.wavelength = grid.clone();
            spectrum.contribution = None;
        }

        Ok(spectrum)
    }
}
