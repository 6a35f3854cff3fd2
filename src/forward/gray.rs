//! Gray reference atmosphere.
//!
//! Emits a blackbody at the temperature of the level closest to a fixed
//! photospheric pressure. It ignores composition and clouds, which makes it a
//! cheap stand-in evaluator for exercising the retrieval pipeline end to end.

use nalgebra::DMatrix;

use crate::domain::constants::{BOLTZMANN, LIGHT, PLANCK};
use crate::error::UpstreamFailure;
use crate::forward::radtrans::{ClearSkyRequest, CloudyRequest, ModelSpectrum, RadiativeTransfer};

#[derive(Debug, Clone, PartialEq)]
pub struct GrayAtmosphere {
    wavelength: Vec<f64>,
    photosphere: f64,
}

impl GrayAtmosphere {
    /// Photospheric pressure (bar) unless overridden.
    pub const DEFAULT_PHOTOSPHERE: f64 = 1.0;

    pub fn new(wavelength: Vec<f64>) -> Self {
        Self {
            wavelength,
            photosphere: Self::DEFAULT_PHOTOSPHERE,
        }
    }

    /// Grid of constant resolving power covering `[low, high]` micron.
    pub fn for_window(low: f64, high: f64, resolving_power: f64) -> Self {
        let n = ((high / low).ln() * resolving_power).ceil().max(1.0) as usize + 1;
        let step = (high / low).ln() / (n as f64 - 1.0);
        let wavelength = (0..n).map(|i| low * (step * i as f64).exp()).collect();
        Self::new(wavelength)
    }

    pub fn with_photosphere(mut self, pressure: f64) -> Self {
        self.photosphere = pressure;
        self
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    fn emit(&self, pressure: &[f64], temperature: &[f64], contribution: bool) -> Result<ModelSpectrum, UpstreamFailure> {
        if pressure.is_empty() || pressure.len() != temperature.len() {
            return Err(UpstreamFailure::new(format!(
                "pressure/temperature lengths differ ({}/{})",
                pressure.len(),
                temperature.len()
            )));
        }

        let target = self.photosphere.log10();
        let level = pressure
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.log10() - target)
                    .abs()
                    .total_cmp(&(b.log10() - target).abs())
            })
            .map(|(i, _)| i)
            .unwrap_or(0);

        let t = temperature[level];
        let flux = self
            .wavelength
            .iter()
            .map(|&wl| std::f64::consts::PI * planck_lambda(wl, t))
            .collect();

        let contribution = contribution.then(|| {
            DMatrix::from_fn(pressure.len(), self.wavelength.len(), |i, _| {
                if i == level { 1.0 } else { 0.0 }
            })
        });

        Ok(ModelSpectrum {
            wavelength: self.wavelength.clone(),
            flux,
            contribution,
        })
    }
}

/// Planck function `B_λ` (W m-2 micron-1 sr-1) at `wavelength` micron.
pub fn planck_lambda(wavelength: f64, temperature: f64) -> f64 {
    let wl = wavelength * 1e-6;
    let x = PLANCK * LIGHT / (wl * BOLTZMANN * temperature);
    2.0 * PLANCK * LIGHT * LIGHT / wl.powi(5) / x.exp_m1() * 1e-6
}

impl RadiativeTransfer for GrayAtmosphere {
    fn evaluate_clear(&self, request: &ClearSkyRequest<'_>) -> Result<ModelSpectrum, UpstreamFailure> {
        self.emit(request.pressure, request.temperature, request.contribution)
    }

    fn evaluate_clouds(&self, request: &CloudyRequest<'_>) -> Result<ModelSpectrum, UpstreamFailure> {
        self.emit(request.pressure, request.temperature, request.contribution)
    }
}
