//! Contract with the radiative-transfer evaluator.
//!
//! The evaluator owns the opacities and the wavelength grid. The retrieval
//! hands it a pressure-temperature structure plus composition and gets back
//! a surface flux spectrum (W m-2 micron-1). Implementations must be `Sync`:
//! a single instance serves concurrent evaluations.

use std::collections::BTreeMap;

use nalgebra::DMatrix;

use crate::chemistry::CloudFractionMap;
use crate::error::UpstreamFailure;

/// Ideal diatomic-gas adiabatic gradient.
pub const IDEAL_H2_NABLA_AD: f64 = 2.0 / 7.0;

/// Composition of a clear atmosphere.
#[derive(Debug, Clone, PartialEq)]
pub enum ClearChemistry {
    Equilibrium {
        c_o_ratio: f64,
        metallicity: f64,
        /// log10 quench pressure (bar); -10 disables quenching.
        log_p_quench: f64,
    },
    Free {
        /// log10 mass fraction per line species.
        abundances: BTreeMap<String, f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClearSkyRequest<'a> {
    /// Pressures (bar) of the radiative-transfer levels.
    pub pressure: &'a [f64],
    pub temperature: &'a [f64],
    pub logg: f64,
    pub chemistry: ClearChemistry,
    /// Also return the emission contribution function.
    pub contribution: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloudyRequest<'a> {
    pub pressure: &'a [f64],
    pub temperature: &'a [f64],
    pub logg: f64,
    pub c_o_ratio: f64,
    pub metallicity: f64,
    pub log_p_quench: f64,
    /// log10 cloud base mass fraction per condensate.
    pub cloud_base: CloudFractionMap,
    pub fsed: f64,
    /// log10 of the eddy diffusion coefficient (cm2 s-1).
    pub kzz: f64,
    pub sigma_lnorm: f64,
    pub contribution: bool,
}

/// Emitted spectrum on the evaluator's wavelength grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpectrum {
    /// Wavelength (micron), increasing.
    pub wavelength: Vec<f64>,
    /// Flux density (W m-2 micron-1).
    pub flux: Vec<f64>,
    /// Contribution function (levels × wavelengths) when requested.
    pub contribution: Option<DMatrix<f64>>,
}

impl ModelSpectrum {
    pub fn non_finite_count(&self) -> usize {
        self.flux.iter().filter(|f| !f.is_finite()).count()
    }

    pub fn scaled(mut self, factor: f64) -> Self {
        for f in &mut self.flux {
            *f *= factor;
        }
        self
    }
}

pub trait RadiativeTransfer: Sync {
    fn evaluate_clear(&self, request: &ClearSkyRequest<'_>) -> Result<ModelSpectrum, UpstreamFailure>;

    fn evaluate_clouds(&self, request: &CloudyRequest<'_>) -> Result<ModelSpectrum, UpstreamFailure>;

    /// Adiabatic temperature gradient `d ln T / d ln P` per level.
    fn adiabatic_gradient(
        &self,
        pressure: &[f64],
        _temperature: &[f64],
        _metallicity: f64,
        _c_o_ratio: f64,
    ) -> Vec<f64> {
        vec![IDEAL_H2_NABLA_AD; pressure.len()]
    }
}
