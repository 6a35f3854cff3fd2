//! Likelihood Aggregator.
//!
//! Per dataset, in bundle order:
//!
//! 1. shift the observed wavelengths by the calibration offset
//! 2. smooth the model to the dataset's resolution (Gaussian LSF)
//! 3. rebin the smoothed model onto the shifted grid with the bin widths
//! 4. residual `r = rebinned − scaling · flux`
//! 5. `−½ rᵀ C⁻¹ r` with an inverse covariance, otherwise
//!    `−½ Σ (r² / var + ln(2π var))` with `var = σ² + 10^(2·error_offset)`

use nalgebra::DVector;

use crate::data::{Dataset, DatasetBundle, ObservedSpectrum};
use crate::error::RejectReason;
use crate::forward::ModelSpectrum;
use crate::math::{RebinError, gaussian_log_density, gaussian_lsf, rebin_with_widths};
use crate::schema::DatasetSlots;

/// Per-dataset nuisance parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nuisance {
    pub scaling: f64,
    /// log10 of the error term added in quadrature.
    pub error_offset: f64,
    /// Additive wavelength calibration (micron).
    pub wavelength_shift: f64,
}

impl Default for Nuisance {
    fn default() -> Self {
        Self {
            scaling: 1.0,
            error_offset: -100.0,
            wavelength_shift: 0.0,
        }
    }
}

impl Nuisance {
    pub fn from_slots(slots: &DatasetSlots, params: &[f64]) -> Self {
        let d = Self::default();
        Self {
            scaling: slots.scaling.map_or(d.scaling, |i| params[i]),
            error_offset: slots.error.map_or(d.error_offset, |i| params[i]),
            wavelength_shift: slots.wavelength.map_or(d.wavelength_shift, |i| params[i]),
        }
    }
}

/// Model spectrum as seen by one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetModel {
    /// Calibrated observed wavelengths.
    pub wavelength: Vec<f64>,
    /// Smoothed model on the model grid.
    pub smoothed: Vec<f64>,
    /// Smoothed model rebinned onto `wavelength`.
    pub rebinned: Vec<f64>,
}

pub fn dataset_model(
    model: &ModelSpectrum,
    spectrum: &ObservedSpectrum,
    nuisance: &Nuisance,
) -> Result<DatasetModel, RebinError> {
    let wavelength: Vec<f64> = spectrum
        .wavelength
        .iter()
        .map(|w| w + nuisance.wavelength_shift)
        .collect();
    let smoothed = gaussian_lsf(&model.wavelength, &model.flux, spectrum.resolution);
    let rebinned = rebin_with_widths(&model.wavelength, &smoothed, &wavelength, &spectrum.bin_width)?;
    Ok(DatasetModel {
        wavelength,
        smoothed,
        rebinned,
    })
}

/// Log-likelihood of one dataset given the rebinned model.
pub fn dataset_log_likelihood(spectrum: &ObservedSpectrum, rebinned: &[f64], nuisance: &Nuisance) -> f64 {
    let residual: Vec<f64> = rebinned
        .iter()
        .zip(&spectrum.flux)
        .map(|(m, f)| m - nuisance.scaling * f)
        .collect();

    match &spectrum.inv_covariance {
        Some(inv_cov) => {
            let r = DVector::from_vec(residual);
            -0.5 * r.dot(&(inv_cov * &r))
        }
        None => {
            let err_fit = 10f64.powf(nuisance.error_offset);
            let inflation = err_fit * err_fit;
            residual
                .iter()
                .zip(&spectrum.error)
                .map(|(r, sigma)| gaussian_log_density(*r, sigma * sigma + inflation))
                .sum()
        }
    }
}

fn score_dataset(
    model: &ModelSpectrum,
    dataset: &Dataset,
    nuisance: &Nuisance,
) -> Result<f64, RejectReason> {
    let fit = dataset_model(model, &dataset.spectrum, nuisance).map_err(|_| RejectReason::ModelOutOfRange {
        dataset: dataset.name.clone(),
    })?;
    let ll = dataset_log_likelihood(&dataset.spectrum, &fit.rebinned, nuisance);
    if ll.is_nan() {
        return Err(RejectReason::NonFiniteLikelihood {
            dataset: dataset.name.clone(),
        });
    }
    Ok(ll)
}

/// Sum of the dataset log-likelihoods.
///
/// `slots` holds one entry per dataset, in bundle order.
pub fn score(
    model: &ModelSpectrum,
    datasets: &DatasetBundle,
    slots: &[DatasetSlots],
    params: &[f64],
) -> Result<f64, RejectReason> {
    datasets
        .iter()
        .zip(slots)
        .map(|(dataset, slot)| score_dataset(model, dataset, &Nuisance::from_slots(slot, params)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn flat_model(level: f64) -> ModelSpectrum {
        let wavelength: Vec<f64> = (0..600).map(|i| 0.8 + i as f64 * 0.002).collect();
        ModelSpectrum {
            flux: vec![level; wavelength.len()],
            wavelength,
            contribution: None,
        }
    }

    fn observed(level: f64, error: Vec<f64>) -> ObservedSpectrum {
        let n = error.len();
        let wavelength: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 * 0.05).collect();
        ObservedSpectrum::new("obs", wavelength, vec![level; n], error, None, 500.0).unwrap()
    }

    #[test]
    fn exact_model_gives_normalisation_term() {
        let errors = vec![0.1, 0.2, 0.05, 0.3];
        let spectrum = observed(2.0, errors.clone());
        let nuisance = Nuisance::default();
        let fit = dataset_model(&flat_model(2.0), &spectrum, &nuisance).unwrap();
        let ll = dataset_log_likelihood(&spectrum, &fit.rebinned, &nuisance);

        let expected: f64 = -0.5
            * errors
                .iter()
                .map(|s| (2.0 * std::f64::consts::PI * s * s).ln())
                .sum::<f64>();
        assert!((ll - expected).abs() < 1e-9, "ll {ll} expected {expected}");
    }

    #[test]
    fn scaling_and_error_inflation_enter_the_likelihood() {
        let spectrum = observed(1.0, vec![0.1; 3]);
        let nuisance = Nuisance {
            scaling: 2.0,
            error_offset: -1.0,
            wavelength_shift: 0.0,
        };
        let ll = dataset_log_likelihood(&spectrum, &[2.0, 2.0, 2.0], &nuisance);
        let var: f64 = 0.01 + 0.01;
        let expected = -0.5 * 3.0 * (2.0 * std::f64::consts::PI * var).ln();
        assert!((ll - expected).abs() < 1e-12);
    }

    #[test]
    fn covariance_quadratic_form() {
        let mut spectrum = observed(1.0, vec![0.1; 2]);
        spectrum.inv_covariance = Some(DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]));
        let ll = dataset_log_likelihood(&spectrum, &[2.0, 3.0], &Nuisance::default());
        // r = [1, 2]; rᵀ C⁻¹ r = 2 + 2 + 2 + 12 = 18
        assert!((ll + 9.0).abs() < 1e-12);
    }

    #[test]
    fn wavelength_shift_outside_model_rejects() {
        let spectrum = observed(1.0, vec![0.1; 4]);
        let mut bundle = DatasetBundle::new();
        bundle
            .push(Dataset {
                name: "obs".to_string(),
                spectrum,
            })
            .unwrap();
        let slots = vec![DatasetSlots {
            name: "obs".to_string(),
            scaling: None,
            error: None,
            wavelength: Some(0),
        }];

        let ok = score(&flat_model(1.0), &bundle, &slots, &[0.01]);
        assert!(ok.is_ok());

        let err = score(&flat_model(1.0), &bundle, &slots, &[5.0]).unwrap_err();
        assert_eq!(
            err,
            RejectReason::ModelOutOfRange {
                dataset: "obs".to_string()
            }
        );
    }
}
