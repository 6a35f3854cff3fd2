//! Observed spectra and the ordered dataset bundle.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// One observed spectrum with everything the likelihood needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedSpectrum {
    /// Wavelength (micron), strictly increasing.
    pub wavelength: Vec<f64>,
    /// Flux density (W m-2 micron-1).
    pub flux: Vec<f64>,
    /// 1-sigma uncertainty on `flux`.
    pub error: Vec<f64>,
    /// Inverse covariance; when present it replaces the diagonal errors.
    pub inv_covariance: Option<DMatrix<f64>>,
    /// Spectral resolution `λ/Δλ` of the instrument.
    pub resolution: f64,
    /// Derived wavelength bin widths (see [`bin_widths`]).
    pub bin_width: Vec<f64>,
}

impl ObservedSpectrum {
    pub fn new(
        name: &str,
        wavelength: Vec<f64>,
        flux: Vec<f64>,
        error: Vec<f64>,
        inv_covariance: Option<DMatrix<f64>>,
        resolution: f64,
    ) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidDataset {
            name: name.to_string(),
            reason,
        };

        let n = wavelength.len();
        if n < 2 {
            return Err(invalid(format!("need at least 2 wavelength points, got {n}")));
        }
        if flux.len() != n || error.len() != n {
            return Err(invalid(format!(
                "wavelength/flux/error lengths differ ({n}/{}/{})",
                flux.len(),
                error.len()
            )));
        }
        if wavelength.iter().chain(&flux).chain(&error).any(|v| !v.is_finite()) {
            return Err(invalid("wavelength, flux and error must be finite".to_string()));
        }
        if wavelength.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("wavelength must be strictly increasing".to_string()));
        }
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(invalid(format!("spectral resolution must be > 0, got {resolution}")));
        }
        if let Some(m) = &inv_covariance {
            if m.nrows() != n || m.ncols() != n {
                return Err(invalid(format!(
                    "inverse covariance is {}x{}, expected {n}x{n}",
                    m.nrows(),
                    m.ncols()
                )));
            }
        }

        let bin_width = bin_widths(&wavelength);
        Ok(Self {
            wavelength,
            flux,
            error,
            inv_covariance,
            resolution,
            bin_width,
        })
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    pub fn wavelength_range(&self) -> (f64, f64) {
        (self.wavelength[0], self.wavelength[self.wavelength.len() - 1])
    }
}

/// Bin widths from consecutive spacing; the last width repeats the previous one.
pub fn bin_widths(wavelength: &[f64]) -> Vec<f64> {
    let mut widths: Vec<f64> = wavelength.windows(2).map(|w| w[1] - w[0]).collect();
    if let Some(&last) = widths.last() {
        widths.push(last);
    }
    widths
}

/// A named observed spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub spectrum: ObservedSpectrum,
}

/// Ordered, uniquely named datasets.
///
/// The order is significant: it fixes both the order of per-dataset nuisance
/// parameters in the schema and the summation order of the likelihood.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetBundle {
    datasets: Vec<Dataset>,
}

impl DatasetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, dataset: Dataset) -> Result<(), ConfigurationError> {
        if self.get(&dataset.name).is_some() {
            return Err(ConfigurationError::InvalidDataset {
                name: dataset.name,
                reason: "dataset name is not unique".to_string(),
            });
        }
        self.datasets.push(dataset);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dataset> {
        self.datasets.iter()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.name == name)
    }

    /// Smallest and largest wavelength over all datasets.
    pub fn wavelength_range(&self) -> Option<(f64, f64)> {
        self.datasets
            .iter()
            .map(|d| d.spectrum.wavelength_range())
            .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
    }

    /// Wavelength window the radiative transfer has to cover, padded so that
    /// smoothing and calibration shifts stay inside the model grid.
    pub fn radtrans_wavelength_range(&self) -> Option<(f64, f64)> {
        self.wavelength_range().map(|(lo, hi)| (0.95 * lo, 1.15 * hi))
    }
}

impl<'a> IntoIterator for &'a DatasetBundle {
    type Item = &'a Dataset;
    type IntoIter = std::slice::Iter<'a, Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.datasets.iter()
    }
}

/// Serialized form of one dataset in the retrieval input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub name: String,
    pub wavelength: Vec<f64>,
    pub flux: Vec<f64>,
    pub error: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inv_covariance: Option<Vec<Vec<f64>>>,
    pub spectral_resolution: f64,
}

impl TryFrom<DatasetRecord> for Dataset {
    type Error = ConfigurationError;

    fn try_from(record: DatasetRecord) -> Result<Self, Self::Error> {
        let inv_covariance = match record.inv_covariance {
            None => None,
            Some(rows) => {
                let n = rows.len();
                if rows.iter().any(|r| r.len() != n) {
                    return Err(ConfigurationError::InvalidDataset {
                        name: record.name,
                        reason: "inverse covariance must be a square matrix".to_string(),
                    });
                }
                Some(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
            }
        };

        let spectrum = ObservedSpectrum::new(
            &record.name,
            record.wavelength,
            record.flux,
            record.error,
            inv_covariance,
            record.spectral_resolution,
        )?;
        Ok(Dataset {
            name: record.name,
            spectrum,
        })
    }
}

impl From<&Dataset> for DatasetRecord {
    fn from(dataset: &Dataset) -> Self {
        let s = &dataset.spectrum;
        Self {
            name: dataset.name.clone(),
            wavelength: s.wavelength.clone(),
            flux: s.flux.clone(),
            error: s.error.clone(),
            inv_covariance: s.inv_covariance.as_ref().map(|m| {
                (0..m.nrows())
                    .map(|i| (0..m.ncols()).map(|j| m[(i, j)]).collect())
                    .collect()
            }),
            spectral_resolution: s.resolution,
        }
    }
}

/// Build a bundle from records, preserving their order.
pub fn bundle_from_records(records: Vec<DatasetRecord>) -> Result<DatasetBundle, ConfigurationError> {
    let mut bundle = DatasetBundle::new();
    for record in records {
        bundle.push(Dataset::try_from(record)?)?;
    }
    Ok(bundle)
}
