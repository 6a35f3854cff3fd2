//! Width-aware rebinning of a model spectrum onto an observed wavelength grid.
//!
//! Each observed point `λ_i` with bin width `w_i` covers `[λ_i - w_i/2, λ_i + w_i/2]`.
//! The rebinned value is the mean of the piecewise-linear model over that bin,
//! i.e. the exact integral of the linear interpolant divided by the bin width.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RebinError {
    #[error("rebinning needs at least 2 model points, got {actual}")]
    InsufficientPoints { actual: usize },

    #[error("rebin input length mismatch: {left}={left_len}, {right}={right_len}")]
    LengthMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    #[error("bin {index} [{low}, {high}] is not covered by the model grid [{model_low}, {model_high}]")]
    OutOfRange {
        index: usize,
        low: f64,
        high: f64,
        model_low: f64,
        model_high: f64,
    },

    #[error("bin {index} has non-positive width {width}")]
    InvalidWidth { index: usize, width: f64 },
}

/// Rebin `(x, y)` onto `centers` with the given `widths`.
pub fn rebin_with_widths(
    x: &[f64],
    y: &[f64],
    centers: &[f64],
    widths: &[f64],
) -> Result<Vec<f64>, RebinError> {
    if x.len() < 2 {
        return Err(RebinError::InsufficientPoints { actual: x.len() });
    }
    if x.len() != y.len() {
        return Err(RebinError::LengthMismatch {
            left: "wavelength",
            left_len: x.len(),
            right: "flux",
            right_len: y.len(),
        });
    }
    if centers.len() != widths.len() {
        return Err(RebinError::LengthMismatch {
            left: "centers",
            left_len: centers.len(),
            right: "widths",
            right_len: widths.len(),
        });
    }

    let model_low = x[0];
    let model_high = x[x.len() - 1];

    centers
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(index, (&c, &w))| {
            if !(w.is_finite() && w > 0.0) {
                return Err(RebinError::InvalidWidth { index, width: w });
            }
            let low = c - 0.5 * w;
            let high = c + 0.5 * w;
            if !(low >= model_low && high <= model_high) {
                return Err(RebinError::OutOfRange {
                    index,
                    low,
                    high,
                    model_low,
                    model_high,
                });
            }
            Ok(integrate_linear(x, y, low, high) / (high - low))
        })
        .collect()
}

/// Integral of the linear interpolant of `(x, y)` over `[a, b]` (inside the grid).
fn integrate_linear(x: &[f64], y: &[f64], a: f64, b: f64) -> f64 {
    // First segment whose right end lies beyond `a`.
    let start = x.partition_point(|&v| v <= a).saturating_sub(1);
    let mut total = 0.0;

    for k in start..x.len() - 1 {
        let (x0, x1) = (x[k], x[k + 1]);
        if x0 >= b {
            break;
        }
        let lo = a.max(x0);
        let hi = b.min(x1);
        if hi <= lo {
            continue;
        }
        let slope = (y[k + 1] - y[k]) / (x1 - x0);
        let y_lo = y[k] + slope * (lo - x0);
        let y_hi = y[k] + slope * (hi - x0);
        total += 0.5 * (y_lo + y_hi) * (hi - lo);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_model_rebins_to_bin_centers() {
        let x: Vec<f64> = (0..=100).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        let centers = [2.0, 5.05, 7.3];
        let widths = [0.4, 0.3, 1.0];
        let out = rebin_with_widths(&x, &y, &centers, &widths).unwrap();
        for (c, v) in centers.iter().zip(out) {
            assert!((v - (3.0 * c + 1.0)).abs() < 1e-10);
        }
    }

    #[test]
    fn bin_mean_of_a_step() {
        let x = [0.0, 1.0, 1.0 + 1e-9, 2.0];
        let y = [0.0, 0.0, 2.0, 2.0];
        let out = rebin_with_widths(&x, &y, &[1.0], &[1.0]).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn uncovered_bin_is_an_error() {
        let x = [1.0, 2.0, 3.0];
        let y = [1.0, 1.0, 1.0];
        let err = rebin_with_widths(&x, &y, &[2.9], &[0.4]).unwrap_err();
        assert!(matches!(err, RebinError::OutOfRange { index: 0, .. }));
    }
}
