//! Gaussian line-spread-function smoothing.
//!
//! A spectrum sampled at (roughly) constant resolving power is smoothed to a
//! target resolution `R` by a Gaussian with FWHM `λ/R`. The width is expressed
//! in pixels using the mean relative spacing of the input grid:
//!
//! ```text
//! spacing  = mean(2 (λ[i+1] - λ[i]) / (λ[i+1] + λ[i]))
//! σ_pixels = 1 / (R · 2√(2 ln 2)) / spacing
//! ```
//!
//! The kernel is truncated at 4σ and edges repeat the nearest sample, which
//! matches the usual `gaussian_filter(mode="nearest")` convention.

const TRUNCATE: f64 = 4.0;

/// Smooth `flux` (sampled on `wavelength`) to spectral resolution `resolution`.
///
/// Returns the input unchanged if the grid has fewer than two points or the
/// resolution is not finite and positive.
pub fn gaussian_lsf(wavelength: &[f64], flux: &[f64], resolution: f64) -> Vec<f64> {
    let n = flux.len();
    if n < 2 || wavelength.len() != n || !(resolution.is_finite() && resolution > 0.0) {
        return flux.to_vec();
    }

    let spacing = wavelength
        .windows(2)
        .map(|w| 2.0 * (w[1] - w[0]) / (w[1] + w[0]))
        .sum::<f64>()
        / (n as f64 - 1.0);
    if !(spacing.is_finite() && spacing > 0.0) {
        return flux.to_vec();
    }

    let sigma_lsf = 1.0 / resolution / (2.0 * (2.0 * std::f64::consts::LN_2).sqrt());
    gaussian_filter_nearest(flux, sigma_lsf / spacing)
}

/// 1-D Gaussian filter with `nearest` boundary handling.
pub fn gaussian_filter_nearest(values: &[f64], sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as usize;
    if radius == 0 || values.is_empty() {
        return values.to_vec();
    }

    let kernel = gaussian_kernel(sigma, radius);
    let n = values.len() as isize;
    let r = radius as isize;

    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let j = (i + k as isize - r).clamp(0, n - 1);
                    w * values[j as usize]
                })
                .sum()
        })
        .collect()
}

fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f64> {
    let r = radius as isize;
    let mut kernel: Vec<f64> = (-r..=r)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let total: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= total;
    }
    kernel
}
