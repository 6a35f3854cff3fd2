//! Small distribution helpers for prior transforms.

/// Quantile function of the inverse-gamma distribution with shape `a = 1`.
///
/// With shape 1 the CDF is `F(x) = exp(-scale / x)`, so the quantile has the
/// closed form `scale / (-ln q)`. The endpoints map to `0` and `+∞`.
pub fn inverse_gamma_ppf_unit_shape(q: f64, scale: f64) -> f64 {
    if q <= 0.0 {
        return 0.0;
    }
    if q >= 1.0 {
        return f64::INFINITY;
    }
    scale / -q.ln()
}

/// Log-density of a zero-mean Gaussian with variance `var` at `x`.
pub fn gaussian_log_density(x: f64, var: f64) -> f64 {
    -0.5 * (x * x / var + (2.0 * std::f64::consts::PI * var).ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_gamma_quantile_inverts_cdf() {
        let scale = 5e-5;
        for &q in &[0.01, 0.25, 0.5, 0.9] {
            let x = inverse_gamma_ppf_unit_shape(q, scale);
            let cdf = (-scale / x).exp();
            assert!((cdf - q).abs() < 1e-12);
        }
    }

    #[test]
    fn inverse_gamma_edges() {
        assert_eq!(inverse_gamma_ppf_unit_shape(0.0, 1.0), 0.0);
        assert!(inverse_gamma_ppf_unit_shape(1.0, 1.0).is_infinite());
    }

    #[test]
    fn gaussian_density_at_zero() {
        let v = gaussian_log_density(0.0, 1.0);
        assert!((v + 0.5 * (2.0 * std::f64::consts::PI).ln()).abs() < 1e-15);
    }
}
