//! One-dimensional interpolation.
//!
//! Two interpolants are needed by the P-T profiles:
//!
//! - `pchip`: monotone piecewise cubic Hermite (Fritsch–Carlson derivatives,
//!   SciPy edge conditions). It never overshoots the data, so a monotone knot
//!   sequence stays monotone.
//! - `natural_cubic_spline`: C2 spline with zero second derivative at both
//!   ends, used for the upper atmosphere of the Mollière profile.
//!
//! Both expect strictly increasing `x` and extrapolate with the end segment.

/// Evaluate a PCHIP interpolant through `(x, y)` at each of `xq`.
///
/// # Panics
/// Panics if `x` and `y` differ in length or hold fewer than two points.
pub fn pchip(x: &[f64], y: &[f64], xq: &[f64]) -> Vec<f64> {
    assert_eq!(x.len(), y.len(), "pchip: x/y length mismatch");
    assert!(x.len() >= 2, "pchip: need at least two points");

    let d = pchip_derivatives(x, y);
    xq.iter().map(|&q| hermite_eval(x, y, &d, q)).collect()
}

fn pchip_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|k| (y[k + 1] - y[k]) / h[k]).collect();

    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        let (d0, d1) = (delta[k - 1], delta[k]);
        if d0 * d1 <= 0.0 {
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / d0 + w2 / d1);
        }
    }

    d[0] = pchip_edge(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = pchip_edge(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

/// One-sided three-point derivative, limited to preserve shape.
fn pchip_edge(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

fn hermite_eval(x: &[f64], y: &[f64], d: &[f64], q: f64) -> f64 {
    let k = segment(x, q);
    let h = x[k + 1] - x[k];
    let t = (q - x[k]) / h;
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * y[k] + h10 * h * d[k] + h01 * y[k + 1] + h11 * h * d[k + 1]
}

/// Evaluate a natural cubic spline through `(x, y)` at each of `xq`.
///
/// # Panics
/// Panics if `x` and `y` differ in length or hold fewer than two points.
pub fn natural_cubic_spline(x: &[f64], y: &[f64], xq: &[f64]) -> Vec<f64> {
    assert_eq!(x.len(), y.len(), "spline: x/y length mismatch");
    assert!(x.len() >= 2, "spline: need at least two points");

    let m = second_derivatives(x, y);
    xq.iter()
        .map(|&q| {
            let k = segment(x, q);
            let h = x[k + 1] - x[k];
            let a = (x[k + 1] - q) / h;
            let b = (q - x[k]) / h;
            a * y[k]
                + b * y[k + 1]
                + ((a * a * a - a) * m[k] + (b * b * b - b) * m[k + 1]) * h * h / 6.0
        })
        .collect()
}

/// Solve the tridiagonal system for the spline second derivatives
/// (Thomas algorithm, natural end conditions).
fn second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];
    for i in 1..n - 1 {
        let h0 = x[i] - x[i - 1];
        let h1 = x[i + 1] - x[i];
        let a = h0;
        let b = 2.0 * (h0 + h1);
        let c = h1;
        let rhs = 6.0 * ((y[i + 1] - y[i]) / h1 - (y[i] - y[i - 1]) / h0);

        let denom = b - a * c_prime[i - 1];
        c_prime[i] = c / denom;
        d_prime[i] = (rhs - a * d_prime[i - 1]) / denom;
    }

    for i in (1..n - 1).rev() {
        m[i] = d_prime[i] - c_prime[i] * m[i + 1];
    }
    m
}

/// Index `k` of the segment `[x[k], x[k+1]]` used for `q` (end segments extrapolate).
fn segment(x: &[f64], q: f64) -> usize {
    let n = x.len();
    if q <= x[0] {
        return 0;
    }
    if q >= x[n - 1] {
        return n - 2;
    }
    // First index with x[i] > q, minus one.
    let upper = x.partition_point(|&v| v <= q);
    upper.saturating_sub(1).min(n - 2)
}
