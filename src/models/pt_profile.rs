//! Pressure-temperature profiles.
//!
//! Mollière et al. (2020) profile:
//!
//! ```text
//! τ(P) = δ · P_cgs^α
//! T⁴   = ¾ · T_int⁴ · (⅔ + τ)                        (Eddington, τ ≥ 0.1)
//! ```
//!
//! Where the radiative gradient `d ln T / d ln P` exceeds the adiabatic one,
//! the profile follows the adiabat `T ∝ P^∇ad` from the first unstable level
//! downward. Above the τ = 0.1 pressure, a natural cubic spline in `log10 P`
//! passes through `(t1, t2, t3, T_connect)` at four log-spaced support
//! pressures between the top of the atmosphere and the τ = 0.1 level, where
//! the Eddington temperature equals `T_connect`.
//!
//! Knot profiles (`free`, `monotonic`) interpolate 15 knot temperatures with a
//! monotone cubic (PCHIP) in `log10 P`.

use crate::math::{natural_cubic_spline, pchip};

/// Optical depth at which the spline joins the Eddington profile.
pub const TAU_CONNECT: f64 = 0.1;

const BAR_TO_CGS: f64 = 1e6;

/// Temperature of the Eddington profile at `τ = 0.1`.
pub fn t_connect(tint: f64) -> f64 {
    (0.75 * tint.powi(4) * (TAU_CONNECT + 2.0 / 3.0)).powf(0.25)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MolliereParams {
    pub tint: f64,
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
    pub alpha: f64,
    pub log_delta: f64,
}

impl MolliereParams {
    /// Pressure (bar) at optical depth `tau`.
    pub fn pressure_at_tau(&self, tau: f64) -> f64 {
        (tau / 10f64.powf(self.log_delta)).powf(1.0 / self.alpha) / BAR_TO_CGS
    }

    /// Radiative Eddington temperatures on `pressure` (bar).
    pub fn eddington(&self, pressure: &[f64]) -> Vec<f64> {
        let delta = 10f64.powf(self.log_delta);
        pressure
            .iter()
            .map(|p| {
                let tau = delta * (p * BAR_TO_CGS).powf(self.alpha);
                (0.75 * self.tint.powi(4) * (2.0 / 3.0 + tau)).powf(0.25)
            })
            .collect()
    }
}

/// Evaluate the Mollière profile on `pressure` (bar, increasing).
///
/// `adiabatic_gradient` receives the Eddington temperatures and returns `∇ad`
/// per level.
pub fn molliere_profile<F>(params: &MolliereParams, pressure: &[f64], adiabatic_gradient: F) -> Vec<f64>
where
    F: FnOnce(&[f64]) -> Vec<f64>,
{
    let mut temperature = params.eddington(pressure);
    if pressure.len() < 2 {
        return temperature;
    }

    let nabla_ad = adiabatic_gradient(&temperature);
    apply_convection(pressure, &mut temperature, &nabla_ad);

    let p_connect = params.pressure_at_tau(TAU_CONNECT);
    let p_top = pressure[0];
    if p_connect.is_finite() && p_connect > p_top {
        let (log_top, log_connect) = (p_top.log10(), p_connect.log10());
        let step = (log_connect - log_top) / 3.0;
        let support: Vec<f64> = (0..4).map(|i| log_top + step * i as f64).collect();
        let t_support = [params.t1, params.t2, params.t3, t_connect(params.tint)];

        let upper: Vec<usize> = (0..pressure.len()).filter(|&i| pressure[i] < p_connect).collect();
        let log_p: Vec<f64> = upper.iter().map(|&i| pressure[i].log10()).collect();
        let spline = natural_cubic_spline(&support, &t_support, &log_p);
        for (&i, t) in upper.iter().zip(spline) {
            temperature[i] = t;
        }
    }

    temperature
}

/// Replace the radiative solution by an adiabat below the first level where
/// the radiative gradient exceeds `nabla_ad`.
fn apply_convection(pressure: &[f64], temperature: &mut [f64], nabla_ad: &[f64]) {
    let n = pressure.len().min(temperature.len()).min(nabla_ad.len());
    let start = (1..n).find(|&i| {
        let nabla_rad = (temperature[i] / temperature[i - 1]).ln() / (pressure[i] / pressure[i - 1]).ln();
        nabla_rad > nabla_ad[i]
    });

    if let Some(start) = start {
        for i in start..n {
            temperature[i] = temperature[i - 1] * (pressure[i] / pressure[i - 1]).powf(nabla_ad[i]);
        }
    }
}

/// Monotone cubic interpolation of knot temperatures in `log10 P`.
pub fn knot_profile(knot_pressures: &[f64], knot_temperatures: &[f64], pressure: &[f64]) -> Vec<f64> {
    let log_knots: Vec<f64> = knot_pressures.iter().map(|p| p.log10()).collect();
    let log_p: Vec<f64> = pressure.iter().map(|p| p.log10()).collect();
    pchip(&log_knots, knot_temperatures, &log_p)
}

/// Smoothness prior of the `free` profile with hyperparameter `gamma`.
pub fn roughness_log_prior(knots: &[f64], gamma: f64) -> f64 {
    let sum: f64 = knots
        .windows(3)
        .map(|w| {
            let d = w[2] + w[0] - 2.0 * w[1];
            d * d
        })
        .sum();
    -sum / (2.0 * gamma) - 0.5 * (2.0 * std::f64::consts::PI * gamma).ln()
}

/// First level with a negative temperature.
pub fn first_negative(temperature: &[f64]) -> Option<(usize, f64)> {
    temperature
        .iter()
        .copied()
        .enumerate()
        .find(|(_, t)| *t < 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::log_space;

    fn params() -> MolliereParams {
        let tint = 1500.0;
        let tc = t_connect(tint);
        MolliereParams {
            tint,
            t3: 0.9 * tc,
            t2: 0.8 * tc,
            t1: 0.7 * tc,
            alpha: 1.5,
            // p_phot = 0.1 bar
            log_delta: (0.1f64 * 1e6).powf(-1.5).log10(),
        }
    }

    #[test]
    fn connection_temperature_matches_eddington_at_tau_point_one() {
        let p = params();
        let p_connect = p.pressure_at_tau(TAU_CONNECT);
        let t = p.eddington(&[p_connect]);
        assert!((t[0] - t_connect(p.tint)).abs() < 1e-6);
    }

    #[test]
    fn radiative_profile_hits_support_temperatures() {
        let p = params();
        let pressure = log_space(-6.0, 3.0, 180);
        // A steep adiabat keeps the whole profile radiative.
        let t = molliere_profile(&p, &pressure, |t| vec![10.0; t.len()]);

        assert!((t[0] - p.t1).abs() < 1e-6, "top was {}", t[0]);
        let eddington = p.eddington(&pressure);
        let p_connect = p.pressure_at_tau(TAU_CONNECT);
        for i in 0..pressure.len() {
            if pressure[i] >= p_connect {
                assert!((t[i] - eddington[i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn convective_region_follows_adiabat() {
        let p = params();
        let pressure = log_space(-6.0, 3.0, 180);
        let nabla = 2.0 / 7.0;
        let t = molliere_profile(&p, &pressure, |t| vec![nabla; t.len()]);
        let n = pressure.len();
        let slope = (t[n - 1] / t[n - 2]).ln() / (pressure[n - 1] / pressure[n - 2]).ln();
        assert!((slope - nabla).abs() < 1e-9);
        assert!(t.iter().all(|v| v.is_finite() && *v > 0.0));

        // Deep radiative gradient tends to alpha/4 = 0.375, so the adiabat is cooler.
        let eddington = p.eddington(&pressure);
        assert!(t[n - 1] < eddington[n - 1]);
    }

    #[test]
    fn knot_profile_passes_through_knots() {
        let knots_p = log_space(-6.0, 3.0, 15);
        let knots_t: Vec<f64> = (0..15).map(|i| 500.0 + 100.0 * i as f64).collect();
        let t = knot_profile(&knots_p, &knots_t, &knots_p);
        for (a, b) in t.iter().zip(&knots_t) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn roughness_of_a_straight_line_is_normalisation_only() {
        let knots: Vec<f64> = (0..15).map(|i| 100.0 * i as f64).collect();
        let gamma = 2.0;
        let lp = roughness_log_prior(&knots, gamma);
        assert!((lp + 0.5 * (2.0 * std::f64::consts::PI * gamma).ln()).abs() < 1e-12);

        let mut bumpy = knots.clone();
        bumpy[7] += 50.0;
        assert!(roughness_log_prior(&bumpy, gamma) < lp);
    }

    #[test]
    fn first_negative_finds_the_level() {
        assert_eq!(first_negative(&[10.0, 5.0, -1.0, -2.0]), Some((2, -1.0)));
        assert_eq!(first_negative(&[0.0, 1.0]), None);
    }
}
