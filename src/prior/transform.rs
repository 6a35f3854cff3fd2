//! Prior Transform: unit cube → physical parameters.
//!
//! Each coordinate is mapped with the user bound when one is given, otherwise
//! with a default range. Some parameters are chained substitutions rather
//! than independent ranges:
//!
//! - Mollière temperatures: `T3 = T_connect(1−u3)`, `T2 = T3(1−u2)`, `T1 = T2(1−u1)`
//! - `log_delta` from a photospheric pressure `10^(−3+5u)` bar
//! - monotonic knots: `T14` from `[0, 10000]` K, then `T_i = T_(i+1)(1−u_i)`
//! - `gamma_r` from an inverse-gamma quantile scaled by `beta_r`
//! - potassium tied to sodium when both are line species

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::chemistry::potassium_from_sodium;
use crate::domain::{Bound, PT_KNOTS};
use crate::error::ConfigurationError;
use crate::math::inverse_gamma_ppf_unit_shape;
use crate::models::t_connect;
use crate::schema::{Bounds, ChemSlots, ParameterSchema, PtSlots, SpeciesKind};

pub const DEFAULT_LOGG: Bound = Bound(2.0, 5.5);
pub const DEFAULT_RADIUS: Bound = Bound(0.8, 2.0);
pub const DEFAULT_TINT: Bound = Bound(500.0, 3000.0);
pub const DEFAULT_ALPHA: Bound = Bound(1.0, 2.0);
/// log10 photospheric pressure (bar) used to derive `log_delta`.
pub const DEFAULT_LOG_P_PHOT: Bound = Bound(-3.0, 2.0);
pub const DEFAULT_FREE_KNOT: Bound = Bound(0.0, 8000.0);
pub const DEFAULT_DEEPEST_KNOT: Bound = Bound(0.0, 10000.0);
pub const DEFAULT_METALLICITY: Bound = Bound(-1.5, 1.5);
pub const DEFAULT_C_O_RATIO: Bound = Bound(0.1, 1.6);
pub const DEFAULT_LOG_ABUNDANCE: Bound = Bound(-10.0, 0.0);
pub const DEFAULT_LOG_P_QUENCH: Bound = Bound(-6.0, 3.0);
pub const DEFAULT_FSED: Bound = Bound(0.0, 10.0);
pub const DEFAULT_KZZ: Bound = Bound(5.0, 13.0);
pub const DEFAULT_SIGMA_LNORM: Bound = Bound(1.05, 3.0);

/// log10 of the cloud base fraction relative to equilibrium: `[log10(0.05), 0]`.
pub fn default_cloud_fraction() -> Bound {
    Bound(0.05f64.log10(), 0.0)
}

/// Maps unit-cube samples onto the physical parameter space of one schema.
///
/// Holds only shared references and is safe to use from many threads.
#[derive(Debug, Clone, Copy)]
pub struct PriorTransform<'a> {
    schema: &'a ParameterSchema,
    bounds: &'a Bounds,
}

impl<'a> PriorTransform<'a> {
    pub fn new(schema: &'a ParameterSchema, bounds: &'a Bounds) -> Self {
        Self { schema, bounds }
    }

    fn range(&self, name: &str, default: Bound) -> Bound {
        self.bounds.range(name).unwrap_or(default)
    }

    fn map(&self, cube: &mut [f64], index: usize, default: Bound) {
        let bound = self.range(&self.schema.names()[index], default);
        cube[index] = bound.scale(cube[index]);
    }

    /// Transform a copy of `cube`.
    pub fn transform(&self, cube: &[f64]) -> Result<Vec<f64>, ConfigurationError> {
        let mut out = cube.to_vec();
        self.transform_in_place(&mut out)?;
        Ok(out)
    }

    /// Transform `cube` in place, slot by slot in schema order.
    pub fn transform_in_place(&self, cube: &mut [f64]) -> Result<(), ConfigurationError> {
        if cube.len() != self.schema.len() {
            return Err(ConfigurationError::DimensionMismatch {
                expected: self.schema.len(),
                actual: cube.len(),
            });
        }
        self.apply(cube);
        Ok(())
    }

    fn apply(&self, cube: &mut [f64]) {
        let slots = self.schema.slots();
        self.map(cube, slots.logg, DEFAULT_LOGG);
        self.map(cube, slots.radius, DEFAULT_RADIUS);

        match &slots.pt {
            PtSlots::Molliere(s) => {
                self.map(cube, s.tint, DEFAULT_TINT);
                let tc = t_connect(cube[s.tint]);
                cube[s.t3] = tc * (1.0 - cube[s.t3]);
                cube[s.t2] = cube[s.t3] * (1.0 - cube[s.t2]);
                cube[s.t1] = cube[s.t2] * (1.0 - cube[s.t1]);

                self.map(cube, s.alpha, DEFAULT_ALPHA);
                let p_phot = 10f64.powf(DEFAULT_LOG_P_PHOT.scale(cube[s.log_delta]));
                cube[s.log_delta] = (p_phot * 1e6).powf(-cube[s.alpha]).log10();
            }
            PtSlots::Free {
                knots,
                gamma_r,
                beta_r,
            } => {
                for &k in knots {
                    self.map(cube, k, DEFAULT_FREE_KNOT);
                }
                let beta = cube[*beta_r];
                cube[*gamma_r] = inverse_gamma_ppf_unit_shape(cube[*gamma_r], beta);
            }
            PtSlots::Monotonic { knots } => {
                self.map(cube, knots[PT_KNOTS - 1], DEFAULT_DEEPEST_KNOT);
                for i in (0..PT_KNOTS - 1).rev() {
                    cube[knots[i]] = cube[knots[i + 1]] * (1.0 - cube[knots[i]]);
                }
            }
        }

        match &slots.chemistry {
            ChemSlots::Equilibrium {
                metallicity,
                c_o_ratio,
            } => {
                self.map(cube, *metallicity, DEFAULT_METALLICITY);
                self.map(cube, *c_o_ratio, DEFAULT_C_O_RATIO);
            }
            ChemSlots::Free { species } => {
                for s in species {
                    self.map(cube, s.index, DEFAULT_LOG_ABUNDANCE);
                }
                let sodium = species.iter().find(|s| s.kind == SpeciesKind::Sodium);
                if let Some(na) = sodium {
                    let log_k = potassium_from_sodium(cube[na.index]);
                    for k in species.iter().filter(|s| s.kind == SpeciesKind::Potassium) {
                        cube[k.index] = log_k;
                    }
                }
            }
        }

        if let Some(q) = slots.quench {
            self.map(cube, q, DEFAULT_LOG_P_QUENCH);
        }

        if let Some(clouds) = &slots.clouds {
            for &(_, i) in &clouds.fractions {
                self.map(cube, i, default_cloud_fraction());
            }
            self.map(cube, clouds.fsed, DEFAULT_FSED);
            self.map(cube, clouds.kzz, DEFAULT_KZZ);
            self.map(cube, clouds.sigma_lnorm, DEFAULT_SIGMA_LNORM);
        }

        for ds in &slots.datasets {
            let Some(bounds) = self.bounds.dataset(&ds.name) else {
                continue;
            };
            for (slot, bound) in [
                (ds.scaling, bounds.scaling()),
                (ds.error, bounds.error()),
                (ds.wavelength, bounds.wavelength()),
            ] {
                if let (Some(i), Some(b)) = (slot, bound) {
                    cube[i] = b.scale(cube[i]);
                }
            }
        }
    }

    /// `n` independent prior draws from a seeded generator.
    pub fn draw(&self, n: usize, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let dim = self.schema.len();
        (0..n)
            .map(|_| {
                let mut cube: Vec<f64> = (0..dim).map(|_| rng.r#gen::<f64>()).collect();
                self.apply(&mut cube);
                cube
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Chemistry, DatasetBounds, PtProfile};
    use crate::schema::build_schema;

    fn schema(chemistry: Chemistry, quenching: bool, pt: PtProfile, lines: &[&str]) -> ParameterSchema {
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        build_schema(&Bounds::new(), chemistry, quenching, pt, &[], &lines, &[]).unwrap()
    }

    #[test]
    fn midpoint_cube_gives_default_midpoints() {
        let schema = schema(Chemistry::Equilibrium, true, PtProfile::Molliere, &[]);
        let bounds = Bounds::new();
        let prior = PriorTransform::new(&schema, &bounds);
        let out = prior.transform(&vec![0.5; schema.len()]).unwrap();
        let view = schema.view(&out);

        assert!((view.get("logg").unwrap() - 3.75).abs() < 1e-12);
        assert!((view.get("radius").unwrap() - 1.4).abs() < 1e-12);
        assert!((view.get("tint").unwrap() - 1750.0).abs() < 1e-9);
        assert!((view.get("metallicity").unwrap()).abs() < 1e-12);
        assert!((view.get("c_o_ratio").unwrap() - 0.85).abs() < 1e-12);
        assert!((view.get("log_p_quench").unwrap() + 1.5).abs() < 1e-12);
    }

    #[test]
    fn molliere_temperatures_are_ordered() {
        let schema = schema(Chemistry::Equilibrium, false, PtProfile::Molliere, &[]);
        let bounds = Bounds::new();
        let prior = PriorTransform::new(&schema, &bounds);
        for sample in prior.draw(200, 11) {
            let v = schema.view(&sample);
            let (t1, t2, t3) = (v.get("t1").unwrap(), v.get("t2").unwrap(), v.get("t3").unwrap());
            let tc = t_connect(v.get("tint").unwrap());
            assert!(t1 <= t2 && t2 <= t3 && t3 <= tc);
            assert!(t1 >= 0.0);
        }
    }

    #[test]
    fn log_delta_follows_photospheric_pressure() {
        let schema = schema(Chemistry::Equilibrium, false, PtProfile::Molliere, &[]);
        let bounds = Bounds::new();
        let prior = PriorTransform::new(&schema, &bounds);
        let mut cube = vec![0.5; schema.len()];
        // alpha = 1.5, p_phot = 10^-0.5 bar
        let i = schema.index_of("log_delta").unwrap();
        cube[i] = 0.5;
        let out = prior.transform(&cube).unwrap();
        let expected = -1.5 * (10f64.powf(-0.5) * 1e6).log10();
        assert!((out[i] - expected).abs() < 1e-12);
    }

    #[test]
    fn monotonic_knots_never_increase_with_altitude() {
        let schema = schema(Chemistry::Equilibrium, false, PtProfile::Monotonic, &[]);
        let bounds = Bounds::new();
        let prior = PriorTransform::new(&schema, &bounds);
        for sample in prior.draw(100, 3) {
            let knots: Vec<f64> = (0..PT_KNOTS)
                .map(|i| schema.view(&sample).get(&format!("t{i}")).unwrap())
                .collect();
            assert!(knots.windows(2).all(|w| w[0] <= w[1]));
            assert!(knots[PT_KNOTS - 1] <= 10000.0);
        }
    }

    #[test]
    fn free_profile_gamma_uses_inverse_gamma_quantile() {
        let schema = schema(Chemistry::Equilibrium, false, PtProfile::Free, &[]);
        let bounds = Bounds::new();
        let prior = PriorTransform::new(&schema, &bounds);
        let mut cube = vec![0.5; schema.len()];
        let g = schema.index_of("gamma_r").unwrap();
        let b = schema.index_of("beta_r").unwrap();
        cube[g] = 0.3;
        cube[b] = 0.2;
        let out = prior.transform(&cube).unwrap();
        assert!((out[b] - 0.2).abs() < 1e-15);
        assert!((out[g] - 0.2 / -(0.3f64.ln())).abs() < 1e-12);
        assert!((out[schema.index_of("t7").unwrap()] - 4000.0).abs() < 1e-9);
    }

    #[test]
    fn potassium_is_tied_to_sodium() {
        let schema = schema(Chemistry::Free, false, PtProfile::Molliere, &["H2O", "K_lor_cut", "Na_lor_cut"]);
        let bounds = Bounds::new();
        let prior = PriorTransform::new(&schema, &bounds);
        let mut cube = vec![0.5; schema.len()];
        cube[schema.index_of("Na_lor_cut").unwrap()] = 0.4;
        let out = prior.transform(&cube).unwrap();
        let na = out[schema.index_of("Na_lor_cut").unwrap()];
        let k = out[schema.index_of("K_lor_cut").unwrap()];
        assert!((na + 4.0).abs() < 1e-12);
        assert!((k - potassium_from_sodium(na)).abs() < 1e-12);
        assert!((out[schema.index_of("H2O").unwrap()] + 5.0).abs() < 1e-12);
    }

    #[test]
    fn potassium_without_sodium_keeps_its_draw() {
        let schema = schema(Chemistry::Free, false, PtProfile::Molliere, &["K"]);
        let bounds = Bounds::new();
        let prior = PriorTransform::new(&schema, &bounds);
        let out = prior.transform(&vec![0.25; schema.len()]).unwrap();
        assert!((out[schema.index_of("K").unwrap()] + 2.5).abs() < 1e-12);
    }

    #[test]
    fn explicit_bounds_override_defaults() {
        let mut bounds = Bounds::new();
        bounds.insert_range("logg", Bound(4.0, 5.0));
        bounds.insert_dataset("gpi", DatasetBounds(Some(Bound(0.5, 1.5)), None, None));
        let schema = build_schema(
            &bounds,
            Chemistry::Equilibrium,
            false,
            PtProfile::Molliere,
            &[],
            &[],
            &["gpi"],
        )
        .unwrap();
        let prior = PriorTransform::new(&schema, &bounds);
        let out = prior.transform(&vec![0.25; schema.len()]).unwrap();
        assert!((out[schema.index_of("logg").unwrap()] - 4.25).abs() < 1e-12);
        assert!((out[schema.index_of("scaling_gpi").unwrap()] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let schema = schema(Chemistry::Equilibrium, false, PtProfile::Molliere, &[]);
        let bounds = Bounds::new();
        let prior = PriorTransform::new(&schema, &bounds);
        assert!(matches!(
            prior.transform(&[0.5, 0.5]),
            Err(ConfigurationError::DimensionMismatch { .. })
        ));
    }
}
