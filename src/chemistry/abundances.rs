//! Free-chemistry helpers: mass-fraction sums, elemental ratios, and the
//! sodium-anchored potassium abundance.
//!
//! Abundances are log10 mass fractions keyed by opacity-table names. The table
//! name's prefix before the first `_` identifies the molecule (`H2O_main_iso`
//! is water, `Na_lor_cut` is sodium).

use crate::chemistry::solar::{Element, solar_c_h, solar_c_o, solar_o_h};

/// Mass fraction of H2 in the background gas (the rest is He).
pub const BACKGROUND_H2: f64 = 0.75;
const H2_MASS: f64 = 2.016;

/// Solar K/Na mass-fraction ratio used to tie potassium to sodium.
pub fn potassium_sodium_mass_ratio() -> f64 {
    const K_H: f64 = 9.86605611925677e-8;
    const NA_H: f64 = 1.60008694353205e-6;
    (K_H * Element::K.mass()) / (NA_H * Element::Na.mass())
}

/// log10 mass fraction of potassium implied by the sodium abundance.
pub fn potassium_from_sodium(log_x_na: f64) -> f64 {
    (potassium_sodium_mass_ratio() * 10f64.powf(log_x_na)).log10()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Molecule {
    name: &'static str,
    mass: f64,
    c: u8,
    o: u8,
    h: u8,
}

const fn mol(name: &'static str, mass: f64, c: u8, o: u8, h: u8) -> Molecule {
    Molecule { name, mass, c, o, h }
}

const MOLECULES: [Molecule; 15] = [
    mol("H2O", 18.015, 0, 1, 2),
    mol("CO", 28.010, 1, 1, 0),
    mol("CO2", 44.009, 1, 2, 0),
    mol("CH4", 16.043, 1, 0, 4),
    mol("NH3", 17.031, 0, 0, 3),
    mol("PH3", 33.998, 0, 0, 3),
    mol("H2S", 34.081, 0, 0, 2),
    mol("HCN", 27.025, 1, 0, 1),
    mol("C2H2", 26.038, 2, 0, 2),
    mol("OH", 17.007, 0, 1, 1),
    mol("FeH", 56.853, 0, 0, 1),
    mol("TiO", 63.866, 0, 1, 0),
    mol("VO", 66.941, 0, 1, 0),
    mol("Na", 22.990, 0, 0, 0),
    mol("K", 39.098, 0, 0, 0),
];

fn molecule(species: &str) -> Option<&'static Molecule> {
    let base = species.split('_').next().unwrap_or(species);
    MOLECULES.iter().find(|m| m.name == base)
}

/// Sum of the mass fractions `Σ 10^x`.
pub fn total_mass_fraction<'a, I>(log_abundances: I) -> f64
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    log_abundances.into_iter().map(|(_, x)| 10f64.powf(x)).sum()
}

/// `[C/H]` and `[O/H]` (dex relative to solar) of a free-chemistry atmosphere.
///
/// The remaining mass is a 3:1 H2/He background. Species missing from the
/// molecule table contribute mass but no atoms. Returns `-∞` for an element
/// with no carrier.
pub fn metal_ratios<'a, I>(log_abundances: I) -> (f64, f64)
where
    I: IntoIterator<Item = (&'a str, f64)> + Clone,
{
    let remainder = (1.0 - total_mass_fraction(log_abundances.clone())).max(0.0);
    let mut n_h = 2.0 * BACKGROUND_H2 * remainder / H2_MASS;
    let mut n_c = 0.0;
    let mut n_o = 0.0;

    for (name, log_x) in log_abundances {
        if let Some(m) = molecule(name) {
            let n = 10f64.powf(log_x) / m.mass;
            n_h += f64::from(m.h) * n;
            n_c += f64::from(m.c) * n;
            n_o += f64::from(m.o) * n;
        }
    }

    let c_h = (n_c / n_h).log10() - solar_c_h().log10();
    let o_h = (n_o / n_h).log10() - solar_o_h().log10();
    (c_h, o_h)
}

/// Metallicity and C/O implied by free abundances, for the adiabatic gradient
/// of the Mollière profile. Falls back to solar values when carbon or oxygen
/// carriers are absent.
pub fn bulk_composition<'a, I>(log_abundances: I) -> (f64, f64)
where
    I: IntoIterator<Item = (&'a str, f64)> + Clone,
{
    let (c_h, o_h) = metal_ratios(log_abundances);
    if !(c_h.is_finite() && o_h.is_finite()) {
        return (0.0, solar_c_o());
    }
    let c = solar_c_h() * 10f64.powf(c_h);
    let o = solar_o_h() * 10f64.powf(o_h);
    let metallicity = ((c + o) / (solar_c_h() + solar_o_h())).log10();
    (metallicity, c / o)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn potassium_tracks_sodium_by_a_constant_offset() {
        let a = potassium_from_sodium(-5.0);
        let b = potassium_from_sodium(-6.0);
        assert!((a - b - 1.0).abs() < 1e-12);
        assert!((a - (-5.0 + potassium_sodium_mass_ratio().log10())).abs() < 1e-12);
        assert!(a < -5.0);
    }

    #[test]
    fn mass_fraction_sum() {
        let sum = total_mass_fraction([("H2O", -1.0), ("CO", -2.0)]);
        assert!((sum - 0.11).abs() < 1e-12);
    }

    #[test]
    fn water_only_atmosphere_has_no_carbon() {
        let (c_h, o_h) = metal_ratios([("H2O_main_iso", -3.0)]);
        assert!(c_h.is_infinite() && c_h < 0.0);
        assert!(o_h.is_finite());
    }

    #[test]
    fn more_water_means_higher_oxygen() {
        let (_, low) = metal_ratios([("H2O", -4.0), ("CO", -4.0)]);
        let (_, high) = metal_ratios([("H2O", -2.0), ("CO", -4.0)]);
        assert!(high > low);
    }

    #[test]
    fn bulk_composition_falls_back_to_solar() {
        let (z, c_o) = bulk_composition([("H2O", -3.0)]);
        assert_eq!(z, 0.0);
        assert!((c_o - solar_c_o()).abs() < 1e-12);

        let (_, c_o) = bulk_composition([("CO", -3.0), ("H2O", -3.0)]);
        assert!(c_o > 0.0 && c_o < 1.0);
    }
}
