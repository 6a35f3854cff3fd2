//! Cloud base mass fractions.
//!
//! The fitted `*_fraction` parameters are log10 of the fraction of the
//! maximum condensate mass allowed by the elemental budget. The maximum,
//! `X_eq`, assumes every atom of the limiting element condenses at the cloud
//! base for a solar mixture scaled by `[Fe/H]`, with oxygen set from carbon
//! and the C/O ratio.

use std::collections::BTreeMap;

use crate::chemistry::solar::Element;
use crate::domain::CloudSpecies;

/// Log10 cloud base mass fraction per condensate.
pub type CloudFractionMap = BTreeMap<CloudSpecies, f64>;

/// Lower limit on returned log mass fractions.
pub const LOG_FRACTION_FLOOR: f64 = -30.0;

fn condensate_mass(species: CloudSpecies) -> f64 {
    match species {
        CloudSpecies::Fe => 55.845,
        CloudSpecies::MgSiO3 => 100.389,
        CloudSpecies::Na2S => 78.045,
        CloudSpecies::KCl => 74.551,
    }
}

/// Maximum condensate mass fraction for a solar-scaled mixture.
pub fn equilibrium_mass_fraction(species: CloudSpecies, metallicity: f64, c_o_ratio: f64) -> f64 {
    let n = |e: Element| {
        if e == Element::O {
            Element::C.number_ratio(metallicity) / c_o_ratio
        } else {
            e.number_ratio(metallicity)
        }
    };

    let mean_mass: f64 = Element::ALL.iter().map(|&e| n(e) * e.mass()).sum();

    let n_condensate = match species {
        CloudSpecies::Fe => n(Element::Fe),
        CloudSpecies::MgSiO3 => n(Element::Mg).min(n(Element::Si)).min(n(Element::O) / 3.0),
        CloudSpecies::Na2S => (n(Element::Na) / 2.0).min(n(Element::S)),
        CloudSpecies::KCl => n(Element::K).min(n(Element::Cl)),
    };

    condensate_mass(species) * n_condensate / mean_mass
}

/// `log10(10^f · X_eq)` for each fitted species.
pub fn cloud_base_fractions(
    metallicity: f64,
    c_o_ratio: f64,
    fractions: &[(CloudSpecies, f64)],
) -> CloudFractionMap {
    fractions
        .iter()
        .map(|&(species, f)| {
            let x_eq = equilibrium_mass_fraction(species, metallicity, c_o_ratio);
            let log_x = f + x_eq.log10();
            let log_x = if log_x.is_finite() {
                log_x.max(LOG_FRACTION_FLOOR)
            } else {
                LOG_FRACTION_FLOOR
            };
            (species, log_x)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solar_iron_mass_fraction_is_about_a_thousandth() {
        let x = equilibrium_mass_fraction(CloudSpecies::Fe, 0.0, 0.55);
        assert!(x > 5e-4 && x < 2e-3, "X_Fe = {x}");
    }

    #[test]
    fn metallicity_raises_the_cloud_base_fraction() {
        let solar = cloud_base_fractions(0.0, 0.55, &[(CloudSpecies::MgSiO3, 0.0)]);
        let rich = cloud_base_fractions(1.0, 0.55, &[(CloudSpecies::MgSiO3, 0.0)]);
        assert!(rich[&CloudSpecies::MgSiO3] > solar[&CloudSpecies::MgSiO3]);
    }

    #[test]
    fn fraction_shifts_log_value() {
        let map = cloud_base_fractions(
            0.0,
            0.55,
            &[(CloudSpecies::KCl, 0.0), (CloudSpecies::Na2S, -1.0)],
        );
        let kcl = equilibrium_mass_fraction(CloudSpecies::KCl, 0.0, 0.55).log10();
        let na2s = equilibrium_mass_fraction(CloudSpecies::Na2S, 0.0, 0.55).log10();
        assert!((map[&CloudSpecies::KCl] - kcl).abs() < 1e-12);
        assert!((map[&CloudSpecies::Na2S] - (na2s - 1.0)).abs() < 1e-12);
    }
}
