//! Solar elemental abundances (Asplund et al. 2009) and atomic masses.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Element {
    H,
    He,
    C,
    O,
    Na,
    Mg,
    Si,
    S,
    Cl,
    K,
    Fe,
}

impl Element {
    pub const ALL: [Element; 11] = [
        Element::H,
        Element::He,
        Element::C,
        Element::O,
        Element::Na,
        Element::Mg,
        Element::Si,
        Element::S,
        Element::Cl,
        Element::K,
        Element::Fe,
    ];

    /// `log ε = log10(N/N_H) + 12`.
    pub fn log_eps(self) -> f64 {
        match self {
            Element::H => 12.0,
            Element::He => 10.93,
            Element::C => 8.43,
            Element::O => 8.69,
            Element::Na => 6.24,
            Element::Mg => 7.60,
            Element::Si => 7.51,
            Element::S => 7.12,
            Element::Cl => 5.50,
            Element::K => 5.03,
            Element::Fe => 7.50,
        }
    }

    /// Atomic mass (u).
    pub fn mass(self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::He => 4.002602,
            Element::C => 12.011,
            Element::O => 15.999,
            Element::Na => 22.98976928,
            Element::Mg => 24.305,
            Element::Si => 28.085,
            Element::S => 32.06,
            Element::Cl => 35.45,
            Element::K => 39.0983,
            Element::Fe => 55.845,
        }
    }

    pub fn is_metal(self) -> bool {
        !matches!(self, Element::H | Element::He)
    }

    /// Number abundance relative to hydrogen, metals scaled by `[Fe/H]`.
    pub fn number_ratio(self, metallicity: f64) -> f64 {
        let base = 10f64.powf(self.log_eps() - 12.0);
        if self.is_metal() {
            base * 10f64.powf(metallicity)
        } else {
            base
        }
    }
}

/// Solar `C/H` number ratio.
pub fn solar_c_h() -> f64 {
    Element::C.number_ratio(0.0)
}

/// Solar `O/H` number ratio.
pub fn solar_o_h() -> f64 {
    Element::O.number_ratio(0.0)
}

/// Solar C/O number ratio (≈ 0.55).
pub fn solar_c_o() -> f64 {
    solar_c_h() / solar_o_h()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solar_c_to_o_is_about_point_five_five() {
        assert!((solar_c_o() - 0.5495).abs() < 1e-3);
    }

    #[test]
    fn metallicity_scales_metals_only() {
        assert_eq!(Element::He.number_ratio(1.0), Element::He.number_ratio(0.0));
        let ratio = Element::Fe.number_ratio(1.0) / Element::Fe.number_ratio(0.0);
        assert!((ratio - 10.0).abs() < 1e-9);
    }
}
