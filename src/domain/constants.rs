//! Physical constants (SI) and small derived quantities.

/// Planck constant (m2 kg s-1).
pub const PLANCK: f64 = 6.62607004e-34;
/// Speed of light (m s-1).
pub const LIGHT: f64 = 299_792_458.0;
/// Boltzmann constant (m2 kg s-2 K-1).
pub const BOLTZMANN: f64 = 1.38064852e-23;
/// Gravitational constant (m3 kg-1 s-2).
pub const GRAVITY: f64 = 6.67408e-11;
/// Parsec (m).
pub const PARSEC: f64 = 3.08567758147e16;
/// Jupiter mass (kg).
pub const M_JUP: f64 = 1.89813e27;
/// Jupiter radius (m).
pub const R_JUP: f64 = 71_492_000.0;

/// Dilution factor `(R / d)^2` that scales surface flux to the observer.
///
/// `radius` in Jupiter radii, `distance` in parsec.
pub fn dilution_factor(radius: f64, distance: f64) -> f64 {
    let ratio = radius * R_JUP / (distance * PARSEC);
    ratio * ratio
}

/// Mass (Jupiter masses) from `log10(g / cgs)` and radius (Jupiter radii).
pub fn planet_mass(logg: f64, radius: f64) -> f64 {
    // cm s-2 -> m s-2
    let gravity = 10f64.powf(logg) * 1e-2;
    let r = radius * R_JUP;
    gravity * r * r / GRAVITY / M_JUP
}
