//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - read from the retrieval JSON file
//! - persisted as run artifacts next to the sampler output
//! - reloaded later by analysis tools

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of temperature knots for the `free` and `monotonic` P-T profiles.
pub const PT_KNOTS: usize = 15;

/// How abundances are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Chemistry {
    /// Equilibrium chemistry interpolated from metallicity and C/O.
    Equilibrium,
    /// Free (vertically constant) log mass fractions per line species.
    Free,
}

impl Chemistry {
    pub fn name(self) -> &'static str {
        match self {
            Chemistry::Equilibrium => "equilibrium",
            Chemistry::Free => "free",
        }
    }
}

impl fmt::Display for Chemistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parametrization of the pressure-temperature profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PtProfile {
    /// Mollière et al. (2020): Eddington profile with a spline in the upper atmosphere.
    Molliere,
    /// 15 free knots with a second-difference smoothness prior.
    Free,
    /// 15 knots forced to decrease with altitude.
    Monotonic,
}

impl PtProfile {
    pub fn name(self) -> &'static str {
        match self {
            PtProfile::Molliere => "molliere",
            PtProfile::Free => "free",
            PtProfile::Monotonic => "monotonic",
        }
    }

    /// Whether the profile is interpolated through temperature knots.
    pub fn uses_knots(self) -> bool {
        matches!(self, PtProfile::Free | PtProfile::Monotonic)
    }
}

impl fmt::Display for PtProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Condensate species with a fitted cloud base mass fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CloudSpecies {
    Fe,
    MgSiO3,
    Na2S,
    KCl,
}

impl CloudSpecies {
    /// Fixed order in which fraction parameters appear in the schema.
    pub const ALL: [CloudSpecies; 4] = [
        CloudSpecies::Fe,
        CloudSpecies::MgSiO3,
        CloudSpecies::Na2S,
        CloudSpecies::KCl,
    ];

    /// Parse an opacity-table name such as `MgSiO3(c)` or `MgSiO3(c)_cd`.
    pub fn from_name(name: &str) -> Option<Self> {
        let base = name.strip_suffix("_cd").unwrap_or(name);
        match base {
            "Fe(c)" => Some(CloudSpecies::Fe),
            "MgSiO3(c)" => Some(CloudSpecies::MgSiO3),
            "Na2S(c)" => Some(CloudSpecies::Na2S),
            "KCl(c)" | "KCL(c)" => Some(CloudSpecies::KCl),
            _ => None,
        }
    }

    /// Schema name of the fitted log mass fraction.
    pub fn fraction_param(self) -> &'static str {
        match self {
            CloudSpecies::Fe => "fe_fraction",
            CloudSpecies::MgSiO3 => "mgsio3_fraction",
            CloudSpecies::Na2S => "na2s_fraction",
            CloudSpecies::KCl => "kcl_fraction",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CloudSpecies::Fe => "Fe(c)",
            CloudSpecies::MgSiO3 => "MgSiO3(c)",
            CloudSpecies::Na2S => "Na2S(c)",
            CloudSpecies::KCl => "KCl(c)",
        }
    }
}

/// A closed prior range `(low, high)`, serialized as `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound(pub f64, pub f64);

impl Bound {
    pub fn low(self) -> f64 {
        self.0
    }

    pub fn high(self) -> f64 {
        self.1
    }

    /// Map a unit-interval coordinate onto the range.
    pub fn scale(self, u: f64) -> f64 {
        self.0 + (self.1 - self.0) * u
    }

    pub fn contains(self, value: f64) -> bool {
        value >= self.0 && value <= self.1
    }

    pub fn midpoint(self) -> f64 {
        0.5 * (self.0 + self.1)
    }

    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.1.is_finite() && self.1 > self.0
    }
}

/// Per-dataset nuisance bounds: `[scaling, error offset, wavelength shift]`.
///
/// A `null` entry means the nuisance parameter is not fitted and its fixed
/// default is used by the likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetBounds(pub Option<Bound>, pub Option<Bound>, pub Option<Bound>);

impl DatasetBounds {
    /// Flux scaling applied to the observed spectrum.
    pub fn scaling(&self) -> Option<Bound> {
        self.0
    }

    /// log10 of the error inflation added in quadrature.
    pub fn error(&self) -> Option<Bound> {
        self.1
    }

    /// Additive wavelength calibration shift (micron).
    pub fn wavelength(&self) -> Option<Bound> {
        self.2
    }
}

/// One entry of the bounds mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundEntry {
    Range(Bound),
    Dataset(DatasetBounds),
}

fn default_chemistry() -> Chemistry {
    Chemistry::Equilibrium
}

fn default_quenching() -> bool {
    true
}

fn default_pt_profile() -> PtProfile {
    PtProfile::Molliere
}

/// Static configuration of a retrieval run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Object name (informational; carried into the run record).
    #[serde(default)]
    pub object_name: String,
    /// Opacity species with line absorption.
    #[serde(default)]
    pub line_species: Vec<String>,
    /// Condensate species (empty for a clear atmosphere).
    #[serde(default)]
    pub cloud_species: Vec<String>,
    /// Include scattering in the radiative transfer.
    #[serde(default)]
    pub scattering: bool,
    /// Distance to the object (pc).
    pub distance: f64,
    #[serde(default = "default_chemistry")]
    pub chemistry: Chemistry,
    #[serde(default = "default_quenching")]
    pub quenching: bool,
    #[serde(default = "default_pt_profile")]
    pub pt_profile: PtProfile,
}

impl RetrievalConfig {
    pub fn is_cloudy(&self) -> bool {
        !self.cloud_species.is_empty()
    }
}

/// Persisted description of a run (`radtrans.json`).
///
/// Downstream tools rebuild the radiative-transfer setup and the parameter
/// interpretation from this record plus `params.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub object_name: String,
    pub line_species: Vec<String>,
    pub cloud_species: Vec<String>,
    pub distance: f64,
    pub scattering: bool,
    pub chemistry: Chemistry,
    pub quenching: bool,
    pub pt_profile: PtProfile,
    pub created: DateTime<Utc>,
}

impl RunRecord {
    pub fn from_config(config: &RetrievalConfig, created: DateTime<Utc>) -> Self {
        Self {
            object_name: config.object_name.clone(),
            line_species: config.line_species.clone(),
            cloud_species: config.cloud_species.clone(),
            distance: config.distance,
            scattering: config.scattering,
            chemistry: config.chemistry,
            quenching: config.quenching,
            pt_profile: config.pt_profile,
            created,
        }
    }
}
