//! Parameter schema construction.
//!
//! The schema is the index contract shared by the sampler, the prior
//! transform, and the forward model: position `i` of every cube and every
//! physical parameter vector holds `names[i]`. Besides the ordered names it
//! carries a typed slot registry ([`Slots`]) so per-evaluation code reads
//! parameters by index instead of by string.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::domain::{Chemistry, CloudSpecies, PT_KNOTS, PtProfile};
use crate::error::ConfigurationError;
use crate::schema::bounds::Bounds;

/// Line species whose abundance anchors potassium.
pub const SODIUM_SPECIES: [&str; 3] = ["Na", "Na_lor_cut", "Na_burrows"];
/// Line species whose abundance is tied to sodium when both are present.
pub const POTASSIUM_SPECIES: [&str; 3] = ["K", "K_lor_cut", "K_burrows"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeciesKind {
    Sodium,
    Potassium,
    Other,
}

impl SpeciesKind {
    pub fn of(name: &str) -> Self {
        if SODIUM_SPECIES.contains(&name) {
            SpeciesKind::Sodium
        } else if POTASSIUM_SPECIES.contains(&name) {
            SpeciesKind::Potassium
        } else {
            SpeciesKind::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MolliereSlots {
    pub tint: usize,
    pub t1: usize,
    pub t2: usize,
    pub t3: usize,
    pub alpha: usize,
    pub log_delta: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtSlots {
    Molliere(MolliereSlots),
    Free {
        knots: [usize; PT_KNOTS],
        gamma_r: usize,
        beta_r: usize,
    },
    Monotonic {
        knots: [usize; PT_KNOTS],
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeSpeciesSlot {
    pub name: String,
    pub index: usize,
    pub kind: SpeciesKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChemSlots {
    Equilibrium { metallicity: usize, c_o_ratio: usize },
    Free { species: Vec<FreeSpeciesSlot> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSlots {
    /// Fitted base mass fractions, in [`CloudSpecies::ALL`] order.
    pub fractions: Vec<(CloudSpecies, usize)>,
    pub fsed: usize,
    pub kzz: usize,
    pub sigma_lnorm: usize,
}

/// Nuisance parameters of one dataset; `None` means fixed at the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSlots {
    pub name: String,
    pub scaling: Option<usize>,
    pub error: Option<usize>,
    pub wavelength: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slots {
    pub logg: usize,
    pub radius: usize,
    pub pt: PtSlots,
    pub chemistry: ChemSlots,
    pub quench: Option<usize>,
    pub clouds: Option<CloudSlots>,
    /// One entry per dataset, in bundle order.
    pub datasets: Vec<DatasetSlots>,
}

/// Ordered parameter names with a bijective name → index map.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
    slots: Slots,
}

impl ParameterSchema {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    /// Parameters not drawn from a prior range: chained P-T substitutions and
    /// the raw `beta_r` hyperparameter.
    pub fn is_derived(&self, name: &str) -> bool {
        let Some(index) = self.index_of(name) else {
            return false;
        };
        match &self.slots.pt {
            PtSlots::Molliere(s) => [s.t1, s.t2, s.t3, s.log_delta].contains(&index),
            PtSlots::Free { gamma_r, beta_r, .. } => index == *gamma_r || index == *beta_r,
            PtSlots::Monotonic { knots } => knots[..PT_KNOTS - 1].contains(&index),
        }
    }

    /// Name-based read access to a physical parameter vector.
    pub fn view<'a>(&'a self, values: &'a [f64]) -> ParamView<'a> {
        ParamView {
            schema: self,
            values,
        }
    }

    /// Lay out a name → value map in schema order.
    pub fn vector_from_named(
        &self,
        named: &BTreeMap<String, f64>,
    ) -> Result<Vec<f64>, ConfigurationError> {
        self.names
            .iter()
            .map(|name| {
                named
                    .get(name)
                    .copied()
                    .ok_or_else(|| ConfigurationError::MissingParameter { name: name.clone() })
            })
            .collect()
    }
}

/// A physical parameter vector paired with its schema.
#[derive(Debug, Clone, Copy)]
pub struct ParamView<'a> {
    schema: &'a ParameterSchema,
    values: &'a [f64],
}

impl<'a> ParamView<'a> {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema
            .index_of(name)
            .and_then(|i| self.values.get(i).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        let (schema, values) = (self.schema, self.values);
        schema
            .names
            .iter()
            .zip(values.iter())
            .map(|(n, v)| (n.as_str(), *v))
    }

    pub fn to_named(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(n, v)| (n.to_string(), v)).collect()
    }
}

#[derive(Default)]
struct SchemaBuilder {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl SchemaBuilder {
    fn push(&mut self, name: &str) -> Result<usize, ConfigurationError> {
        if self.index.contains_key(name) {
            return Err(ConfigurationError::DuplicateParameter {
                name: name.to_string(),
            });
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        Ok(i)
    }

    fn knots(&mut self) -> Result<[usize; PT_KNOTS], ConfigurationError> {
        let mut knots = [0; PT_KNOTS];
        for (i, slot) in knots.iter_mut().enumerate() {
            *slot = self.push(&format!("t{i}"))?;
        }
        Ok(knots)
    }
}

/// Build the ordered parameter list for a run.
///
/// Order: `logg, radius`, P-T parameters, chemistry, `log_p_quench`, cloud
/// parameters, then per-dataset `scaling_*`, `error_*`, `wavelength_*`
/// blocks (each block in dataset order, only for datasets with that bound).
pub fn build_schema(
    bounds: &Bounds,
    chemistry: Chemistry,
    quenching: bool,
    pt_profile: PtProfile,
    cloud_species: &[String],
    line_species: &[String],
    datasets: &[&str],
) -> Result<ParameterSchema, ConfigurationError> {
    if quenching && chemistry != Chemistry::Equilibrium {
        return Err(ConfigurationError::QuenchingRequiresEquilibrium { chemistry });
    }
    if !cloud_species.is_empty() && chemistry != Chemistry::Equilibrium {
        return Err(ConfigurationError::CloudsRequireEquilibrium {
            species: cloud_species.to_vec(),
            chemistry,
        });
    }

    let mut b = SchemaBuilder::default();

    let logg = b.push("logg")?;
    let radius = b.push("radius")?;

    let pt = match pt_profile {
        PtProfile::Molliere => PtSlots::Molliere(MolliereSlots {
            tint: b.push("tint")?,
            t1: b.push("t1")?,
            t2: b.push("t2")?,
            t3: b.push("t3")?,
            alpha: b.push("alpha")?,
            log_delta: b.push("log_delta")?,
        }),
        PtProfile::Free => {
            let knots = b.knots()?;
            PtSlots::Free {
                knots,
                gamma_r: b.push("gamma_r")?,
                beta_r: b.push("beta_r")?,
            }
        }
        PtProfile::Monotonic => PtSlots::Monotonic { knots: b.knots()? },
    };

    let chem = match chemistry {
        Chemistry::Equilibrium => ChemSlots::Equilibrium {
            metallicity: b.push("metallicity")?,
            c_o_ratio: b.push("c_o_ratio")?,
        },
        Chemistry::Free => {
            let mut species = Vec::with_capacity(line_species.len());
            for name in line_species {
                species.push(FreeSpeciesSlot {
                    name: name.clone(),
                    index: b.push(name)?,
                    kind: SpeciesKind::of(name),
                });
            }
            ChemSlots::Free { species }
        }
    };

    let quench = if quenching {
        Some(b.push("log_p_quench")?)
    } else {
        None
    };

    let clouds = if cloud_species.is_empty() {
        None
    } else {
        for name in cloud_species {
            if CloudSpecies::from_name(name).is_none() {
                warn!(species = %name, "unrecognized cloud species, no base mass fraction is fitted");
            }
        }
        let present: Vec<CloudSpecies> = CloudSpecies::ALL
            .into_iter()
            .filter(|s| cloud_species.iter().any(|n| CloudSpecies::from_name(n) == Some(*s)))
            .collect();
        let mut fractions = Vec::with_capacity(present.len());
        for species in present {
            fractions.push((species, b.push(species.fraction_param())?));
        }
        Some(CloudSlots {
            fractions,
            fsed: b.push("fsed")?,
            kzz: b.push("kzz")?,
            sigma_lnorm: b.push("sigma_lnorm")?,
        })
    };

    let mut dataset_slots: Vec<DatasetSlots> = datasets
        .iter()
        .map(|name| DatasetSlots {
            name: name.to_string(),
            scaling: None,
            error: None,
            wavelength: None,
        })
        .collect();

    for slot in &mut dataset_slots {
        if bounds.dataset(&slot.name).and_then(|d| d.scaling()).is_some() {
            slot.scaling = Some(b.push(&format!("scaling_{}", slot.name))?);
        }
    }
    for slot in &mut dataset_slots {
        if bounds.dataset(&slot.name).and_then(|d| d.error()).is_some() {
            slot.error = Some(b.push(&format!("error_{}", slot.name))?);
        }
    }
    for slot in &mut dataset_slots {
        if bounds.dataset(&slot.name).and_then(|d| d.wavelength()).is_some() {
            slot.wavelength = Some(b.push(&format!("wavelength_{}", slot.name))?);
        }
    }

    Ok(ParameterSchema {
        names: b.names,
        index: b.index,
        slots: Slots {
            logg,
            radius,
            pt,
            chemistry: chem,
            quench,
            clouds,
            datasets: dataset_slots,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bound, DatasetBounds};

    fn names(schema: &ParameterSchema) -> Vec<&str> {
        schema.names().iter().map(String::as_str).collect()
    }

    #[test]
    fn equilibrium_quenched_molliere_clear_has_eleven_parameters() {
        let schema = build_schema(
            &Bounds::new(),
            Chemistry::Equilibrium,
            true,
            PtProfile::Molliere,
            &[],
            &["H2O".to_string(), "CO".to_string()],
            &["spec"],
        )
        .unwrap();

        assert_eq!(
            names(&schema),
            vec![
                "logg",
                "radius",
                "tint",
                "t1",
                "t2",
                "t3",
                "alpha",
                "log_delta",
                "metallicity",
                "c_o_ratio",
                "log_p_quench",
            ]
        );
        assert_eq!(schema.slots().quench, Some(10));
        assert!(schema.slots().clouds.is_none());
    }

    #[test]
    fn names_are_unique_and_index_is_bijective() {
        let mut bounds = Bounds::new();
        bounds.insert_dataset(
            "gpi",
            DatasetBounds(Some(Bound(0.8, 1.2)), Some(Bound(-18.0, -14.0)), None),
        );
        bounds.insert_dataset("sphere", DatasetBounds(Some(Bound(0.9, 1.1)), None, Some(Bound(-0.01, 0.01))));

        let schema = build_schema(
            &bounds,
            Chemistry::Equilibrium,
            false,
            PtProfile::Free,
            &["Fe(c)_cd".to_string(), "MgSiO3(c)_cd".to_string()],
            &[],
            &["gpi", "sphere"],
        )
        .unwrap();

        for (i, name) in schema.names().iter().enumerate() {
            assert_eq!(schema.index_of(name), Some(i));
        }
        let tail: Vec<&str> = names(&schema).into_iter().rev().take(4).collect();
        assert_eq!(
            tail,
            vec!["wavelength_sphere", "error_gpi", "scaling_sphere", "scaling_gpi"]
        );
        assert!(schema.contains("gamma_r") && schema.contains("beta_r"));
        assert!(schema.contains("fe_fraction") && schema.contains("mgsio3_fraction"));
        assert!(!schema.contains("kcl_fraction"));
    }

    #[test]
    fn building_twice_is_stable() {
        let build = || {
            build_schema(
                &Bounds::new(),
                Chemistry::Free,
                false,
                PtProfile::Monotonic,
                &[],
                &["H2O".to_string(), "Na".to_string(), "K".to_string()],
                &["a", "b"],
            )
            .unwrap()
        };
        assert_eq!(build(), build());

        let schema = build();
        match &schema.slots().chemistry {
            ChemSlots::Free { species } => {
                let kinds: Vec<SpeciesKind> = species.iter().map(|s| s.kind).collect();
                assert_eq!(
                    kinds,
                    vec![SpeciesKind::Other, SpeciesKind::Sodium, SpeciesKind::Potassium]
                );
            }
            ChemSlots::Equilibrium { .. } => panic!("expected free chemistry slots"),
        }
    }

    #[test]
    fn free_chemistry_rejects_quenching_and_clouds() {
        let quench = build_schema(
            &Bounds::new(),
            Chemistry::Free,
            true,
            PtProfile::Molliere,
            &[],
            &[],
            &[],
        );
        assert!(matches!(
            quench,
            Err(ConfigurationError::QuenchingRequiresEquilibrium { .. })
        ));

        let clouds = build_schema(
            &Bounds::new(),
            Chemistry::Free,
            false,
            PtProfile::Molliere,
            &["Fe(c)_cd".to_string()],
            &[],
            &[],
        );
        assert!(matches!(
            clouds,
            Err(ConfigurationError::CloudsRequireEquilibrium { .. })
        ));
    }

    #[test]
    fn line_species_colliding_with_a_parameter_is_rejected() {
        let err = build_schema(
            &Bounds::new(),
            Chemistry::Free,
            false,
            PtProfile::Molliere,
            &[],
            &["logg".to_string()],
            &[],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateParameter {
                name: "logg".to_string()
            }
        );
    }

    #[test]
    fn view_reads_by_name() {
        let schema = build_schema(
            &Bounds::new(),
            Chemistry::Equilibrium,
            false,
            PtProfile::Molliere,
            &[],
            &[],
            &[],
        )
        .unwrap();
        let values: Vec<f64> = (0..schema.len()).map(|i| i as f64).collect();
        let view = schema.view(&values);
        assert_eq!(view.get("radius"), Some(1.0));
        assert_eq!(view.get("c_o_ratio"), Some(9.0));
        assert_eq!(view.get("missing"), None);

        let named = view.to_named();
        assert_eq!(schema.vector_from_named(&named).unwrap(), values);
    }
}
