//! Formatted terminal output.
//!
//! Formatting lives in one place so the numerical code stays clean and output
//! changes stay localized.

use crate::domain::CloudSpecies;
use crate::domain::constants::planet_mass;
use crate::error::EvaluationFailure;
use crate::fit::{Evaluation, Nuisance, dataset_log_likelihood, dataset_model};
use crate::retrieval::RetrievalContext;
use crate::schema::ParameterSchema;

/// Run configuration and the ordered parameter list with their prior ranges.
pub fn format_schema(ctx: &RetrievalContext) -> String {
    let cfg = ctx.config();
    let mut out = String::new();

    out.push_str("=== retrieve - parameter schema ===\n");
    if !cfg.object_name.is_empty() {
        out.push_str(&format!("Object: {}\n", cfg.object_name));
    }
    out.push_str(&format!(
        "Chemistry: {} | P-T: {} | quenching: {} | distance: {} pc\n",
        cfg.chemistry, cfg.pt_profile, cfg.quenching, cfg.distance
    ));
    out.push_str(&format!("Line species: {}\n", fmt_list(&cfg.line_species)));
    let clouds: Vec<String> = cfg
        .cloud_species
        .iter()
        .map(|name| CloudSpecies::from_name(name).map_or_else(|| name.clone(), |s| s.display_name().to_string()))
        .collect();
    out.push_str(&format!("Cloud species: {}\n", fmt_list(&clouds)));
    out.push_str(&format!(
        "Pressure grid: {} levels ({} for radiative transfer)\n",
        ctx.pressure().len(),
        ctx.pressure().radtrans_levels().len(),
    ));
    out.push_str(&format!("Datasets: {}\n", ctx.datasets().names().join(", ")));

    out.push('\n');
    out.push_str(&format!("{:>3} {:<20} {:<24}", "#", "parameter", "prior").trim_end());
    out.push('\n');
    out.push_str(&format!("{:->3} {:-<20} {:-<24}", "", "", "").trim_end());
    out.push('\n');

    for (i, name) in ctx.schema().names().iter().enumerate() {
        let prior = prior_label(ctx, name);
        out.push_str(&format!("{i:>3} {:<20} {prior:<24}", truncate(name, 20)).trim_end());
        out.push('\n');
    }

    out
}

fn prior_label(ctx: &RetrievalContext, name: &str) -> String {
    if let Some(b) = ctx.bounds().range(name) {
        return format!("[{}, {}]", b.low(), b.high());
    }
    let nuisance = ["scaling_", "error_", "wavelength_"];
    if let Some((kind, dataset)) = nuisance
        .iter()
        .find_map(|p| name.strip_prefix(p).map(|d| (p.trim_end_matches('_'), d)))
    {
        if let Some(d) = ctx.bounds().dataset(dataset) {
            let b = match kind {
                "scaling" => d.scaling(),
                "error" => d.error(),
                _ => d.wavelength(),
            };
            if let Some(b) = b {
                return format!("[{}, {}]", b.low(), b.high());
            }
        }
    }
    "default".to_string()
}

/// Parameter values in schema order, plus the derived planet mass.
pub fn format_parameters(schema: &ParameterSchema, params: &[f64]) -> String {
    let mut out = String::new();
    let view = schema.view(params);

    out.push_str(&format!("{:<20} {:>14}", "parameter", "value"));
    out.push('\n');
    out.push_str(&format!("{:-<20} {:->14}", "", ""));
    out.push('\n');
    for (name, value) in view.iter() {
        out.push_str(&format!("{:<20} {:>14}", truncate(name, 20), fmt_value(value)));
        out.push('\n');
    }

    if let (Some(logg), Some(radius)) = (view.get("logg"), view.get("radius")) {
        out.push_str(&format!(
            "{:<20} {:>14}\n",
            "mass (M_Jup)",
            fmt_value(planet_mass(logg, radius))
        ));
    }

    out
}

/// Score summary of one evaluation, with the per-dataset breakdown.
pub fn format_evaluation(
    ctx: &RetrievalContext,
    params: &[f64],
    result: &Result<Evaluation, EvaluationFailure>,
) -> String {
    let mut out = String::new();

    match result {
        Ok(evaluation) => {
            out.push_str(&format!("log_prior      = {:.6}\n", evaluation.log_prior));
            out.push_str(&format!("log_likelihood = {:.6}\n", evaluation.log_likelihood));
            out.push_str(&format!("log_posterior  = {:.6}\n", evaluation.total()));

            let model = &evaluation.forward.spectrum;
            for (dataset, slot) in ctx.datasets().iter().zip(&ctx.schema().slots().datasets) {
                let nuisance = Nuisance::from_slots(slot, params);
                let ll = dataset_model(model, &dataset.spectrum, &nuisance)
                    .map(|fit| dataset_log_likelihood(&dataset.spectrum, &fit.rebinned, &nuisance));
                match ll {
                    Ok(ll) => out.push_str(&format!(
                        "  {:<16} n={:<5} log_likelihood={ll:.6}\n",
                        truncate(&dataset.name, 16),
                        dataset.spectrum.len()
                    )),
                    Err(err) => out.push_str(&format!("  {:<16} {err}\n", truncate(&dataset.name, 16))),
                }
            }
        }
        Err(failure) => {
            let kind = if failure.is_upstream() { "upstream failure" } else { "rejected" };
            out.push_str(&format!("log_posterior  = -inf ({kind})\n"));
            out.push_str(&format!("reason: {failure}\n"));
        }
    }

    out
}

fn fmt_value(v: f64) -> String {
    if v != 0.0 && (v.abs() >= 1e5 || v.abs() < 1e-3) {
        format!("{v:.4e}")
    } else {
        format!("{v:.4}")
    }
}

fn fmt_list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bound, Chemistry, PtProfile};
    use crate::error::RejectReason;
    use crate::schema::{Bounds, build_schema};

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("H2O_main_iso", 20), "H2O_main_iso");
        assert_eq!(truncate("wavelength_nirspec_g395h", 10), "wavelengt.");
    }

    #[test]
    fn value_formatting_switches_to_exponent() {
        assert_eq!(fmt_value(3.5), "3.5000");
        assert_eq!(fmt_value(1e-16), "1.0000e-16");
        assert_eq!(fmt_value(0.0), "0.0000");
    }

    #[test]
    fn parameter_table_lists_values_and_mass() {
        let mut bounds = Bounds::new();
        bounds.insert_range("logg", Bound(3.0, 5.0));
        let schema = build_schema(
            &bounds,
            Chemistry::Equilibrium,
            true,
            PtProfile::Molliere,
            &[],
            &[],
            &[],
        )
        .unwrap();
        let mut params = vec![0.0; schema.len()];
        params[0] = 4.0;
        params[1] = 1.0;

        let txt = format_parameters(&schema, &params);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 2 + schema.len() + 1);
        assert!(lines[2].starts_with("logg"));
        assert!(lines[2].ends_with("4.0000"));
        assert!(lines.last().unwrap().starts_with("mass (M_Jup)"));
    }

    #[test]
    fn rejected_evaluation_shows_reason() {
        let ctx = crate::retrieval::tests::gray_retrieval().context().clone();
        let failure = EvaluationFailure::from(RejectReason::NegativeTemperature { index: 3, value: -10.0 });
        let txt = format_evaluation(&ctx, &[], &Err(failure));
        assert!(txt.contains("-inf (rejected)"));
        assert!(txt.contains("negative temperature"));
    }

    #[test]
    fn schema_listing_marks_default_priors() {
        let ctx = crate::retrieval::tests::gray_retrieval().context().clone();
        let txt = format_schema(&ctx);
        assert!(txt.contains("Chemistry: equilibrium | P-T: molliere"));
        assert!(txt.contains("scaling_gpi"));
        assert!(txt.contains("[0.5, 1.5]"));
        assert!(txt.lines().any(|l| l.contains("logg") && l.ends_with("default")));
    }
}
