//! Shared steps of the `retrieve` subcommands.
//!
//! input JSON -> run context -> gray reference model -> parameter vector
//!
//! The subcommand handlers then only decide what to print or write.

use std::path::Path;

use crate::cli::ModelArgs;
use crate::data::{DatasetRecord, ObservationSettings, simulate_observation};
use crate::error::AppError;
use crate::forward::{GrayAtmosphere, ModelError, SpectrumOptions};
use crate::io::{read_named_parameters, read_retrieval_input};
use crate::retrieval::{Retrieval, RetrievalContext};

pub fn load_context(path: &Path) -> Result<RetrievalContext, AppError> {
    let input = read_retrieval_input(path)?;
    Ok(input.into_context()?)
}

/// Gray reference atmosphere covering the padded wavelength window of all
/// datasets.
pub fn gray_model(ctx: &RetrievalContext, args: &ModelArgs) -> Result<GrayAtmosphere, AppError> {
    if !(args.model_resolution.is_finite() && args.model_resolution > 0.0) {
        return Err(AppError::new(2, format!("Model resolution must be > 0, got {}.", args.model_resolution)));
    }
    if !(args.photosphere.is_finite() && args.photosphere > 0.0) {
        return Err(AppError::new(2, format!("Photospheric pressure must be > 0 bar, got {}.", args.photosphere)));
    }
    let (low, high) = ctx
        .datasets()
        .radtrans_wavelength_range()
        .ok_or_else(|| AppError::new(2, "No datasets to derive a wavelength window from."))?;
    Ok(GrayAtmosphere::for_window(low, high, args.model_resolution).with_photosphere(args.photosphere))
}

/// Physical parameters from a named JSON file, a unit cube, or the prior
/// midpoint when neither is given.
pub fn resolve_parameters(
    ctx: &RetrievalContext,
    params: Option<&Path>,
    cube: Option<&[f64]>,
) -> Result<Vec<f64>, AppError> {
    if let Some(path) = params {
        let named = read_named_parameters(path)?;
        return Ok(ctx.schema().vector_from_named(&named)?);
    }
    let midpoint = vec![0.5; ctx.dimension()];
    let cube = cube.unwrap_or(&midpoint);
    Ok(ctx.prior().transform(cube)?)
}

pub fn model_error(err: ModelError) -> AppError {
    match err {
        ModelError::Configuration(e) => e.into(),
        ModelError::Evaluation(e) => AppError::new(2, format!("Model parameters were rejected: {e}")),
        ModelError::Rebin(e) => AppError::new(2, format!("{e}")),
    }
}

/// Synthetic dataset on the wavelength grid of an existing dataset.
pub fn simulate_like(
    retrieval: &Retrieval<GrayAtmosphere>,
    params_path: &Path,
    like: Option<&str>,
    name: &str,
    snr: f64,
    seed: u64,
) -> Result<DatasetRecord, AppError> {
    let ctx = retrieval.context();
    let template = match like {
        Some(n) => ctx
            .datasets()
            .get(n)
            .ok_or_else(|| AppError::new(2, format!("Unknown dataset '{n}'.")))?,
        None => ctx
            .datasets()
            .iter()
            .next()
            .ok_or_else(|| AppError::new(2, "No datasets to use as a template."))?,
    };

    let named = read_named_parameters(params_path)?;
    let model = retrieval
        .forward_model()
        .model_for_named(&named, &SpectrumOptions::default())
        .map_err(model_error)?;

    let settings = ObservationSettings {
        resolution: template.spectrum.resolution,
        snr,
        seed,
    };
    let dataset = simulate_observation(name, &model, &template.spectrum.wavelength, settings)?;
    Ok(DatasetRecord::from(&dataset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{RetrievalInput, write_retrieval_input};
    use std::collections::BTreeMap;

    fn write_input(dir: &Path) -> std::path::PathBuf {
        let ctx = crate::retrieval::tests::gray_retrieval().context().clone();
        let input = RetrievalInput {
            config: ctx.config().clone(),
            bounds: ctx.bounds().clone(),
            datasets: ctx.datasets().iter().map(DatasetRecord::from).collect(),
        };
        let path = dir.join("retrieval.json");
        write_retrieval_input(&path, &input).unwrap();
        path
    }

    fn model_args() -> ModelArgs {
        ModelArgs {
            model_resolution: 300.0,
            photosphere: 1.0,
        }
    }

    #[test]
    fn midpoint_is_the_default_parameter_vector() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = load_context(&write_input(dir.path())).unwrap();
        let p = resolve_parameters(&ctx, None, None).unwrap();
        assert_eq!(p.len(), ctx.dimension());
        assert!((p[0] - 3.75).abs() < 1e-12);

        let err = resolve_parameters(&ctx, None, Some(&[0.5, 0.5])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn gray_model_rejects_bad_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = load_context(&write_input(dir.path())).unwrap();
        let args = ModelArgs {
            model_resolution: 0.0,
            photosphere: 1.0,
        };
        assert!(gray_model(&ctx, &args).is_err());

        let gray = gray_model(&ctx, &model_args()).unwrap();
        assert!((gray.wavelength()[0] - 0.95).abs() < 1e-12);
    }

    #[test]
    fn simulated_dataset_reuses_template_grid() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = load_context(&write_input(dir.path())).unwrap();
        let p = resolve_parameters(&ctx, None, None).unwrap();
        let named: BTreeMap<String, f64> = ctx.schema().view(&p).to_named();
        let params_path = dir.path().join("truth.json");
        std::fs::write(&params_path, serde_json::to_string(&named).unwrap()).unwrap();

        let gray = gray_model(&ctx, &model_args()).unwrap();
        let retrieval = Retrieval::new(ctx, gray);
        let record = simulate_like(&retrieval, &params_path, None, "mock", 50.0, 3).unwrap();

        let template = retrieval.context().datasets().get("gpi").unwrap();
        assert_eq!(record.name, "mock");
        assert_eq!(record.wavelength, template.spectrum.wavelength);
        assert_eq!(record.spectral_resolution, template.spectrum.resolution);
        assert!(record.flux.iter().all(|f| f.is_finite() && *f > 0.0));

        assert!(simulate_like(&retrieval, &params_path, Some("nirspec"), "mock", 50.0, 3).is_err());
    }
}
