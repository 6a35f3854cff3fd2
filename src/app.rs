//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads the retrieval input
//! - runs the requested subcommand
//! - prints reports and writes outputs

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, EvaluateArgs, InitArgs, InputArgs, SimulateArgs, TransformArgs};
use crate::error::AppError;
use crate::io::write_datasets;
use crate::plot::render_evaluation;
use crate::report::{format_evaluation, format_parameters, format_schema};
use crate::retrieval::Retrieval;
use crate::sampler::prepare_output;

pub mod pipeline;

/// Entry point for the `retrieve` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Command::Schema(args) => handle_schema(args),
        Command::Transform(args) => handle_transform(args),
        Command::Evaluate(args) => handle_evaluate(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Init(args) => handle_init(args),
    }
}

fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    // Reports go to stdout, logs to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_schema(args: InputArgs) -> Result<(), AppError> {
    let ctx = pipeline::load_context(&args.input)?;
    print!("{}", format_schema(&ctx));
    Ok(())
}

fn handle_transform(args: TransformArgs) -> Result<(), AppError> {
    let ctx = pipeline::load_context(&args.input.input)?;

    let samples = match &args.cube {
        Some(cube) => vec![ctx.prior().transform(cube)?],
        None => crate::prior::draw_prior_samples(&ctx, args.draws.max(1), args.seed),
    };

    for (i, params) in samples.iter().enumerate() {
        if samples.len() > 1 {
            println!("Sample {}:", i + 1);
        }
        println!("{}", format_parameters(ctx.schema(), params));
    }
    Ok(())
}

fn handle_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let ctx = pipeline::load_context(&args.input.input)?;
    let gray = pipeline::gray_model(&ctx, &args.model)?;
    let params = pipeline::resolve_parameters(&ctx, args.params.as_deref(), args.cube.as_deref())?;
    let retrieval = Retrieval::new(ctx, gray);

    let result = retrieval.evaluate(&params);
    println!("{}", format_parameters(retrieval.context().schema(), &params));
    println!("{}", format_evaluation(retrieval.context(), &params, &result));

    if args.plot {
        if let Ok(evaluation) = &result {
            println!(
                "{}",
                render_evaluation(retrieval.context(), &params, evaluation, args.width, args.height)
            );
        }
    }
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let ctx = pipeline::load_context(&args.input.input)?;
    let gray = pipeline::gray_model(&ctx, &args.model)?;
    let retrieval = Retrieval::new(ctx, gray);

    let record = pipeline::simulate_like(
        &retrieval,
        &args.params,
        args.like.as_deref(),
        &args.name,
        args.snr,
        args.seed,
    )?;
    write_datasets(&args.output, std::slice::from_ref(&record))?;
    info!(path = %args.output.display(), points = record.wavelength.len(), "wrote synthetic dataset");
    Ok(())
}

fn handle_init(args: InitArgs) -> Result<(), AppError> {
    let ctx = pipeline::load_context(&args.input.input)?;
    prepare_output(&ctx, args.resume, &args.output_dir)?;

    info!(
        dir = %args.output_dir.display(),
        parameters = ctx.dimension(),
        "run directory ready"
    );
    print!("{}", format_schema(&ctx));
    Ok(())
}
