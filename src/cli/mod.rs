//! Command-line parsing for the `retrieve` binary.
//!
//! Argument parsing and command dispatch stay separate from the retrieval
//! code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "retrieve", version, about = "Bayesian atmospheric retrieval of emission spectra")]
pub struct Cli {
    /// Log verbosity (trace, debug, info, warn, error); `RUST_LOG` takes precedence.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the ordered parameter list and the prior ranges of a retrieval.
    Schema(InputArgs),
    /// Map unit-cube samples (or random prior draws) to physical parameters.
    Transform(TransformArgs),
    /// Evaluate the log-posterior of one parameter vector with the gray
    /// reference atmosphere.
    Evaluate(EvaluateArgs),
    /// Write a synthetic dataset computed from named parameters.
    Simulate(SimulateArgs),
    /// Create an output directory with `params.json` and `radtrans.json`.
    Init(InitArgs),
}

#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Retrieval JSON file (`config`, `bounds`, `datasets`).
    #[arg(short = 'i', long, value_name = "JSON")]
    pub input: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct TransformArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Comma-separated unit-cube coordinates, one per parameter.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cube: Option<Vec<f64>>,

    /// Number of random prior draws when no cube is given.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub draws: usize,

    /// Seed for the prior draws.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options shared by commands that run the gray forward model.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Resolving power of the gray model wavelength grid.
    #[arg(long, default_value_t = 1000.0)]
    pub model_resolution: f64,

    /// Photospheric pressure (bar) of the gray model.
    #[arg(long, default_value_t = 1.0)]
    pub photosphere: f64,
}

#[derive(Debug, Args, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// JSON object of named parameter values.
    #[arg(long, value_name = "JSON", conflicts_with = "cube")]
    pub params: Option<PathBuf>,

    /// Comma-separated unit-cube coordinates (default: the prior midpoint).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cube: Option<Vec<f64>>,

    /// Render an ASCII plot of the model against the data.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// JSON object of named parameter values to inject.
    #[arg(long, value_name = "JSON")]
    pub params: PathBuf,

    /// Dataset whose wavelength grid and resolution are reused (default: first).
    #[arg(long)]
    pub like: Option<String>,

    /// Name of the synthetic dataset.
    #[arg(long, default_value = "synthetic")]
    pub name: String,

    /// Per-point signal-to-noise ratio.
    #[arg(long, default_value_t = 20.0)]
    pub snr: f64,

    /// Noise seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output JSON file (array of datasets).
    #[arg(short = 'o', long, value_name = "JSON")]
    pub output: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct InitArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Sampler output directory.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Continue an earlier run; its parameter list must match.
    #[arg(long)]
    pub resume: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_cube() {
        let cli = Cli::parse_from(["retrieve", "transform", "-i", "run.json", "--cube", "0.1,0.5,0.9"]);
        match cli.command {
            Command::Transform(args) => {
                assert_eq!(args.cube, Some(vec![0.1, 0.5, 0.9]));
                assert_eq!(args.draws, 1);
                assert_eq!(args.input.input, PathBuf::from("run.json"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn evaluate_rejects_params_with_cube() {
        let parsed = Cli::try_parse_from([
            "retrieve", "evaluate", "-i", "run.json", "--params", "best.json", "--cube", "0.5",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn init_defaults() {
        let cli = Cli::parse_from(["retrieve", "init", "-i", "run.json", "-o", "out"]);
        match cli.command {
            Command::Init(args) => {
                assert_eq!(cli.log_level, tracing::Level::INFO);
                assert!(!args.resume);
                assert_eq!(args.output_dir, PathBuf::from("out"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
