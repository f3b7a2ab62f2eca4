//! nestnoise command-line front end.
//!
//! Provides two modes of operation:
//! - `apply`: read a JSON action bundle, add clipped Gaussian noise, print JSON
//! - `info`: print the version and the effective noise configuration

mod logging;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use nestnoise::prelude::*;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Clipped Gaussian exploration noise for nested action bundles.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Noise settings shared by every subcommand.
#[derive(Args, Debug, Default)]
struct NoiseArgs {
    /// TOML file providing `stddev`, `seed` and `name`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Noise standard deviation (overrides the config file).
    #[arg(long, allow_negative_numbers = true)]
    stddev: Option<f32>,

    /// Random seed (overrides the config file).
    #[arg(short, long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add noise to a JSON document and print the result.
    Apply {
        #[command(flatten)]
        noise: NoiseArgs,

        /// Input JSON file; stdin when omitted or `-`.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of noisy samples to print, one JSON document per line.
        #[arg(short = 'n', long, default_value_t = 1)]
        repeat: u32,

        /// Pretty-print the output.
        #[arg(long)]
        pretty: bool,
    },

    /// Print version and effective configuration.
    Info {
        #[command(flatten)]
        noise: NoiseArgs,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Noise(#[from] NoiseError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

/// Layer command-line overrides on top of the config file (or defaults).
fn resolve_config(args: &NoiseArgs) -> Result<ClippedGaussianConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => ClippedGaussianConfig::from_file(path)?,
        None => ClippedGaussianConfig::default(),
    };
    if let Some(stddev) = args.stddev {
        config.stddev = stddev;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<Value, CliError> {
    let content = match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&content)?)
}

fn run_apply(
    args: &NoiseArgs,
    input: Option<&Path>,
    repeat: u32,
    pretty: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let config = resolve_config(args)?;
    let noise = ClippedGaussian::from_config(&config)?;
    let document = read_input(input)?;

    for _ in 0..repeat {
        let noisy = noise.apply_json(&document)?;
        if pretty {
            writeln!(out, "{}", serde_json::to_string_pretty(&noisy)?)?;
        } else {
            writeln!(out, "{noisy}")?;
        }
    }
    out.flush()?;

    info!(
        name = noise.name(),
        samples = repeat,
        draws = noise.draws(),
        "noise applied"
    );
    Ok(())
}

fn run_info(args: &NoiseArgs) -> Result<(), CliError> {
    let config = resolve_config(args)?;
    println!("nestnoise v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("clip range: [{CLIP_LOW}, {CLIP_HIGH}]");
    println!();
    println!("config:");
    print!("{}", toml::to_string(&config)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Apply {
            noise,
            input,
            repeat,
            pretty,
        } => run_apply(
            &noise,
            input.as_deref(),
            repeat,
            pretty,
            &mut io::stdout().lock(),
        ),
        Commands::Info { noise } => run_info(&noise),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
