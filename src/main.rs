//! Raster alignment CLI.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use raster_align::{build_runtime, run_pipeline, PipelineConfig, StagePools};

#[derive(Parser)]
#[command(name = "raster-align")]
#[command(about = "Align a multi-band raster onto the grid of a reference raster", long_about = None)]
struct Cli {
    /// Path to save band rasters
    #[arg(short = 'd', long = "dst_filename")]
    dst_filename: PathBuf,

    /// Path to input raster
    #[arg(short = 'r', long = "raster")]
    raster: PathBuf,

    /// Path to raster to align to
    #[arg(short = 'a', long = "alignraster")]
    alignraster: PathBuf,

    /// Directory to use for temp files
    #[arg(short = 't', long = "temp_dir")]
    temp_dir: PathBuf,

    /// Optional YAML file overriding per-stage worker pools
    #[arg(long)]
    pools: Option<PathBuf>,

    /// Tokio worker threads (default: number of CPUs)
    #[arg(long)]
    worker_threads: Option<usize>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    let required = [
        ("raster", &cli.raster),
        ("alignraster", &cli.alignraster),
        ("temp_dir", &cli.temp_dir),
    ];
    for (label, path) in required {
        if !path.exists() {
            eprintln!("Unable to find path to {}: {}", label, path.display());
            std::process::exit(1);
        }
    }

    if let Err(err) = run(cli) {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = PipelineConfig::new(cli.raster, cli.alignraster, cli.dst_filename, cli.temp_dir);
    if let Some(path) = &cli.pools {
        config.pools = StagePools::from_file(path)?;
    }

    let runtime = build_runtime(cli.worker_threads)?;
    let outcome = runtime.block_on(async { run_pipeline(&config).await })?;

    for artifact in &outcome.outputs {
        println!("{}", artifact.path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_long_flags() {
        let cli = Cli::try_parse_from([
            "raster-align",
            "--dst_filename",
            "/out/aligned.tif",
            "--raster",
            "/in/source.tif",
            "--alignraster",
            "/in/reference.tif",
            "--temp_dir",
            "/tmp/work",
        ])
        .unwrap();

        assert_eq!(cli.dst_filename, PathBuf::from("/out/aligned.tif"));
        assert_eq!(cli.raster, PathBuf::from("/in/source.tif"));
        assert_eq!(cli.alignraster, PathBuf::from("/in/reference.tif"));
        assert_eq!(cli.temp_dir, PathBuf::from("/tmp/work"));
        assert!(cli.pools.is_none());
    }

    #[test]
    fn test_cli_parse_short_flags() {
        let cli = Cli::try_parse_from([
            "raster-align",
            "-d",
            "out.tif",
            "-r",
            "in.tif",
            "-a",
            "ref.tif",
            "-t",
            "/tmp",
        ])
        .unwrap();

        assert_eq!(cli.alignraster, PathBuf::from("ref.tif"));
    }

    #[test]
    fn test_cli_requires_all_paths() {
        let result = Cli::try_parse_from(["raster-align", "-r", "in.tif"]);
        assert!(result.is_err());
    }
}
