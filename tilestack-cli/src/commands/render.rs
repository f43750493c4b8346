//! Render command - build the tile pyramid over a working directory.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use tilestack::config::{RenderConfig, DEFAULT_MAX_IN_FLIGHT};
use tilestack::pipeline::{PyramidBuilder, PyramidSummary};
use tilestack::scan::ParsePolicy;
use tilestack::tile::DEFAULT_JPEG_QUALITY;

use crate::error::CliError;
use crate::progress::ConsoleProgress;

/// Arguments for the render command.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Working directory containing empty.jpg and tiles/<z>/
    pub workdir: PathBuf,

    /// Maximum number of concurrent tile compositions
    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    pub concurrency: usize,

    /// JPEG quality for written tiles (1-100)
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
    pub quality: u8,

    /// Abort when a tile filename does not parse (default: warn and skip)
    #[arg(long, conflicts_with = "quiet_names")]
    pub strict_names: bool,

    /// Silently skip malformed tile filenames
    #[arg(long)]
    pub quiet_names: bool,
}

impl RenderArgs {
    /// Translates CLI flags into a build configuration.
    pub fn to_config(&self) -> Result<RenderConfig, CliError> {
        let policy = if self.strict_names {
            ParsePolicy::Fail
        } else if self.quiet_names {
            ParsePolicy::Ignore
        } else {
            ParsePolicy::Warn
        };

        let config = RenderConfig::new()
            .with_max_in_flight(self.concurrency)
            .with_jpeg_quality(self.quality)
            .with_parse_policy(policy);
        config
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(config)
    }
}

/// Run the render command.
pub fn run(args: RenderArgs) -> Result<(), CliError> {
    let config = args.to_config()?;

    if !args.workdir.is_dir() {
        return Err(CliError::Config(format!(
            "working directory {} does not exist",
            args.workdir.display()
        )));
    }

    println!("Tilestack v{}", tilestack::VERSION);
    println!("Working directory: {}", args.workdir.display());
    println!();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::RuntimeCreation)?;

    let builder = PyramidBuilder::new(&args.workdir)
        .with_config(config)
        .with_progress(Arc::new(ConsoleProgress::new()));

    let summary = runtime.block_on(builder.run())?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &PyramidSummary) {
    println!();
    match summary.coarsest_level() {
        Some(level) => println!(
            "Wrote {} tiles across {} levels (coarsest: {})",
            summary.tiles_written,
            summary.levels.len(),
            level
        ),
        None => println!("No levels built"),
    }
}
