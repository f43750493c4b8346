//! Generate command - run the external tile producer, then render.
//!
//! Spawns the producer process, waits for its leaf tiles via the harvest
//! watchers (process exit races against the marker file; first signal
//! wins), terminates the producer, and finally builds the pyramid over
//! the same working directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use tilestack::coord::LEAF_ZOOM;
use tilestack::harvest::{Harvester, MarkerWatcher};
use tilestack::pipeline::PyramidBuilder;
use tilestack::tile::TILES_DIR;

use crate::error::CliError;
use crate::progress::ConsoleProgress;

use super::render::RenderArgs;

/// Name of the marker file the producer writes once it knows how many
/// leaf tiles it will render.
const MARKER_FILE: &str = "rendered-tiles";

/// Arguments for the generate command.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub render: RenderArgs,

    /// Producer executable to run
    #[arg(long)]
    pub command: String,

    /// Argument passed to the producer (repeatable)
    #[arg(long = "producer-arg")]
    pub producer_args: Vec<String>,

    /// Directory the producer writes its marker file to (default: the
    /// working directory)
    #[arg(long)]
    pub script_output: Option<PathBuf>,

    /// Seconds to wait before polling for producer output
    #[arg(long, default_value_t = 15)]
    pub grace_secs: u64,
}

/// Run the generate command.
pub fn run(args: GenerateArgs) -> Result<(), CliError> {
    let config = args.render.to_config()?;
    let workdir = args.render.workdir.clone();

    let marker_dir = args.script_output.clone().unwrap_or_else(|| workdir.clone());
    let marker_file = marker_dir.join(MARKER_FILE);
    let leaf_dir = workdir.join(TILES_DIR).join(LEAF_ZOOM.to_string());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::RuntimeCreation)?;

    println!("Tilestack v{}", tilestack::VERSION);
    println!("Producer:   {}", args.command);
    println!("Marker:     {}", marker_file.display());
    println!("Leaf tiles: {}", leaf_dir.display());
    println!();

    runtime.block_on(async {
        let child = tokio::process::Command::new(&args.command)
            .args(&args.producer_args)
            .spawn()
            .map_err(|e| CliError::Spawn {
                command: args.command.clone(),
                error: e,
            })?;
        tracing::info!(pid = ?child.id(), command = %args.command, "Producer started");

        let watcher = MarkerWatcher::new(marker_file, leaf_dir)
            .with_grace(Duration::from_secs(args.grace_secs));
        let count = Harvester::new(child, watcher).wait().await?;
        println!("Harvested {} leaf tiles", count);
        println!();

        let builder = PyramidBuilder::new(&workdir)
            .with_config(config)
            .with_progress(Arc::new(ConsoleProgress::new()));
        let summary = builder.run().await?;

        println!();
        println!(
            "Wrote {} tiles across {} levels",
            summary.tiles_written,
            summary.levels.len()
        );
        Ok(())
    })
}
