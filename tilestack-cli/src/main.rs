//! Tilestack CLI - Command-line interface
//!
//! This binary provides a command-line interface to the tilestack library.

use clap::{Parser, Subcommand};
use std::process;

mod commands;
mod error;
mod progress;

use commands::{generate, render};

#[derive(Parser)]
#[command(name = "tilestack")]
#[command(version = tilestack::VERSION)]
#[command(about = "Build a zoomable tile pyramid from captured map tiles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the pyramid over an existing working directory
    Render(render::RenderArgs),
    /// Run an external tile producer, harvest its output, then render
    Generate(generate::GenerateArgs),
}

fn main() {
    tilestack::logging::init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Render(args) => render::run(args),
        Commands::Generate(args) => generate::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
