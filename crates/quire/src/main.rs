//! Quire CLI - Markdown renderer with built-in syntax highlighting.
//!
//! Provides commands for:
//! - `render`: Convert a markdown document to an HTML fragment
//! - `highlight`: Highlight a source file as HTML
//! - `languages`: List the known highlighting profiles
//! - `cache clear`: Drop cached render output

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CacheCommand, HighlightArgs, LanguagesArgs, RenderArgs};
use output::Output;

/// Quire - Markdown renderer with built-in syntax highlighting.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render markdown to HTML.
    Render(RenderArgs),
    /// Highlight source code as HTML.
    Highlight(HighlightArgs),
    /// List highlighting languages.
    Languages(LanguagesArgs),
    /// Render cache commands.
    #[command(subcommand)]
    Cache(CacheCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise RUST_LOG applies
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Highlight(args) => args.execute(),
        Commands::Languages(args) => args.execute(),
        Commands::Cache(cmd) => cmd.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
