//! corpusprep - speech corpus transcript and feature preprocessing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{LabelsCommand, ProbeCommand, SegmentCommand, VocabCommand};

/// Turns Switchboard, CSJ and TIMIT transcripts into encoded label files
/// and cuts per-file feature matrices into per-utterance slices.
///
/// Settings are layered: built-in defaults, then the `--config` TOML file,
/// then `CORPUSPREP_*` environment variables, then command-line flags.
#[derive(Parser)]
#[command(name = "corpusprep")]
#[command(about = "Speech corpus preprocessing")]
#[command(version)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the job summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean transcripts and write encoded labels
    Labels(LabelsCommand),
    /// Inspect symbol tables
    Vocab(VocabCommand),
    /// Cut feature matrices into per-utterance slices
    Segment(SegmentCommand),
    /// Report a WAV file's format and frame count
    Probe(ProbeCommand),
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn main() -> anyhow::Result<()> {
    // CORPUSPREP_* settings may come from a local .env file
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    match &cli.command {
        Commands::Labels(cmd) => cmd.run(&cli),
        Commands::Vocab(cmd) => cmd.run(&cli),
        Commands::Segment(cmd) => cmd.run(&cli),
        Commands::Probe(cmd) => cmd.run(&cli),
    }
}
