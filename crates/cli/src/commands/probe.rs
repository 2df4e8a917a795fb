use std::path::PathBuf;

use clap::Args;
use corpusprep_features::audio;
use serde::Serialize;

use super::{load_settings, output_result};
use crate::Cli;

/// Decode a WAV file (converting once with sox if needed) and report its
/// format and frame count.
#[derive(Args)]
pub struct ProbeCommand {
    /// Audio file
    wav: PathBuf,
    /// sox binary used for the conversion fallback
    #[arg(long)]
    sox: Option<String>,
}

#[derive(Serialize)]
struct ProbeReport {
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
    samples: usize,
    duration_secs: f64,
    frames: usize,
}

impl ProbeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let settings = load_settings(cli)?;
        let sox = self.sox.as_deref().unwrap_or(&settings.sox_path);
        let probe = audio::probe(&self.wav, sox, settings.frame_rate)?;
        output_result(
            cli,
            &ProbeReport {
                path: self.wav.clone(),
                sample_rate: probe.sample_rate,
                channels: probe.channels,
                samples: probe.samples,
                duration_secs: probe.duration_secs,
                frames: probe.frames,
            },
        )
    }
}
