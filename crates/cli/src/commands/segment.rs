use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use corpusprep::SegmentJob;

use super::{load_settings, output_result};
use crate::Cli;

/// Cut per-file feature matrices (`.npy`, frames x dim) into per-utterance
/// slices using transcript timing.
///
/// Training statistics take two runs: `--train` writes `mean.npy`, then
/// `--train --mean mean.npy` writes `stddev.npy`. Passing `--mean` and
/// `--stddev` normalizes every slice.
#[derive(Args)]
pub struct SegmentCommand {
    /// Feature matrices, one per transcript file
    #[arg(long, num_args = 1.., required = true)]
    features: Vec<PathBuf>,
    /// Transcript files, paired with --features by position
    #[arg(long, num_args = 1.., required = true)]
    transcripts: Vec<PathBuf>,
    /// Corpus (switchboard, csj, timit)
    #[arg(long)]
    corpus: Option<String>,
    /// Silence margin around each utterance, in frames
    #[arg(long)]
    padding: Option<usize>,
    /// Accumulate normalization statistics
    #[arg(long)]
    train: bool,
    /// Global mean (`.npy`)
    #[arg(long)]
    mean: Option<PathBuf>,
    /// Global stddev (`.npy`)
    #[arg(long)]
    stddev: Option<PathBuf>,
    /// Output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl SegmentCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        if self.features.len() != self.transcripts.len() {
            bail!(
                "{} feature files but {} transcripts",
                self.features.len(),
                self.transcripts.len()
            );
        }

        let mut settings = load_settings(cli)?;
        if let Some(corpus) = &self.corpus {
            settings.corpus = Some(corpus.clone());
        }
        if let Some(padding) = self.padding {
            settings.sil_padding_frames = padding;
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }

        let mut job = SegmentJob::from_settings(&settings, self.train)?;
        if let Some(path) = &self.mean {
            job = job.with_mean(path)?;
        }
        if let Some(path) = &self.stddev {
            job = job.with_stddev(path)?;
        }

        let pairs: Vec<(PathBuf, PathBuf)> = self
            .features
            .iter()
            .cloned()
            .zip(self.transcripts.iter().cloned())
            .collect();
        let summary = job.run(&pairs)?;
        output_result(cli, &summary)
    }
}
