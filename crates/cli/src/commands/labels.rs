use std::path::PathBuf;

use clap::Args;
use corpusprep::LabelJob;
use corpusprep_labels::Partition;

use super::{load_settings, output_result};
use crate::Cli;

/// Clean one partition's transcripts and write `.npy` labels.
///
/// The train partition builds and persists the symbol table; dev and test
/// load it. Test labels are stored as text.
#[derive(Args)]
pub struct LabelsCommand {
    /// Corpus (switchboard, csj, timit)
    #[arg(long)]
    corpus: Option<String>,
    /// Label style (ctc, attention)
    #[arg(long)]
    model: Option<String>,
    /// Partition (train, dev, test)
    #[arg(long, default_value = "train")]
    partition: Partition,
    /// Label type (character, character_capital_divide, kana, kanji, phone, phone61, phone48, phone39)
    #[arg(long)]
    label_type: Option<String>,
    /// Transcript files
    #[arg(long, num_args = 1.., required = true)]
    input: Vec<PathBuf>,
    /// Symbol table directory
    #[arg(long)]
    map_dir: Option<PathBuf>,
    /// Output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// CSJ kana-to-phone table
    #[arg(long)]
    kana_phone_map: Option<PathBuf>,
    /// TIMIT 61/48/39 phone table
    #[arg(long)]
    phone_map: Option<PathBuf>,
    /// CSJ: separate words with `_`
    #[arg(long)]
    divide_by_space: bool,
}

impl LabelsCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut settings = load_settings(cli)?;
        if let Some(corpus) = &self.corpus {
            settings.corpus = Some(corpus.clone());
        }
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(label_type) = &self.label_type {
            settings.label_type = Some(label_type.clone());
        }
        if let Some(dir) = &self.map_dir {
            settings.map_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(path) = &self.kana_phone_map {
            settings.kana_phone_path = Some(path.clone());
        }
        if let Some(path) = &self.phone_map {
            settings.phone_map_path = Some(path.clone());
        }
        settings.divide_by_space |= self.divide_by_space;

        let summary = LabelJob::from_settings(&settings, self.partition)?.run(&self.input)?;
        output_result(cli, &summary)
    }
}
