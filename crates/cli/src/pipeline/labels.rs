use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use corpusprep_config::Settings;
use corpusprep_features::npy;
use corpusprep_labels::{
    Corpus, CorpusKind, KanaPhoneMap, LabelStyle, LabelType, Labeler, Partition, PhoneMap,
    SymbolTable, UtteranceRecord,
};
use serde::Serialize;
use tracing::{debug, info};

use super::corpus_options;

/// Outcome of a label job.
#[derive(Debug, Clone, Serialize)]
pub struct LabelSummary {
    pub corpus: String,
    pub model: String,
    pub label_type: String,
    pub partition: String,
    pub utterances: usize,
    pub kept: usize,
    pub dropped: usize,
    /// Size of the table the labels were encoded against; `None` for the
    /// test partition, which stores references as text.
    pub vocabulary: Option<usize>,
    pub table_path: PathBuf,
    pub output_dir: PathBuf,
}

/// Cleans the transcripts of one partition, builds or loads the symbol
/// table and writes one `.npy` artifact per kept utterance.
pub struct LabelJob {
    corpus: Box<dyn Corpus>,
    kind: CorpusKind,
    style: LabelStyle,
    label_type: LabelType,
    partition: Partition,
    map_dir: PathBuf,
    output_dir: PathBuf,
    kana_phones: Option<KanaPhoneMap>,
    phone_map: Option<PhoneMap>,
}

impl LabelJob {
    /// Validates every selector before any file is touched.
    pub fn from_settings(settings: &Settings, partition: Partition) -> anyhow::Result<Self> {
        let kind: CorpusKind = settings
            .corpus
            .as_deref()
            .context("no corpus selected (set --corpus or `corpus` in the settings file)")?
            .parse()?;
        let style: LabelStyle = settings.model.parse()?;
        let label_type = match settings.label_type.as_deref() {
            Some(name) => name.parse()?,
            None => kind.default_label_type(),
        };

        let kana_phones = settings
            .kana_phone_path
            .as_ref()
            .map(KanaPhoneMap::load)
            .transpose()?;
        let phone_map = settings
            .phone_map_path
            .as_ref()
            .map(PhoneMap::load)
            .transpose()?;

        Ok(Self {
            corpus: kind.build(corpus_options(settings)),
            kind,
            style,
            label_type,
            partition,
            map_dir: settings.map_dir.clone(),
            output_dir: settings.output_dir.clone(),
            kana_phones,
            phone_map,
        })
    }

    /// `<map_dir>/<model>/<label_type>_to_num.txt`
    pub fn table_path(&self) -> PathBuf {
        self.map_dir
            .join(self.style.as_str())
            .join(self.label_type.table_file_name())
    }

    fn labeler(&self) -> anyhow::Result<Labeler<'_>> {
        let mut labeler = Labeler::new(self.corpus.as_ref(), self.style, self.label_type)?;
        if let Some(map) = &self.kana_phones {
            labeler = labeler.with_kana_phones(map.clone());
        }
        if let Some(map) = &self.phone_map {
            labeler = labeler.with_phone_map(map.clone());
        }
        labeler.validate()?;
        Ok(labeler)
    }

    fn artifact_path(&self, record: &UtteranceRecord) -> PathBuf {
        self.output_dir
            .join(&record.speaker_id)
            .join(format!("{}.npy", record.file_stem()))
    }

    pub fn run(&self, inputs: &[impl AsRef<Path>]) -> anyhow::Result<LabelSummary> {
        if inputs.is_empty() {
            bail!("no transcript files given");
        }
        let labeler = self.labeler()?;

        info!(
            corpus = self.kind.as_str(),
            model = self.style.as_str(),
            label_type = self.label_type.as_str(),
            partition = self.partition.as_str(),
            files = inputs.len(),
            "Reading transcripts"
        );

        let mut records = Vec::new();
        for input in inputs {
            let input = input.as_ref();
            records.extend(self.corpus.parse_records(input)?);
        }

        let mut labelled = Vec::with_capacity(records.len());
        for record in &records {
            let label = labeler
                .label(record)
                .with_context(|| format!("labelling utterance {}", record.file_stem()))?;
            if let Some(label) = label {
                labelled.push((record, label));
            }
        }
        let dropped = records.len() - labelled.len();

        let table_path = self.table_path();
        let table = if self.partition.builds_tables() {
            let mut builder = labeler.vocabulary();
            for (_, label) in &labelled {
                builder.observe(label);
            }
            let table = builder.build()?;
            debug!(
                observed = builder.observed_len(),
                size = table.len(),
                "Built symbol table"
            );
            table.persist(&table_path)?;
            Some(table)
        } else if self.partition.keeps_raw_text() {
            None
        } else {
            Some(SymbolTable::load(&table_path).with_context(|| {
                format!(
                    "loading symbol table for the {} partition (build it from the train partition first)",
                    self.partition
                )
            })?)
        };

        info!(
            kept = labelled.len(),
            dropped,
            vocabulary = table.as_ref().map(SymbolTable::len),
            "Writing labels"
        );

        for (record, label) in &labelled {
            let path = self.artifact_path(record);
            match &table {
                Some(table) => {
                    let indices = labeler
                        .encoder(table)
                        .encode(label)
                        .with_context(|| format!("encoding utterance {}", record.file_stem()))?;
                    npy::write_indices(&path, &indices)?;
                }
                None => npy::write_text(&path, label)?,
            }
            debug!(utterance = %record.file_stem(), label = %label, "Saved label");
        }

        let summary = LabelSummary {
            corpus: self.kind.as_str().to_string(),
            model: self.style.as_str().to_string(),
            label_type: self.label_type.as_str().to_string(),
            partition: self.partition.as_str().to_string(),
            utterances: records.len(),
            kept: labelled.len(),
            dropped,
            vocabulary: table.as_ref().map(SymbolTable::len),
            table_path,
            output_dir: self.output_dir.clone(),
        };
        info!(
            utterances = summary.utterances,
            kept = summary.kept,
            dropped = summary.dropped,
            "Label job finished"
        );
        Ok(summary)
    }
}
