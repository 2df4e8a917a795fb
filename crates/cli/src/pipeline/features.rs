use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use corpusprep_config::Settings;
use corpusprep_features::{NormalizationStats, UtteranceSegmenter, UtteranceSpan, normalize, npy};
use corpusprep_labels::{
    Corpus, CorpusKind, LabelStyle, Labeler, UtteranceRecord, group_by_speaker,
};
use ndarray::Array1;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::corpus_options;

pub const MEAN_FILE: &str = "mean.npy";
pub const STDDEV_FILE: &str = "stddev.npy";

#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub files: usize,
    pub utterances: usize,
    pub dropped: usize,
    pub frames: usize,
    pub normalized: bool,
    pub mean_path: Option<PathBuf>,
    pub stddev_path: Option<PathBuf>,
    pub output_dir: PathBuf,
}

/// Cuts per-file feature matrices into per-utterance `.npy` slices.
///
/// Training runs twice: without a mean the job writes `mean.npy`, given the
/// mean it writes `stddev.npy`. With both statistics supplied every slice is
/// normalized before it is written.
pub struct SegmentJob {
    corpus: Box<dyn Corpus>,
    kind: CorpusKind,
    segmenter: UtteranceSegmenter,
    output_dir: PathBuf,
    training: bool,
    mean: Option<Array1<f32>>,
    stddev: Option<Array1<f32>>,
}

impl SegmentJob {
    pub fn from_settings(settings: &Settings, training: bool) -> anyhow::Result<Self> {
        let kind: CorpusKind = settings
            .corpus
            .as_deref()
            .context("no corpus selected (set --corpus or `corpus` in the settings file)")?
            .parse()?;
        Ok(Self {
            corpus: kind.build(corpus_options(settings)),
            kind,
            segmenter: UtteranceSegmenter::new(settings.sil_padding_frames),
            output_dir: settings.output_dir.clone(),
            training,
            mean: None,
            stddev: None,
        })
    }

    pub fn with_mean(mut self, path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        self.mean = Some(
            npy::read_vector(path).with_context(|| format!("reading mean {}", path.display()))?,
        );
        Ok(self)
    }

    pub fn with_stddev(mut self, path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        self.stddev = Some(
            npy::read_vector(path).with_context(|| format!("reading stddev {}", path.display()))?,
        );
        Ok(self)
    }

    /// The speaker a features file belongs to: the one named by its file
    /// stem, or the only speaker in the transcript.
    fn resolve_speaker<'g>(
        features: &Path,
        grouped: &'g BTreeMap<String, BTreeMap<String, UtteranceRecord>>,
    ) -> anyhow::Result<(&'g String, &'g BTreeMap<String, UtteranceRecord>)> {
        let stem = features.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if let Some(found) = grouped.get_key_value(stem) {
            return Ok(found);
        }
        let mut speakers = grouped.iter();
        match (speakers.next(), speakers.next()) {
            (Some(only), None) => Ok(only),
            (None, _) => bail!("transcript for {} holds no utterances", features.display()),
            _ => bail!(
                "cannot tell which of {} speakers {} belongs to; name it after the speaker",
                grouped.len(),
                features.display()
            ),
        }
    }

    pub fn run(&self, pairs: &[(PathBuf, PathBuf)]) -> anyhow::Result<SegmentSummary> {
        if pairs.is_empty() {
            bail!("no feature files given");
        }
        let normalizing = match (&self.mean, &self.stddev) {
            (Some(_), Some(_)) => true,
            (None, Some(_)) => bail!("a stddev was given without a mean"),
            _ => false,
        };
        let accumulate_mean = self.training && self.mean.is_none();
        let accumulate_stddev = self.training && self.mean.is_some() && !normalizing;

        // utterances whose transcript is only silence or noise have no label
        // and so get no features either
        let labeler = Labeler::new(
            self.corpus.as_ref(),
            LabelStyle::Ctc,
            self.kind.default_label_type(),
        )?;

        info!(
            corpus = self.kind.as_str(),
            files = pairs.len(),
            padding = self.segmenter.padding(),
            training = self.training,
            normalizing,
            "Segmenting features"
        );

        let mut stats: Option<NormalizationStats> = None;
        let mut summary = SegmentSummary {
            files: pairs.len(),
            utterances: 0,
            dropped: 0,
            frames: 0,
            normalized: normalizing,
            mean_path: None,
            stddev_path: None,
            output_dir: self.output_dir.clone(),
        };

        for (features_path, transcript_path) in pairs {
            let grouped = group_by_speaker(self.corpus.parse_records(transcript_path)?);
            let (speaker, records) = Self::resolve_speaker(features_path, &grouped)?;

            let mut spans = Vec::with_capacity(records.len());
            for (index, record) in records {
                if labeler.label(record)?.is_none() {
                    summary.dropped += 1;
                    continue;
                }
                spans.push(UtteranceSpan::new(index.clone(), record.start_frame, record.end_frame));
            }
            if spans.is_empty() {
                warn!(speaker = %speaker, "No utterances left to segment");
                continue;
            }

            let features = npy::read_matrix(features_path)
                .with_context(|| format!("reading features {}", features_path.display()))?;
            let segmented = self
                .segmenter
                .segment(speaker, &features, &spans, self.training, self.mean.as_ref())
                .with_context(|| format!("segmenting {}", features_path.display()))?;

            if accumulate_mean || accumulate_stddev {
                stats
                    .get_or_insert_with(|| NormalizationStats::new(features.ncols()))
                    .absorb(&segmented)?;
            }

            for (utterance, mut slice) in segmented.utterances {
                if let (Some(mean), Some(stddev)) = (&self.mean, &self.stddev) {
                    normalize(&mut slice, mean, stddev)?;
                }
                let path = self
                    .output_dir
                    .join(speaker)
                    .join(format!("{speaker}_{utterance}.npy"));
                npy::write_matrix(&path, &slice)?;
            }
            summary.utterances += spans.len();
            summary.frames += segmented.total_frames;
            debug!(speaker = %speaker, utterances = spans.len(), "Wrote feature slices");
        }

        if let Some(stats) = &stats {
            if accumulate_mean {
                let path = self.output_dir.join(MEAN_FILE);
                npy::write_vector(&path, &stats.mean()?)?;
                summary.mean_path = Some(path);
            } else {
                let path = self.output_dir.join(STDDEV_FILE);
                npy::write_vector(&path, &stats.stddev()?)?;
                summary.stddev_path = Some(path);
            }
        }

        info!(
            utterances = summary.utterances,
            dropped = summary.dropped,
            frames = summary.frames,
            "Segment job finished"
        );
        Ok(summary)
    }
}
