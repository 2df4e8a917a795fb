//! Cuts a per-file feature matrix into per-utterance slices.

use std::collections::BTreeMap;
use std::ops::Range;

use ndarray::{Array1, Array2, Axis, s};
use tracing::{debug, warn};

use crate::error::{FeatureError, Result};

/// Transcript timing of one utterance, in frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtteranceSpan {
    pub utterance: String,
    pub start_frame: usize,
    pub end_frame: usize,
}

impl UtteranceSpan {
    pub fn new(utterance: impl Into<String>, start_frame: usize, end_frame: usize) -> Self {
        Self {
            utterance: utterance.into(),
            start_frame,
            end_frame,
        }
    }
}

/// Per-utterance slices of one file plus the sums needed for global
/// normalization statistics.
#[derive(Debug, Clone)]
pub struct SegmentedFile {
    pub utterances: BTreeMap<String, Array2<f32>>,
    /// Per-dimension sum over all emitted frames.
    pub sum: Array1<f64>,
    pub total_frames: usize,
    /// Per-dimension squared deviation from the supplied mean.
    pub squared_deviation: Option<Array1<f64>>,
    /// Training files only: the file mean when no mean was supplied.
    pub mean: Option<Array1<f32>>,
    /// Training files only: the file stddev around the supplied mean.
    pub stddev: Option<Array1<f32>>,
}

/// Neighbor-aware boundary expansion.
///
/// Each utterance is widened by `padding` frames of context on both sides.
/// When the silence between two neighbors is shorter than twice the
/// padding, the gap is split at its midpoint instead, so expanded slices
/// never share a frame.
#[derive(Debug, Clone, Copy)]
pub struct UtteranceSegmenter {
    padding: usize,
}

impl UtteranceSegmenter {
    pub fn new(padding: usize) -> Self {
        Self { padding }
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Expanded `[start, end)` frame ranges, ordered by utterance id.
    pub fn boundaries(
        &self,
        speaker: &str,
        spans: &[UtteranceSpan],
        total_frames: usize,
    ) -> Result<Vec<(String, Range<usize>)>> {
        let mut spans: Vec<&UtteranceSpan> = spans.iter().collect();
        spans.sort_by(|a, b| a.utterance.cmp(&b.utterance));

        for span in &spans {
            if span.start_frame > span.end_frame {
                return Err(FeatureError::ReversedTimestamp {
                    speaker: speaker.to_string(),
                    utterance: span.utterance.clone(),
                    start: span.start_frame,
                    end: span.end_frame,
                });
            }
        }

        let pad = self.padding as i64;
        let n = total_frames as i64;
        let last = spans.len().saturating_sub(1);
        let mut ranges = Vec::with_capacity(spans.len());

        for (i, span) in spans.iter().enumerate() {
            let start = span.start_frame as i64;
            let end = span.end_frame as i64;

            let expanded_start = if i == 0 {
                (start - pad).max(0)
            } else {
                let gap = start - spans[i - 1].end_frame as i64;
                if gap >= 2 * pad { start - pad } else { start - gap / 2 }
            };

            let expanded_end = if i == last {
                if n - end >= pad { end + pad } else { n }
            } else {
                let next = spans[i + 1];
                let gap = next.start_frame as i64 - end;
                if gap < 0 {
                    warn!(
                        speaker,
                        utterance = %span.utterance,
                        next_utterance = %next.utterance,
                        end_frame = end,
                        next_start_frame = next.start_frame,
                        "Utterances overlap"
                    );
                }
                if gap >= 2 * pad { end + pad } else { end + gap / 2 }
            };

            let start = expanded_start.clamp(0, n) as usize;
            let end = expanded_end.clamp(start as i64, n) as usize;
            ranges.push((span.utterance.clone(), start..end));
        }

        Ok(ranges)
    }

    /// Slices `features` per utterance and accumulates file statistics.
    ///
    /// With `training` set, a file mean is computed when `mean` is `None`,
    /// otherwise the file stddev around `mean`. Outside training neither is.
    pub fn segment(
        &self,
        speaker: &str,
        features: &Array2<f32>,
        spans: &[UtteranceSpan],
        training: bool,
        mean: Option<&Array1<f32>>,
    ) -> Result<SegmentedFile> {
        let dim = features.ncols();
        if let Some(mean) = mean {
            if mean.len() != dim {
                return Err(FeatureError::DimensionMismatch {
                    expected: dim,
                    found: mean.len(),
                });
            }
        }

        let mut utterances = BTreeMap::new();
        let mut sum = Array1::<f64>::zeros(dim);
        let mut squared_deviation = mean.map(|_| Array1::<f64>::zeros(dim));
        let mut total_frames = 0;

        for (utterance, range) in self.boundaries(speaker, spans, features.nrows())? {
            let slice = features.slice(s![range.clone(), ..]).to_owned();

            sum += &slice.mapv(f64::from).sum_axis(Axis(0));
            total_frames += range.len();
            if let (Some(mean), Some(acc)) = (mean, squared_deviation.as_mut()) {
                let centered = slice.mapv(f64::from) - &mean.mapv(f64::from);
                *acc += &centered.mapv(|v| v * v).sum_axis(Axis(0));
            }

            utterances.insert(utterance, slice);
        }

        let (file_mean, file_stddev) = match (training, mean, &squared_deviation) {
            (false, _, _) => (None, None),
            (true, Some(_), Some(sq)) if total_frames > 1 => {
                let denom = (total_frames - 1) as f64;
                (None, Some(sq.mapv(|v| (v / denom).sqrt() as f32)))
            }
            (true, None, _) if total_frames > 0 => {
                let denom = total_frames as f64;
                (Some(sum.mapv(|v| (v / denom) as f32)), None)
            }
            _ => return Err(FeatureError::EmptyFile),
        };

        debug!(
            speaker,
            utterances = utterances.len(),
            frames = total_frames,
            "Segmented feature file"
        );

        Ok(SegmentedFile {
            utterances,
            sum,
            total_frames,
            squared_deviation,
            mean: file_mean,
            stddev: file_stddev,
        })
    }
}
