use std::collections::BTreeMap;

use serde::Serialize;

/// One utterance as read from a corpus transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtteranceRecord {
    pub speaker_id: String,
    /// Zero-padded utterance index within the speaker; its ordering is the
    /// temporal ordering used for segmentation margins.
    pub utterance_index: String,
    pub start_frame: usize,
    pub end_frame: usize,
    pub raw_text: String,
    /// Second transcript tier (CSJ orthographic form next to the kana reading).
    pub secondary_text: Option<String>,
}

impl UtteranceRecord {
    /// Artifact file stem, `<speaker>_<utt>`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.speaker_id, self.utterance_index)
    }
}

/// Zero-pads an utterance index to four digits.
pub fn utterance_key(index: impl std::fmt::Display) -> String {
    format!("{index:0>4}")
}

/// Converts a timestamp in seconds to a frame index, rounding with `bias`
/// (0.5 rounds to nearest; Switchboard timing uses 0.05).
pub fn secs_to_frame(secs: f64, frame_rate: u32, bias: f64) -> usize {
    (secs * frame_rate as f64 + bias).max(0.0) as usize
}

/// Groups records by speaker, ordered by utterance index inside each speaker.
pub fn group_by_speaker(
    records: impl IntoIterator<Item = UtteranceRecord>,
) -> BTreeMap<String, BTreeMap<String, UtteranceRecord>> {
    let mut grouped: BTreeMap<String, BTreeMap<String, UtteranceRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.speaker_id.clone())
            .or_default()
            .insert(record.utterance_index.clone(), record);
    }
    grouped
}
