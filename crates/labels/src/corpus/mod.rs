//! Corpus-specific transcript cleaning and record layouts.

pub mod csj;
pub mod switchboard;
pub mod timit;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use csj::Csj;
pub use switchboard::Switchboard;
pub use timit::Timit;

use crate::error::{CleanError, LabelError, Result};
use crate::label_type::LabelType;
use crate::record::UtteranceRecord;

/// Capability every supported corpus provides.
pub trait Corpus: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrites annotation markup into a separator-delimited transcript.
    /// Never frames the text and never drops it: an empty result is the
    /// caller's business.
    fn normalize(&self, raw: &str) -> std::result::Result<String, CleanError>;

    /// Reads one transcript file into utterance records.
    fn parse_records(&self, path: &Path) -> Result<Vec<UtteranceRecord>>;

    /// Event symbols that survive cleaning as their own vocabulary entries.
    fn noise_symbols(&self) -> &'static [&'static str];

    fn supports(&self, label_type: LabelType) -> bool;

    /// Raw transcript tier a label type is built from.
    fn transcript<'r>(&self, record: &'r UtteranceRecord, _label_type: LabelType) -> &'r str {
        &record.raw_text
    }

    /// Whether the transcript for `label_type` goes through `normalize`.
    fn cleans(&self, _label_type: LabelType) -> bool {
        true
    }
}

/// Options shared by the corpus implementations.
#[derive(Debug, Clone)]
pub struct CorpusOptions {
    pub max_rewrite_passes: usize,
    pub frame_rate: u32,
    /// CSJ: put a separator after every stacked word.
    pub divide_by_space: bool,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            max_rewrite_passes: 1000,
            frame_rate: 100,
            divide_by_space: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorpusKind {
    Switchboard,
    Csj,
    Timit,
}

impl CorpusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorpusKind::Switchboard => "switchboard",
            CorpusKind::Csj => "csj",
            CorpusKind::Timit => "timit",
        }
    }

    pub fn build(&self, options: CorpusOptions) -> Box<dyn Corpus> {
        match self {
            CorpusKind::Switchboard => Box::new(Switchboard::new(options)),
            CorpusKind::Csj => Box::new(Csj::new(options)),
            CorpusKind::Timit => Box::new(Timit::new(options)),
        }
    }

    /// Label type used when none is requested.
    pub fn default_label_type(&self) -> LabelType {
        match self {
            CorpusKind::Csj => LabelType::Kana,
            CorpusKind::Switchboard | CorpusKind::Timit => LabelType::Character,
        }
    }
}

impl fmt::Display for CorpusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorpusKind {
    type Err = LabelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "switchboard" => Ok(CorpusKind::Switchboard),
            "csj" => Ok(CorpusKind::Csj),
            "timit" => Ok(CorpusKind::Timit),
            other => Err(LabelError::UnknownSelector {
                kind: "corpus",
                value: other.to_string(),
                expected: "switchboard, csj, timit",
            }),
        }
    }
}

/// Reads a transcript file, mapping failures to a contextual I/O error.
pub(crate) fn read_transcript(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| LabelError::io(format!("reading transcript '{}'", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_kind_selector() {
        assert_eq!("csj".parse::<CorpusKind>().unwrap(), CorpusKind::Csj);
        let err = "wsj".parse::<CorpusKind>().unwrap_err();
        assert!(err.to_string().contains("wsj"));
    }

    #[test]
    fn test_build_by_kind() {
        for kind in [CorpusKind::Switchboard, CorpusKind::Csj, CorpusKind::Timit] {
            let corpus = kind.build(CorpusOptions::default());
            assert_eq!(corpus.name(), kind.as_str());
            assert!(corpus.supports(kind.default_label_type()));
        }
    }
}
