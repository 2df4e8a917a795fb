use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LabelError;
use crate::rewrite::collapse_repeats;

/// Word separator, also the silence symbol flanking CTC labels.
pub const SEPARATOR: char = '_';
/// Start-of-sequence marker for attention labels.
pub const SOS: char = '<';
/// End-of-sequence marker for attention labels.
pub const EOS: char = '>';

/// Target representation the labels are produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// Frame-synchronous targets: labels flanked by the silence separator.
    Ctc,
    /// Sequence-to-sequence targets: labels flanked by start/end markers.
    Attention,
}

impl LabelStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelStyle::Ctc => "ctc",
            LabelStyle::Attention => "attention",
        }
    }

    /// Wraps a cleaned transcript in the style's sentinels and collapses
    /// doubled separators.
    pub fn frame(&self, cleaned: &str) -> String {
        match self {
            LabelStyle::Ctc => {
                let framed = format!("{SEPARATOR}{cleaned}{SEPARATOR}");
                collapse_repeats(&framed, SEPARATOR)
            }
            LabelStyle::Attention => {
                let inner = collapse_repeats(cleaned, SEPARATOR);
                let inner = inner.trim_matches(SEPARATOR);
                format!("{SOS}{inner}{EOS}")
            }
        }
    }

    /// Returns the framed label without its sentinels.
    pub fn unframe<'a>(&self, framed: &'a str) -> &'a str {
        match self {
            LabelStyle::Ctc => framed.trim_matches(SEPARATOR),
            LabelStyle::Attention => framed
                .strip_prefix(SOS)
                .and_then(|s| s.strip_suffix(EOS))
                .unwrap_or(framed),
        }
    }

    /// True when a framed label carries nothing but silence or a lone noise
    /// symbol (`_`, `_NZ_`, `<>`, `<_>`, `<NZ>`). Such utterances are dropped
    /// by the reader, never by the cleaner.
    pub fn is_silence_only(&self, framed: &str, noise_symbols: &[&str]) -> bool {
        let body = self.unframe(framed).trim_matches(SEPARATOR);
        body.is_empty() || noise_symbols.contains(&body)
    }
}

impl fmt::Display for LabelStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelStyle {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ctc" => Ok(LabelStyle::Ctc),
            "attention" => Ok(LabelStyle::Attention),
            other => Err(LabelError::UnknownSelector {
                kind: "model",
                value: other.to_string(),
                expected: "ctc, attention",
            }),
        }
    }
}

/// Dataset partition. Only the training partition may build symbol tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Train,
    Dev,
    Test,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Train => "train",
            Partition::Dev => "dev",
            Partition::Test => "test",
        }
    }

    pub fn builds_tables(&self) -> bool {
        matches!(self, Partition::Train)
    }

    /// Test partitions keep the cleaned string so scoring runs against
    /// references rather than model indices.
    pub fn keeps_raw_text(&self) -> bool {
        matches!(self, Partition::Test)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Partition {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Partition::Train),
            "dev" => Ok(Partition::Dev),
            "test" => Ok(Partition::Test),
            other => Err(LabelError::UnknownSelector {
                kind: "partition",
                value: other.to_string(),
                expected: "train, dev, test",
            }),
        }
    }
}
