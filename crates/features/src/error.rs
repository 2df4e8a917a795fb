use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error(
        "reversed timestamp for speaker '{speaker}' utterance '{utterance}': start frame {start} > end frame {end}"
    )]
    ReversedTimestamp {
        speaker: String,
        utterance: String,
        start: usize,
        end: usize,
    },
    #[error("invalid npy file '{}': {reason}", path.display())]
    Npy { path: PathBuf, reason: String },
    #[error("cannot decode audio '{}': {reason}", path.display())]
    Audio { path: PathBuf, reason: String },
    #[error("feature dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("no frames to compute statistics from")]
    EmptyFile,
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl FeatureError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn npy(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::Npy {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn audio(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Audio {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;
