use std::path::PathBuf;

use thiserror::Error;

/// Failure of a fixed-point rewrite rule on a single transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanError {
    #[error("rule '{rule}' did not settle after {limit} passes")]
    IterationCap { rule: &'static str, limit: usize },
    #[error("rule '{rule}' still matches but no longer changes the text")]
    NoProgress { rule: &'static str },
}

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownSelector {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("symbol '{symbol}' is not in the symbol table (label: '{label}')")]
    UnknownSymbol { symbol: String, label: String },
    #[error("index {index} is not in the symbol table")]
    UnknownIndex { index: i64 },
    #[error("symbol '{symbol}' appears twice in the symbol table")]
    DuplicateSymbol { symbol: String },
    #[error("malformed symbol table line {line}: '{content}'")]
    MalformedTable { line: usize, content: String },
    #[error("malformed record in '{}' line {line}: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("label type '{label_type}' needs a {resource}")]
    MissingResource {
        label_type: &'static str,
        resource: &'static str,
    },
    #[error("{corpus} does not provide '{label_type}' labels")]
    Unsupported {
        corpus: &'static str,
        label_type: &'static str,
    },
    #[error("'{}' is neither UTF-8 nor Shift-JIS text", path.display())]
    Undecodable { path: PathBuf },
    #[error(transparent)]
    Clean(#[from] CleanError),
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl LabelError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn unknown_symbol(symbol: impl Into<String>, label: &str) -> Self {
        Self::UnknownSymbol {
            symbol: symbol.into(),
            label: label.to_string(),
        }
    }

    pub(crate) fn malformed_record(
        path: &std::path::Path,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedRecord {
            path: path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LabelError>;
