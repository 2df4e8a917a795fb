//! Label and feature jobs behind the `corpusprep` binary.

pub mod pipeline;

pub use pipeline::{LabelJob, LabelSummary, MEAN_FILE, STDDEV_FILE, SegmentJob, SegmentSummary};
