//! Feature-side artifacts: `.npy` files, per-utterance segmentation of
//! feature matrices, normalization statistics and WAV probing.

pub mod audio;
pub mod error;
pub mod npy;
pub mod segment;
pub mod stats;

pub use error::{FeatureError, Result};
pub use segment::{SegmentedFile, UtteranceSegmenter, UtteranceSpan};
pub use stats::{NormalizationStats, normalize};
