mod features;
mod labels;

pub use features::{MEAN_FILE, STDDEV_FILE, SegmentJob, SegmentSummary};
pub use labels::{LabelJob, LabelSummary};

use corpusprep_config::Settings;
use corpusprep_labels::CorpusOptions;

fn corpus_options(settings: &Settings) -> CorpusOptions {
    CorpusOptions {
        max_rewrite_passes: settings.max_rewrite_iterations,
        frame_rate: settings.frame_rate,
        divide_by_space: settings.divide_by_space,
    }
}
