//! Transcript cleaning, vocabulary building and label encoding for speech
//! corpora (Switchboard, CSJ, TIMIT).

pub mod corpus;
pub mod encoder;
pub mod error;
pub mod kana;
pub mod label_type;
pub mod labeler;
pub mod phones;
pub mod record;
pub mod rewrite;
pub mod style;
pub mod vocab;

pub use corpus::{Corpus, CorpusKind, CorpusOptions};
pub use encoder::{Segmentation, SequenceEncoder};
pub use error::{CleanError, LabelError, Result};
pub use kana::KanaPhoneMap;
pub use label_type::LabelType;
pub use labeler::Labeler;
pub use phones::{PhoneMap, PhoneSet};
pub use record::{UtteranceRecord, group_by_speaker};
pub use style::{LabelStyle, Partition};
pub use vocab::{SymbolTable, SymbolUnit, VocabularyBuilder};
