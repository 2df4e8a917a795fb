//! Turns utterance records into framed labels for one label type.

use tracing::debug;

use crate::corpus::Corpus;
use crate::encoder::SequenceEncoder;
use crate::error::{LabelError, Result};
use crate::kana::{KanaPhoneMap, kata_to_hira};
use crate::label_type::LabelType;
use crate::phones::PhoneMap;
use crate::record::UtteranceRecord;
use crate::style::LabelStyle;
use crate::vocab::{SymbolTable, VocabularyBuilder};

/// Cleans, frames and (for phone labels) converts the transcripts of a
/// corpus for one style and label type.
pub struct Labeler<'c> {
    corpus: &'c dyn Corpus,
    style: LabelStyle,
    label_type: LabelType,
    kana_phones: Option<KanaPhoneMap>,
    phone_map: Option<PhoneMap>,
}

impl<'c> Labeler<'c> {
    /// Fails when the corpus has no transcripts for `label_type`.
    pub fn new(corpus: &'c dyn Corpus, style: LabelStyle, label_type: LabelType) -> Result<Self> {
        if !corpus.supports(label_type) {
            return Err(LabelError::Unsupported {
                corpus: corpus.name(),
                label_type: label_type.as_str(),
            });
        }
        Ok(Self {
            corpus,
            style,
            label_type,
            kana_phones: None,
            phone_map: None,
        })
    }

    /// Kana-to-phone table; required for CSJ phone labels and used to seed
    /// the kana and kanji vocabularies.
    pub fn with_kana_phones(mut self, map: KanaPhoneMap) -> Self {
        self.kana_phones = Some(map);
        self
    }

    /// Phone collapse table; required for TIMIT phone labels.
    pub fn with_phone_map(mut self, map: PhoneMap) -> Self {
        self.phone_map = Some(map);
        self
    }

    pub fn style(&self) -> LabelStyle {
        self.style
    }

    pub fn label_type(&self) -> LabelType {
        self.label_type
    }

    /// Checks that the tables the label type depends on are present.
    pub fn validate(&self) -> Result<()> {
        let missing = |resource| LabelError::MissingResource {
            label_type: self.label_type.as_str(),
            resource,
        };
        match self.label_type {
            LabelType::Phone if self.kana_phones.is_none() => Err(missing("kana-to-phone map")),
            LabelType::TimitPhone(_) if self.phone_map.is_none() => Err(missing("phone map")),
            _ => Ok(()),
        }
    }

    /// Framed label for `record`, or `None` when the utterance holds nothing
    /// but silence or a lone noise symbol.
    pub fn label(&self, record: &UtteranceRecord) -> Result<Option<String>> {
        let raw = self.corpus.transcript(record, self.label_type);

        if let LabelType::TimitPhone(set) = self.label_type {
            let map = self.phone_map.as_ref().ok_or(LabelError::MissingResource {
                label_type: self.label_type.as_str(),
                resource: "phone map",
            })?;
            let phones: Vec<&str> = raw.split_whitespace().collect();
            let collapsed = map.collapse(&phones, set)?;
            if collapsed.is_empty() {
                return Ok(None);
            }
            return Ok(Some(collapsed.join(" ")));
        }

        let cleaned = if self.corpus.cleans(self.label_type) {
            self.corpus.normalize(raw)?
        } else {
            raw.to_string()
        };

        // silence is judged on the primary tier so every label type of an
        // utterance is kept or dropped together
        let primary = self.corpus.transcript(record, LabelType::Kana);
        let primary = if primary == raw {
            cleaned.clone()
        } else {
            self.corpus.normalize(primary)?
        };
        if self
            .style
            .is_silence_only(&self.style.frame(&primary), self.corpus.noise_symbols())
        {
            debug!(utterance = %record.file_stem(), "Dropping silence-only utterance");
            return Ok(None);
        }

        let framed = self.style.frame(&cleaned);
        match self.label_type {
            LabelType::Phone => {
                let map = self.kana_phones.as_ref().ok_or(LabelError::MissingResource {
                    label_type: self.label_type.as_str(),
                    resource: "kana-to-phone map",
                })?;
                Ok(Some(map.to_phones(&framed, self.style)?.join(" ")))
            }
            _ => Ok(Some(framed)),
        }
    }

    /// Vocabulary builder seeded with the reserved symbols and any inventory
    /// the label type carries regardless of what the transcripts contain.
    pub fn vocabulary(&self) -> VocabularyBuilder {
        let noise = self.corpus.noise_symbols();
        let mut builder = VocabularyBuilder::new(
            self.label_type.symbol_unit(noise),
            self.label_type.reserved(self.style, noise),
        );

        match self.label_type {
            LabelType::Kana => {
                if let Some(map) = &self.kana_phones {
                    builder.extend(map.kana().iter().cloned());
                }
            }
            LabelType::Kanji => {
                if let Some(map) = &self.kana_phones {
                    builder.extend(map.kana().iter().cloned());
                    builder.extend(map.kana().iter().map(|k| kata_to_hira(k)));
                }
            }
            LabelType::Phone => {
                if let Some(map) = &self.kana_phones {
                    builder.extend(map.phone_inventory());
                }
            }
            LabelType::TimitPhone(set) => {
                if let Some(map) = &self.phone_map {
                    builder.extend(map.inventory(set));
                }
            }
            LabelType::Character | LabelType::CharacterCapital => {}
        }
        builder
    }

    /// Encoder matching this label type's segmentation.
    pub fn encoder<'t>(&self, table: &'t SymbolTable) -> SequenceEncoder<'t> {
        SequenceEncoder::new(table, self.label_type.segmentation())
            .with_markers(self.label_type.wraps_markers(self.style))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{CorpusKind, CorpusOptions};
    use crate::phones::PhoneSet;

    fn record(kana: &str, kanji: Option<&str>) -> UtteranceRecord {
        UtteranceRecord {
            speaker_id: "A01M0007".into(),
            utterance_index: "0001".into(),
            start_frame: 0,
            end_frame: 100,
            raw_text: kana.into(),
            secondary_text: kanji.map(str::to_string),
        }
    }

    #[test]
    fn test_unsupported_label_type() {
        let corpus = CorpusKind::Switchboard.build(CorpusOptions::default());
        assert!(matches!(
            Labeler::new(corpus.as_ref(), LabelStyle::Ctc, LabelType::Kana),
            Err(LabelError::Unsupported { corpus: "switchboard", .. })
        ));
    }

    #[test]
    fn test_switchboard_character_label() {
        let corpus = CorpusKind::Switchboard.build(CorpusOptions::default());
        let labeler =
            Labeler::new(corpus.as_ref(), LabelStyle::Ctc, LabelType::Character).unwrap();
        let label = labeler.label(&record("well,_[laughter-um]_yeah", None)).unwrap();
        assert_eq!(label.as_deref(), Some("_well_L_um_yeah_"));
        assert_eq!(labeler.label(&record("[silence]", None)).unwrap(), None);
        assert_eq!(labeler.label(&record("[laughter]", None)).unwrap(), None);
    }

    #[test]
    fn test_csj_noise_only_dropped_for_every_tier() {
        let corpus = CorpusKind::Csj.build(CorpusOptions::default());
        let noise_only = record("<笑>", Some("<笑>"));
        for label_type in [LabelType::Kana, LabelType::Kanji] {
            let labeler = Labeler::new(corpus.as_ref(), LabelStyle::Attention, label_type).unwrap();
            assert_eq!(labeler.label(&noise_only).unwrap(), None);
        }
        let labeler =
            Labeler::new(corpus.as_ref(), LabelStyle::Attention, LabelType::Kanji).unwrap();
        assert_eq!(
            labeler.label(&record("(F エー)キョー", Some("(F えー)今日"))).unwrap(),
            Some("<えー今日>".to_string())
        );
    }

    #[test]
    fn test_csj_phone_label() {
        let corpus = CorpusKind::Csj.build(CorpusOptions::default());
        let map = KanaPhoneMap::parse("キ+k i\nョ+y o\nキョ+ky o\nー+H\n").unwrap();
        let labeler = Labeler::new(corpus.as_ref(), LabelStyle::Ctc, LabelType::Phone)
            .unwrap()
            .with_kana_phones(map);
        labeler.validate().unwrap();
        assert_eq!(
            labeler.label(&record("キョー<咳>", None)).unwrap().as_deref(),
            Some("_ ky o H NZ _")
        );

        let mut builder = labeler.vocabulary();
        builder.observe("_ ky o H NZ _");
        let table = builder.build().unwrap();
        assert_eq!(table.symbols(), &["_", "NZ", "H", "i", "k", "ky", "o", "y"]);
    }

    #[test]
    fn test_missing_phone_map() {
        let corpus = CorpusKind::Timit.build(CorpusOptions::default());
        let labeler = Labeler::new(
            corpus.as_ref(),
            LabelStyle::Ctc,
            LabelType::TimitPhone(PhoneSet::Phone39),
        )
        .unwrap();
        assert!(matches!(
            labeler.validate(),
            Err(LabelError::MissingResource { resource: "phone map", .. })
        ));
    }

    #[test]
    fn test_timit_phone_attention_encoding() {
        let corpus = CorpusKind::Timit.build(CorpusOptions::default());
        let map = PhoneMap::parse("h# sil sil\nq nan nan\nsh sh sh\nix ix ih\n").unwrap();
        let labeler = Labeler::new(
            corpus.as_ref(),
            LabelStyle::Attention,
            LabelType::TimitPhone(PhoneSet::Phone39),
        )
        .unwrap()
        .with_phone_map(map);

        let label = labeler.label(&record("h# q sh ix h#", None)).unwrap().unwrap();
        assert_eq!(label, "sil sh ih sil");

        let table = labeler.vocabulary().build().unwrap();
        assert_eq!(table.symbols(), &["<", ">", "ih", "sh", "sil"]);
        let indices = labeler.encoder(&table).encode(&label).unwrap();
        assert_eq!(indices, vec![0, 4, 3, 2, 4, 1]);
    }

    #[test]
    fn test_timit_capital_label() {
        let corpus = CorpusKind::Timit.build(CorpusOptions::default());
        let labeler = Labeler::new(
            corpus.as_ref(),
            LabelStyle::Ctc,
            LabelType::CharacterCapital,
        )
        .unwrap();
        let label = labeler.label(&record("she had all.", None)).unwrap().unwrap();
        assert_eq!(label, "_she_had_all_");

        let mut builder = labeler.vocabulary();
        builder.observe(&label);
        let table = builder.build().unwrap();
        let encoder = labeler.encoder(&table);
        assert_eq!(
            encoder.tokenize(&label),
            vec!["S", "h", "e", "H", "a", "d", "A", "ll"]
        );
        assert_eq!(encoder.encode(&label).unwrap().len(), 8);
    }
}
