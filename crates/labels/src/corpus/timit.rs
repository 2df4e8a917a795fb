use std::path::Path;

use tracing::debug;

use super::{Corpus, CorpusOptions, read_transcript};
use crate::error::{CleanError, LabelError, Result};
use crate::label_type::LabelType;
use crate::record::UtteranceRecord;
use crate::rewrite::{Replacement, RewriteRule, apply_all, collapse_repeats};
use crate::style::SEPARATOR;

/// TIMIT audio sample rate; transcript boundaries are in samples.
pub const SAMPLE_RATE: u32 = 16_000;

/// TIMIT `.txt` sentence and `.phn` phone transcripts.
///
/// The speaker is the parent directory (`dr1/fcjf0/sa1.txt` -> `fcjf0`) and
/// the utterance id is the file stem.
pub struct Timit {
    options: CorpusOptions,
    rules: Vec<RewriteRule>,
}

impl Timit {
    pub fn new(options: CorpusOptions) -> Self {
        Self {
            options,
            rules: vec![
                RewriteRule::once("punctuation", r#"[":;!?,.\-]+"#, Replacement::Template("")),
                RewriteRule::once("spacing", r"\s+", Replacement::Template("_")),
            ],
        }
    }

    fn samples_to_frame(&self, samples: u64) -> usize {
        (samples * self.options.frame_rate as u64 / SAMPLE_RATE as u64) as usize
    }

    fn identify(path: &Path) -> Result<(String, String)> {
        let stem = path.file_stem().and_then(|s| s.to_str());
        let speaker = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str());
        match (speaker, stem) {
            (Some(speaker), Some(stem)) => Ok((speaker.to_string(), stem.to_string())),
            _ => Err(LabelError::malformed_record(
                path,
                0,
                "expected '<speaker>/<utterance>' layout",
            )),
        }
    }

    fn parse_samples(path: &Path, line_no: usize, field: &str) -> Result<u64> {
        field.parse().map_err(|_| {
            LabelError::malformed_record(path, line_no, format!("bad sample offset '{field}'"))
        })
    }

    /// `<start> <end> <sentence>` on the last non-empty line.
    fn read_sentence(&self, path: &Path, contents: &str) -> Result<UtteranceRecord> {
        let (line_no, line) = contents
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .last()
            .ok_or_else(|| LabelError::malformed_record(path, 0, "empty transcript"))?;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(LabelError::malformed_record(
                path,
                line_no + 1,
                "expected '<start> <end> <sentence>'",
            ));
        }
        let start = Self::parse_samples(path, line_no + 1, fields[0])?;
        let end = Self::parse_samples(path, line_no + 1, fields[1])?;
        let (speaker_id, utterance_index) = Self::identify(path)?;

        Ok(UtteranceRecord {
            speaker_id,
            utterance_index,
            start_frame: self.samples_to_frame(start),
            end_frame: self.samples_to_frame(end),
            raw_text: fields[2..].join(" ").to_lowercase(),
            secondary_text: None,
        })
    }

    /// `<start> <end> <phone>` per line; the record spans all phones.
    fn read_phones(&self, path: &Path, contents: &str) -> Result<UtteranceRecord> {
        let mut phones = Vec::new();
        let mut span: Option<(u64, u64)> = None;

        for (line_no, line) in contents.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != 3 {
                return Err(LabelError::malformed_record(
                    path,
                    line_no + 1,
                    "expected '<start> <end> <phone>'",
                ));
            }
            let start = Self::parse_samples(path, line_no + 1, fields[0])?;
            let end = Self::parse_samples(path, line_no + 1, fields[1])?;
            span = Some(match span {
                Some((first, _)) => (first, end),
                None => (start, end),
            });
            phones.push(fields[2]);
        }

        let (start, end) =
            span.ok_or_else(|| LabelError::malformed_record(path, 0, "no phones"))?;
        let (speaker_id, utterance_index) = Self::identify(path)?;

        Ok(UtteranceRecord {
            speaker_id,
            utterance_index,
            start_frame: self.samples_to_frame(start),
            end_frame: self.samples_to_frame(end),
            raw_text: phones.join(" "),
            secondary_text: None,
        })
    }
}

impl Corpus for Timit {
    fn name(&self) -> &'static str {
        "timit"
    }

    fn normalize(&self, raw: &str) -> std::result::Result<String, CleanError> {
        let text = apply_all(&self.rules, raw.trim(), self.options.max_rewrite_passes)?;
        Ok(collapse_repeats(&text, SEPARATOR))
    }

    /// One record per file; `.phn` files give phone records, anything else
    /// is read as a sentence transcript.
    fn parse_records(&self, path: &Path) -> Result<Vec<UtteranceRecord>> {
        let contents = read_transcript(path)?;
        let is_phn = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("phn"));
        let record = if is_phn {
            self.read_phones(path, &contents)?
        } else {
            self.read_sentence(path, &contents)?
        };
        debug!(path = %path.display(), utterance = %record.file_stem(), "Read TIMIT transcript");
        Ok(vec![record])
    }

    fn noise_symbols(&self) -> &'static [&'static str] {
        &[]
    }

    fn supports(&self, label_type: LabelType) -> bool {
        matches!(
            label_type,
            LabelType::Character | LabelType::CharacterCapital | LabelType::TimitPhone(_)
        )
    }

    fn cleans(&self, label_type: LabelType) -> bool {
        !matches!(label_type, LabelType::TimitPhone(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phones::PhoneSet;

    fn corpus() -> Timit {
        Timit::new(CorpusOptions::default())
    }

    fn write(dir: &Path, speaker: &str, name: &str, contents: &str) -> std::path::PathBuf {
        let speaker_dir = dir.join(speaker);
        std::fs::create_dir_all(&speaker_dir).unwrap();
        let path = speaker_dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_normalize() {
        let timit = corpus();
        assert_eq!(
            timit.normalize("she had your dark suit in greasy wash water all year.").unwrap(),
            "she_had_your_dark_suit_in_greasy_wash_water_all_year"
        );
        assert_eq!(timit.normalize("\"don't,\" she-said;  ok?").unwrap(), "don't_shesaid_ok");
    }

    #[test]
    fn test_idempotent() {
        let timit = corpus();
        let once = timit.normalize("  yes: no -- maybe!  ").unwrap();
        assert_eq!(once, "yes_no_maybe");
        assert_eq!(timit.normalize(&once).unwrap(), once);
    }

    #[test]
    fn test_read_sentence() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "fcjf0",
            "sa1.txt",
            "0 46797 She had your dark suit in greasy wash water all year.\n",
        );
        let records = corpus().parse_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.file_stem(), "fcjf0_sa1");
        assert_eq!(record.end_frame, 292);
        assert!(record.raw_text.starts_with("she had your"));
    }

    #[test]
    fn test_read_phones() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "mdab0",
            "si1039.phn",
            "0 3050 h#\n3050 4559 sh\n4559 5723 ix\n5723 6400 h#\n",
        );
        let timit = corpus();
        let records = timit.parse_records(&path).unwrap();
        assert_eq!(records[0].raw_text, "h# sh ix h#");
        assert_eq!((records[0].start_frame, records[0].end_frame), (0, 40));
        assert!(!timit.cleans(LabelType::TimitPhone(PhoneSet::Phone39)));
        assert!(timit.cleans(LabelType::Character));
    }

    #[test]
    fn test_bad_phone_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "mdab0", "si1039.phn", "0 3050\n");
        assert!(matches!(
            corpus().parse_records(&path),
            Err(LabelError::MalformedRecord { line: 1, .. })
        ));
    }
}
