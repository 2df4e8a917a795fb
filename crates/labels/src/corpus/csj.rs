use std::path::Path;

use regex::Captures;
use tracing::{debug, warn};

use super::{Corpus, CorpusOptions};
use crate::error::{CleanError, LabelError, Result};
use crate::label_type::LabelType;
use crate::record::{UtteranceRecord, secs_to_frame, utterance_key};
use crate::rewrite::{Replacement, RewriteRule, apply_all, collapse_repeats};
use crate::style::SEPARATOR;

/// Event symbol for laughter, coughs, breath and other non-speech sounds.
pub const NOISE: &str = "NZ";

const TIME_COLUMN: usize = 3;
const KANJI_COLUMN: usize = 5;
const KANA_COLUMN: usize = 10;

/// Corpus of Spontaneous Japanese `.sdb` word tables.
///
/// One word per tab-separated row. Column 3 holds `"<utt> <start>-<end>"`,
/// column 5 the orthographic form and column 10 the katakana reading.
pub struct Csj {
    options: CorpusOptions,
    rules: Vec<RewriteRule>,
}

impl Csj {
    pub fn new(options: CorpusOptions) -> Self {
        Self {
            options,
            rules: rules(),
        }
    }
}

/// Reads an `.sdb` table. The corpus ships them in Shift-JIS; UTF-8
/// conversions are accepted as they are.
fn read_sdb(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| LabelError::io(format!("reading transcript '{}'", path.display()), e))?;
    let bytes = match String::from_utf8(bytes) {
        Ok(text) => return Ok(text),
        Err(e) => e.into_bytes(),
    };
    let (text, had_errors) = encoding_rs::SHIFT_JIS.decode_without_bom_handling(&bytes);
    if had_errors {
        return Err(LabelError::Undecodable {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), "Decoded Shift-JIS transcript");
    Ok(text.into_owned())
}

/// Keeps the content of a `(TAG content)` span; alternations keep their
/// first side.
fn unwrap_tag(caps: &Captures<'_>) -> String {
    let tag = &caps[1];
    let content = &caps[2];
    let first = content.split(';').next().unwrap_or(content);
    let first = if tag == "?" {
        first.split(',').next().unwrap_or(first)
    } else {
        first
    };
    first.trim().to_string()
}

fn rules() -> Vec<RewriteRule> {
    use Replacement::{Template, With};

    vec![
        // (F えー), (D こ), (A 1;イチ), (? ア,イ); innermost first
        RewriteRule::fixed_point("tag", r"\(([A-Z?][A-Z0-9]*)\s*([^()]*)\)", With(unwrap_tag)),
        RewriteRule::once("noise", r"<(?:笑|咳|息|泣|フ|雑音)>", Template(NOISE)),
        RewriteRule::once("marker", r"<[^<>]*>", Template("")),
        RewriteRule::once("residue", r"[×|()]", Template("")),
        RewriteRule::once("spacing", r"\s+", Template("_")),
    ]
}

fn unbalanced(text: &str) -> bool {
    text.matches('(').count() != text.matches(')').count()
}

/// Words accumulated for the utterance being read.
struct Pending {
    index: u32,
    last_index: u32,
    start: f64,
    end: f64,
    kana: String,
    kanji: String,
}

impl Pending {
    fn unbalanced(&self) -> bool {
        unbalanced(&self.kana) || unbalanced(&self.kanji)
    }
}

struct Row<'a> {
    index: u32,
    start: f64,
    end: f64,
    kanji: &'a str,
    kana: &'a str,
}

fn parse_row<'a>(path: &Path, line_no: usize, line: &'a str) -> Result<Row<'a>> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() <= KANA_COLUMN {
        return Err(LabelError::malformed_record(
            path,
            line_no,
            format!("expected at least {} columns, found {}", KANA_COLUMN + 1, columns.len()),
        ));
    }

    let bad_time = || {
        LabelError::malformed_record(
            path,
            line_no,
            format!("bad time column '{}'", columns[TIME_COLUMN]),
        )
    };
    let (index, span) = columns[TIME_COLUMN]
        .trim()
        .split_once(' ')
        .ok_or_else(bad_time)?;
    let (start, end) = span.trim().split_once('-').ok_or_else(bad_time)?;

    Ok(Row {
        index: index.trim().parse().map_err(|_| bad_time())?,
        start: start.parse().map_err(|_| bad_time())?,
        end: end.parse().map_err(|_| bad_time())?,
        kanji: columns[KANJI_COLUMN].trim(),
        kana: columns[KANA_COLUMN].trim(),
    })
}

impl Csj {
    fn push_word(&self, pending: &mut Pending, row: &Row<'_>) {
        pending.kana.push_str(row.kana);
        pending.kanji.push_str(row.kanji);
        if self.options.divide_by_space {
            pending.kana.push(SEPARATOR);
            pending.kanji.push(SEPARATOR);
        }
        pending.last_index = row.index;
        pending.end = row.end;
    }

    fn start(&self, row: &Row<'_>) -> Pending {
        let mut pending = Pending {
            index: row.index,
            last_index: row.index,
            start: row.start,
            end: row.end,
            kana: String::new(),
            kanji: String::new(),
        };
        self.push_word(&mut pending, row);
        pending
    }

    fn finish(&self, speaker: &str, pending: Pending) -> UtteranceRecord {
        if pending.unbalanced() {
            warn!(
                speaker,
                utterance = pending.index,
                kana = %pending.kana,
                "Unbalanced parentheses at end of transcript"
            );
        }
        UtteranceRecord {
            speaker_id: speaker.to_string(),
            utterance_index: utterance_key(pending.index),
            start_frame: secs_to_frame(pending.start, self.options.frame_rate, 0.5),
            end_frame: secs_to_frame(pending.end, self.options.frame_rate, 0.5),
            raw_text: pending.kana,
            secondary_text: Some(pending.kanji),
        }
    }
}

impl Corpus for Csj {
    fn name(&self) -> &'static str {
        "csj"
    }

    fn normalize(&self, raw: &str) -> std::result::Result<String, CleanError> {
        let text = apply_all(&self.rules, raw.trim(), self.options.max_rewrite_passes)?;
        Ok(collapse_repeats(&text, SEPARATOR))
    }

    /// Stacks the words of each utterance. When the index changes while a
    /// tag is still open, stacking carries on into the next utterance until
    /// the parentheses balance.
    fn parse_records(&self, path: &Path) -> Result<Vec<UtteranceRecord>> {
        let contents = read_sdb(path)?;
        let speaker = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.split('.').next())
            .unwrap_or_default()
            .to_string();

        let mut records = Vec::new();
        let mut pending: Option<Pending> = None;

        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = parse_row(path, line_no + 1, line)?;

            match pending.as_mut() {
                Some(p) if p.last_index == row.index || p.unbalanced() => {
                    self.push_word(p, &row);
                }
                _ => {
                    if let Some(done) = pending.take() {
                        records.push(self.finish(&speaker, done));
                    }
                    pending = Some(self.start(&row));
                }
            }
        }
        if let Some(done) = pending {
            records.push(self.finish(&speaker, done));
        }

        debug!(path = %path.display(), records = records.len(), "Read CSJ transcript");
        Ok(records)
    }

    fn noise_symbols(&self) -> &'static [&'static str] {
        &[NOISE]
    }

    fn supports(&self, label_type: LabelType) -> bool {
        matches!(
            label_type,
            LabelType::Kana | LabelType::Kanji | LabelType::Phone
        )
    }

    fn transcript<'r>(&self, record: &'r UtteranceRecord, label_type: LabelType) -> &'r str {
        match (label_type, record.secondary_text.as_deref()) {
            (LabelType::Kanji, Some(kanji)) => kanji,
            _ => &record.raw_text,
        }
    }
}
