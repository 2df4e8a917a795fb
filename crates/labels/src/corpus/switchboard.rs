use std::path::Path;

use tracing::debug;

use super::{Corpus, CorpusOptions, read_transcript};
use crate::error::{CleanError, LabelError, Result};
use crate::label_type::LabelType;
use crate::record::{UtteranceRecord, secs_to_frame, utterance_key};
use crate::rewrite::{Replacement, RewriteRule, apply_all, collapse_repeats};
use crate::style::SEPARATOR;

/// Event symbol for laughter.
pub const LAUGHTER: &str = "L";
/// Event symbol for noise and vocalized noise.
pub const NOISE: &str = "N";

/// Switchboard (LDC97S62) `*-trans.text` transcripts.
///
/// Lines look like `sw02001A-ms98-a-0001 0.000 0.977 [silence]`: utterance
/// id, start and end in seconds, then the words.
pub struct Switchboard {
    options: CorpusOptions,
    rules: Vec<RewriteRule>,
    spacing: RewriteRule,
}

impl Switchboard {
    pub fn new(options: CorpusOptions) -> Self {
        Self {
            options,
            rules: rules(),
            spacing: RewriteRule::once("spacing", r"\s+", Replacement::Template("_")),
        }
    }
}

fn rules() -> Vec<RewriteRule> {
    use Replacement::Template;

    vec![
        RewriteRule::once("aside", r"<b_aside>|<e_aside>|\[silence\]", Template("")),
        RewriteRule::once("underscore", r"_", Template(" ")),
        RewriteRule::once("laughter", r"\[laughter\]", Template(LAUGHTER)),
        RewriteRule::once("noise", r"\[noise\]|\[vocalized-noise\]", Template(NOISE)),
        RewriteRule::once("ampersand", r"&", Template(" and ")),
        // [laughter-story] -> L story
        RewriteRule::fixed_point(
            "laughing-word",
            r"\[laughter-([^\[\]\s]+)\]",
            Template("L ${1}"),
        ),
        // only after another word; a transcript may open with the real word
        RewriteRule::once("bare-laughter", r" laughter\b", Template(" L")),
        // [it'n/isn't] -> it'n, [lem[guini]-/linguini] -> lem[guini]-
        RewriteRule::fixed_point(
            "alternation",
            r"\[((?:[^\[\]\s/]|\[[^\[\]\s]*\])+)/([^\[\]\s/]+)\]",
            Template("${1}"),
        ),
        // -[an]y -> -y
        RewriteRule::fixed_point("partial-head", r"-\[([^\[\]\s]+)\]", Template("-")),
        // ab[solute]- -> ab-
        RewriteRule::fixed_point("partial-tail", r"\[([^\[\]\s]+)\]-", Template("-")),
        // {yuppiedom} -> yuppiedom
        RewriteRule::fixed_point("coinage", r"\{([^{}\s]+)\}", Template("${1}")),
        // ammu[n]it- -> ammu-it-
        RewriteRule::fixed_point("mispronounced", r"\[([^\[\]\s]+)\]", Template("-")),
        RewriteRule::once("punctuation", r#"[/,.?!";:]"#, Template("")),
    ]
}

/// Drops the `_N` sense index of a transcript token: `them_1` -> `them`.
///
/// Done on whitespace tokens of the raw record only; cleaned text uses `_`
/// as its word separator and may hold numerals.
fn strip_word_number(token: &str) -> &str {
    match token.rsplit_once('_') {
        Some((word, number))
            if !word.is_empty()
                && !number.is_empty()
                && number.bytes().all(|b| b.is_ascii_digit())
                && word.chars().all(|c| c.is_alphabetic() || c == '\'') =>
        {
            word
        }
        _ => token,
    }
}

impl Corpus for Switchboard {
    fn name(&self) -> &'static str {
        "switchboard"
    }

    fn normalize(&self, raw: &str) -> std::result::Result<String, CleanError> {
        let text = apply_all(&self.rules, raw, self.options.max_rewrite_passes)?;
        let text = self.spacing.apply(text.trim(), 1)?;
        Ok(collapse_repeats(&text, SEPARATOR))
    }

    fn parse_records(&self, path: &Path) -> Result<Vec<UtteranceRecord>> {
        let contents = read_transcript(path)?;
        let mut records = Vec::new();

        for (line_no, line) in contents.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() < 3 {
                return Err(LabelError::malformed_record(
                    path,
                    line_no + 1,
                    "expected '<utterance-id> <start> <end> [words...]'",
                ));
            }

            let utterance_id = fields[0];
            let speaker_id = utterance_id.split('-').next().unwrap_or(utterance_id);
            let utterance_index = utterance_id.rsplit('-').next().unwrap_or(utterance_id);

            let parse_secs = |field: &str| {
                field.parse::<f64>().map_err(|_| {
                    LabelError::malformed_record(path, line_no + 1, format!("bad timestamp '{field}'"))
                })
            };
            let start = parse_secs(fields[1])?;
            let end = parse_secs(fields[2])?;

            records.push(UtteranceRecord {
                speaker_id: speaker_id.to_string(),
                utterance_index: utterance_key(utterance_index),
                start_frame: secs_to_frame(start, self.options.frame_rate, 0.05),
                end_frame: secs_to_frame(end, self.options.frame_rate, 0.05),
                raw_text: fields[3..]
                    .iter()
                    .map(|token| strip_word_number(token))
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase(),
                secondary_text: None,
            });
        }

        debug!(path = %path.display(), records = records.len(), "Read Switchboard transcript");
        Ok(records)
    }

    fn noise_symbols(&self) -> &'static [&'static str] {
        &[LAUGHTER, NOISE]
    }

    fn supports(&self, label_type: LabelType) -> bool {
        matches!(label_type, LabelType::Character | LabelType::CharacterCapital)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn corpus() -> Switchboard {
        Switchboard::new(CorpusOptions::default())
    }

    #[test]
    fn test_laughter_word() {
        assert_eq!(
            corpus().normalize("well,_[laughter-um]_yeah").unwrap(),
            "well_L_um_yeah"
        );
    }

    #[test]
    fn test_event_symbols_and_asides() {
        let sb = corpus();
        assert_eq!(sb.normalize("[silence]").unwrap(), "");
        assert_eq!(
            sb.normalize("<b_aside> oh [noise] [laughter] you & me <e_aside>").unwrap(),
            "oh_N_L_you_and_me"
        );
        assert_eq!(sb.normalize("[vocalized-noise] so laughter").unwrap(), "N_so_L");
        assert_eq!(sb.normalize("laughter is good").unwrap(), "laughter_is_good");
    }

    #[test]
    fn test_partial_words_and_alternations() {
        let sb = corpus();
        assert_eq!(sb.normalize("[it'n/isn't] it").unwrap(), "it'n_it");
        assert_eq!(sb.normalize("a [lem[guini]-/linguini] b").unwrap(), "a_lem-_b");
        assert_eq!(sb.normalize("-[an]y ab[solute]-").unwrap(), "-y_ab-");
        assert_eq!(sb.normalize("{yuppiedom} ammu[n]it-").unwrap(), "yuppiedom_ammu-it-");
    }

    #[test]
    fn test_punctuation_and_spacing() {
        assert_eq!(
            corpus().normalize("  yes,  i \"know\". right?/ ").unwrap(),
            "yes_i_know_right"
        );
    }

    #[test]
    fn test_idempotent() {
        let sb = corpus();
        for raw in [
            "well,_[laughter-um]_yeah",
            "a [lem[guini]-/linguini] b",
            "<b_aside> oh [noise] & {yuppiedom} <e_aside>",
            "i have 2 kids",
            "well_2",
            "so laughter",
        ] {
            let once = sb.normalize(raw).unwrap();
            assert_eq!(sb.normalize(&once).unwrap(), once);
            assert!(!once.contains("__"));
            assert!(!once.contains('['));
        }
    }

    #[test]
    fn test_parse_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sw02001A-ms98-a-0001 0.000000 0.977625 [silence]").unwrap();
        writeln!(file, "sw02001A-ms98-a-0002 0.977625 11.561375 Hi, um, [laughter]").unwrap();
        writeln!(file).unwrap();

        let records = corpus().parse_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].speaker_id, "sw02001A");
        assert_eq!(records[1].utterance_index, "0002");
        assert_eq!(records[1].start_frame, 97);
        assert_eq!(records[1].end_frame, 1156);
        assert_eq!(records[1].raw_text, "hi, um, [laughter]");
        assert_eq!(records[0].raw_text, "[silence]");
    }

    #[test]
    fn test_word_number_stripped_on_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sw02001A-ms98-a-0003 1.0 2.0 them_1 too i'd_2 b_c 2_4").unwrap();

        let records = corpus().parse_records(file.path()).unwrap();
        assert_eq!(records[0].raw_text, "them too i'd b_c 2_4");
        assert_eq!(corpus().normalize(&records[0].raw_text).unwrap(), "them_too_i'd_b_c_2_4");
        assert_eq!(corpus().normalize("i have 2 kids").unwrap(), "i_have_2_kids");
    }

    #[test]
    fn test_malformed_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sw02001A-ms98-a-0001 0.0").unwrap();
        assert!(matches!(
            corpus().parse_records(file.path()),
            Err(LabelError::MalformedRecord { line: 1, .. })
        ));
    }
}
