use std::fmt;
use std::str::FromStr;

use crate::encoder::Segmentation;
use crate::error::LabelError;
use crate::phones::PhoneSet;
use crate::style::{EOS, LabelStyle, SOS};
use crate::vocab::{SymbolUnit, reserved_symbols};

/// Which label representation a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelType {
    /// Characters with the separator between words.
    Character,
    /// Capital-initial words with double-letter units, no separator.
    CharacterCapital,
    /// CSJ kana reading.
    Kana,
    /// CSJ orthographic form (kanji, kana, alphabet).
    Kanji,
    /// CSJ phones converted from the kana reading.
    Phone,
    /// TIMIT phones collapsed to the given set.
    TimitPhone(PhoneSet),
}

const EXPECTED: &str =
    "character, character_capital_divide, kana, kanji, phone, phone61, phone48, phone39";

impl LabelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelType::Character => "character",
            LabelType::CharacterCapital => "character_capital_divide",
            LabelType::Kana => "kana",
            LabelType::Kanji => "kanji",
            LabelType::Phone => "phone",
            LabelType::TimitPhone(set) => set.as_str(),
        }
    }

    pub fn segmentation(&self) -> Segmentation {
        match self {
            LabelType::Character => Segmentation::Plain,
            LabelType::CharacterCapital => Segmentation::CapitalDoubleLetter,
            LabelType::Kana | LabelType::Kanji => Segmentation::GreedyPair,
            LabelType::Phone | LabelType::TimitPhone(_) => Segmentation::Phone,
        }
    }

    pub fn symbol_unit(&self, noise: &[&str]) -> SymbolUnit {
        match self {
            LabelType::Character | LabelType::Kana | LabelType::Kanji => SymbolUnit::Char {
                multi_char: noise
                    .iter()
                    .filter(|s| s.chars().count() > 1)
                    .map(|s| s.to_string())
                    .collect(),
            },
            LabelType::CharacterCapital => SymbolUnit::CapitalWord,
            LabelType::Phone | LabelType::TimitPhone(_) => SymbolUnit::Token,
        }
    }

    /// Control symbols pinned to the lowest indices of this label type's table.
    ///
    /// Capital-divided characters and TIMIT phones carry no separator or noise
    /// symbol, only the attention markers.
    pub fn reserved(&self, style: LabelStyle, noise: &[&str]) -> Vec<String> {
        match self {
            LabelType::CharacterCapital | LabelType::TimitPhone(_) => match style {
                LabelStyle::Ctc => Vec::new(),
                LabelStyle::Attention => vec![SOS.to_string(), EOS.to_string()],
            },
            _ => reserved_symbols(style, noise),
        }
    }

    /// TIMIT phone sequences come without markers; the encoder adds them.
    pub fn wraps_markers(&self, style: LabelStyle) -> bool {
        matches!(self, LabelType::TimitPhone(_)) && style == LabelStyle::Attention
    }

    /// File name of the persisted symbol table.
    pub fn table_file_name(&self) -> String {
        format!("{}_to_num.txt", self.as_str())
    }
}

impl fmt::Display for LabelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelType {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(LabelType::Character),
            "character_capital_divide" => Ok(LabelType::CharacterCapital),
            "kana" => Ok(LabelType::Kana),
            "kanji" => Ok(LabelType::Kanji),
            "phone" => Ok(LabelType::Phone),
            other => match other.parse::<PhoneSet>() {
                Ok(set) => Ok(LabelType::TimitPhone(set)),
                Err(_) => Err(LabelError::UnknownSelector {
                    kind: "label type",
                    value: other.to_string(),
                    expected: EXPECTED,
                }),
            },
        }
    }
}
