//! CSJ kana to phone conversion.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::info;

use crate::corpus::csj::NOISE;
use crate::error::{LabelError, Result};
use crate::style::LabelStyle;

/// Katakana → phone sequence table, read from `kana+phone phone ...` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanaPhoneMap {
    kana: Vec<String>,
    phones: HashMap<String, Vec<String>>,
}

impl KanaPhoneMap {
    pub fn parse(contents: &str) -> Result<Self> {
        let mut kana = Vec::new();
        let mut phones = HashMap::new();

        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let malformed = || LabelError::MalformedTable {
                line: line_no + 1,
                content: line.to_string(),
            };
            let (symbol, sequence) = line.split_once('+').ok_or_else(malformed)?;
            let sequence: Vec<String> = sequence.split_whitespace().map(str::to_string).collect();
            if symbol.is_empty() || sequence.is_empty() {
                return Err(malformed());
            }
            if phones.insert(symbol.to_string(), sequence).is_some() {
                return Err(LabelError::DuplicateSymbol {
                    symbol: symbol.to_string(),
                });
            }
            kana.push(symbol.to_string());
        }

        Ok(Self { kana, phones })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LabelError::io(format!("reading kana map '{}'", path.display()), e))?;
        let map = Self::parse(&contents)?;
        info!(path = %path.display(), kana = map.kana.len(), "Loaded kana-to-phone map");
        Ok(map)
    }

    /// Kana entries in file order.
    pub fn kana(&self) -> &[String] {
        &self.kana
    }

    /// Every phone the map can produce.
    pub fn phone_inventory(&self) -> BTreeSet<String> {
        self.phones.values().flatten().cloned().collect()
    }

    /// Converts a framed kana label into phones. Control symbols pass
    /// through unchanged; two-kana entries (contracted sounds) take
    /// precedence over single kana.
    pub fn to_phones(&self, label: &str, style: LabelStyle) -> Result<Vec<String>> {
        let chars: Vec<char> = label.chars().collect();
        let mut out = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let width = if i + 1 < chars.len() {
                let pair: String = chars[i..i + 2].iter().collect();
                if self.phones.contains_key(&pair) || is_control(&pair, style) { 2 } else { 1 }
            } else {
                1
            };
            let symbol: String = chars[i..i + width].iter().collect();

            if is_control(&symbol, style) {
                out.push(symbol);
            } else {
                let phones = self
                    .phones
                    .get(&symbol)
                    .ok_or_else(|| LabelError::unknown_symbol(symbol.as_str(), label))?;
                out.extend(phones.iter().cloned());
            }
            i += width;
        }
        Ok(out)
    }
}

fn is_control(symbol: &str, style: LabelStyle) -> bool {
    match symbol {
        NOISE | "_" => true,
        "<" | ">" => style == LabelStyle::Attention,
        _ => false,
    }
}

/// Katakana to hiragana by codepoint offset; other characters unchanged.
pub fn kata_to_hira(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
            _ => c,
        })
        .collect()
}
