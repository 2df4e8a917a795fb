use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{LabelError, Result};
use crate::style::{EOS, LabelStyle, SEPARATOR, SOS};

/// Ordered symbol → index mapping persisted as `symbol  index` lines.
///
/// Built once from the training partition and reused unchanged for dev/test
/// encoding; an index file is only meaningful against the table it was
/// encoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: Vec<String>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    /// Assigns indices `0..N` in the given order. Rejects duplicates.
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self {
            symbols: Vec::new(),
            index: HashMap::new(),
        };
        for symbol in symbols {
            let symbol = symbol.into();
            if table.index.contains_key(&symbol) {
                return Err(LabelError::DuplicateSymbol { symbol });
            }
            table.index.insert(symbol.clone(), table.symbols.len());
            table.symbols.push(symbol);
        }
        Ok(table)
    }

    /// Parses the textual form. Indices must run `0..N` in line order.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut symbols = Vec::new();

        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }

            // "symbol index"; split from the right so the symbol keeps any inner text
            let parts: Vec<&str> = line.rsplitn(2, |c: char| c.is_whitespace()).collect();
            let malformed = || LabelError::MalformedTable {
                line: line_no + 1,
                content: line.to_string(),
            };
            if parts.len() != 2 {
                return Err(malformed());
            }
            let index: usize = parts[0].parse().map_err(|_| malformed())?;
            let symbol = parts[1].trim();
            if symbol.is_empty() || index != symbols.len() {
                return Err(malformed());
            }
            symbols.push(symbol.to_string());
        }

        Self::from_symbols(symbols)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LabelError::io(format!("reading symbol table '{}'", path.display()), e))?;
        let table = Self::parse(&contents)?;
        info!(path = %path.display(), symbols = table.len(), "Loaded symbol table");
        Ok(table)
    }

    /// Textual form, one `symbol  index` line per symbol in assignment order.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (index, symbol) in self.symbols.iter().enumerate() {
            out.push_str(&format!("{symbol}  {index}\n"));
        }
        out
    }

    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| LabelError::io(format!("creating '{}'", parent.display()), e))?;
        }
        std::fs::write(path, self.to_text())
            .map_err(|e| LabelError::io(format!("writing symbol table '{}'", path.display()), e))?;
        info!(path = %path.display(), symbols = self.len(), "Persisted symbol table");
        Ok(())
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.index.get(symbol).copied()
    }

    pub fn symbol_of(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(|s| s.as_str())
    }

    /// Symbols for `indices`, failing on the first index outside the table.
    pub fn decode(&self, indices: &[usize]) -> Result<Vec<&str>> {
        indices
            .iter()
            .map(|&i| {
                self.symbol_of(i)
                    .ok_or(LabelError::UnknownIndex { index: i as i64 })
            })
            .collect()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.index.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

/// How a cleaned label is split into vocabulary symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolUnit {
    /// One symbol per character; listed multi-character symbols (e.g. the
    /// `NZ` noise marker) are kept whole.
    Char { multi_char: Vec<String> },
    /// Whitespace-separated tokens (phones).
    Token,
    /// Per separator-delimited word: the upper-cased initial, the remaining
    /// characters, and each identical adjacent pair as a double-letter symbol.
    CapitalWord,
}

impl SymbolUnit {
    pub fn chars() -> Self {
        SymbolUnit::Char {
            multi_char: Vec::new(),
        }
    }

    /// Symbols observed in `label`. Edge attention markers are skipped; they
    /// are always reserved.
    pub fn symbols(&self, label: &str) -> Vec<String> {
        let body = strip_markers(label);
        match self {
            SymbolUnit::Char { multi_char } => split_chars(body, multi_char),
            SymbolUnit::Token => body.split_whitespace().map(str::to_string).collect(),
            SymbolUnit::CapitalWord => {
                let mut out = Vec::new();
                for word in body.split(SEPARATOR).filter(|w| !w.is_empty()) {
                    let chars: Vec<char> = word.chars().collect();
                    out.push(chars[0].to_uppercase().collect());
                    for (i, c) in chars.iter().enumerate().skip(1) {
                        out.push(c.to_string());
                        if i + 1 < chars.len() && chars[i + 1] == *c {
                            out.push(format!("{c}{c}"));
                        }
                    }
                }
                out
            }
        }
    }
}

fn strip_markers(label: &str) -> &str {
    let label = label.strip_prefix(SOS).unwrap_or(label);
    label.strip_suffix(EOS).unwrap_or(label)
}

fn split_chars(text: &str, multi_char: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = text;
    'outer: while let Some(c) = rest.chars().next() {
        for symbol in multi_char {
            if rest.starts_with(symbol.as_str()) {
                out.push(symbol.clone());
                rest = &rest[symbol.len()..];
                continue 'outer;
            }
        }
        out.push(c.to_string());
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Control symbols in canonical order: separator, then start/end markers for
/// attention labels, then the noise symbols.
pub fn reserved_symbols(style: LabelStyle, noise: &[&str]) -> Vec<String> {
    let mut reserved = vec![SEPARATOR.to_string()];
    if style == LabelStyle::Attention {
        reserved.push(SOS.to_string());
        reserved.push(EOS.to_string());
    }
    reserved.extend(noise.iter().map(|s| s.to_string()));
    reserved
}

/// Accumulates the symbols of the training transcripts and assigns indices.
///
/// Reserved symbols take the lowest indices in the order given; everything
/// else follows in codepoint order, so the same symbol multiset always
/// yields the same table.
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    unit: SymbolUnit,
    reserved: Vec<String>,
    observed: BTreeSet<String>,
}

impl VocabularyBuilder {
    pub fn new(unit: SymbolUnit, reserved: Vec<String>) -> Self {
        Self {
            unit,
            reserved,
            observed: BTreeSet::new(),
        }
    }

    pub fn observe(&mut self, label: &str) {
        for symbol in self.unit.symbols(label) {
            self.observed.insert(symbol);
        }
    }

    /// Adds inventory symbols that may not occur in the transcripts.
    pub fn extend<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observed.extend(symbols.into_iter().map(Into::into));
    }

    pub fn observed_len(&self) -> usize {
        self.observed.len()
    }

    pub fn build(&self) -> Result<SymbolTable> {
        let rest = self
            .observed
            .iter()
            .filter(|s| !self.reserved.contains(s))
            .cloned();
        let table = SymbolTable::from_symbols(self.reserved.iter().cloned().chain(rest))?;
        debug!(
            reserved = self.reserved.len(),
            total = table.len(),
            "Built symbol table"
        );
        Ok(table)
    }
}
