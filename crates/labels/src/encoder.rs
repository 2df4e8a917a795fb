use crate::error::{LabelError, Result};
use crate::style::{EOS, SEPARATOR, SOS};
use crate::vocab::SymbolTable;

/// Policy for splitting a cleaned label into table tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segmentation {
    /// One token per character.
    Plain,
    /// Two-character window first when the table has it, else one character
    /// (contracted kana such as `キャ`, the `NZ` noise symbol).
    GreedyPair,
    /// Separator-delimited words with an upper-cased initial; identical
    /// adjacent letters fuse into one double-letter token.
    CapitalDoubleLetter,
    /// Single-space-delimited phone tokens.
    Phone,
}

/// Encodes cleaned labels into index sequences against a fixed table.
///
/// Lookups never fall back to an unknown token: a symbol missing from the
/// table is an error naming the symbol.
pub struct SequenceEncoder<'a> {
    table: &'a SymbolTable,
    segmentation: Segmentation,
    wrap_markers: bool,
}

impl<'a> SequenceEncoder<'a> {
    pub fn new(table: &'a SymbolTable, segmentation: Segmentation) -> Self {
        Self {
            table,
            segmentation,
            wrap_markers: false,
        }
    }

    /// Surrounds every encoded sequence with the start/end markers (attention
    /// phone labels, whose input carries no markers of its own).
    pub fn with_markers(mut self, wrap: bool) -> Self {
        self.wrap_markers = wrap;
        self
    }

    pub fn segmentation(&self) -> Segmentation {
        self.segmentation
    }

    /// Splits `label` into the tokens that will be looked up.
    pub fn tokenize(&self, label: &str) -> Vec<String> {
        let mut tokens = match self.segmentation {
            Segmentation::Plain => label.chars().map(|c| c.to_string()).collect(),
            Segmentation::GreedyPair => self.greedy_pairs(label),
            Segmentation::CapitalDoubleLetter => self.capital_words(label),
            Segmentation::Phone => label.split(' ').map(str::to_string).collect(),
        };

        if self.wrap_markers {
            tokens.insert(0, SOS.to_string());
            tokens.push(EOS.to_string());
        }
        tokens
    }

    pub fn encode(&self, label: &str) -> Result<Vec<usize>> {
        self.tokenize(label)
            .iter()
            .map(|token| {
                self.table
                    .index_of(token)
                    .ok_or_else(|| LabelError::unknown_symbol(token.as_str(), label))
            })
            .collect()
    }

    /// Encodes an already tokenized sequence (e.g. collapsed phones).
    pub fn encode_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<usize>> {
        let joined = tokens
            .iter()
            .map(|t| t.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        let mut indices = Vec::with_capacity(tokens.len() + 2);
        if self.wrap_markers {
            indices.push(self.lookup(&SOS.to_string(), &joined)?);
        }
        for token in tokens {
            indices.push(self.lookup(token.as_ref(), &joined)?);
        }
        if self.wrap_markers {
            indices.push(self.lookup(&EOS.to_string(), &joined)?);
        }
        Ok(indices)
    }

    /// Maps indices back to their tokens.
    pub fn decode(&self, indices: &[usize]) -> Result<Vec<String>> {
        Ok(self
            .table
            .decode(indices)?
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    fn lookup(&self, token: &str, label: &str) -> Result<usize> {
        self.table
            .index_of(token)
            .ok_or_else(|| LabelError::unknown_symbol(token, label))
    }

    fn greedy_pairs(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::with_capacity(chars.len());
        let mut i = 0;
        while i < chars.len() {
            if i + 1 < chars.len() {
                let pair: String = chars[i..i + 2].iter().collect();
                if self.table.contains(&pair) {
                    tokens.push(pair);
                    i += 2;
                    continue;
                }
            }
            tokens.push(chars[i].to_string());
            i += 1;
        }
        tokens
    }

    fn capital_words(&self, label: &str) -> Vec<String> {
        let mut tokens = Vec::new();

        let (body, has_sos) = match label.strip_prefix(SOS) {
            Some(rest) => (rest, true),
            None => (label, false),
        };
        let (body, has_eos) = match body.strip_suffix(EOS) {
            Some(rest) => (rest, true),
            None => (body, false),
        };

        if has_sos {
            tokens.push(SOS.to_string());
        }
        for word in body.split(SEPARATOR).filter(|w| !w.is_empty()) {
            let chars: Vec<char> = word.chars().collect();
            tokens.push(chars[0].to_uppercase().collect());

            // one token of lookahead, no backtracking: "lll" -> "ll" + "l"
            let mut i = 1;
            while i < chars.len() {
                if i + 1 < chars.len() && chars[i] == chars[i + 1] {
                    let pair: String = chars[i..i + 2].iter().collect();
                    if self.table.contains(&pair) {
                        tokens.push(pair);
                        i += 2;
                        continue;
                    }
                }
                tokens.push(chars[i].to_string());
                i += 1;
            }
        }
        if has_eos {
            tokens.push(EOS.to_string());
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[&str]) -> SymbolTable {
        SymbolTable::from_symbols(entries.iter().copied()).unwrap()
    }

    #[test]
    fn test_plain() {
        let t = table(&["_", "a", "b"]);
        let enc = SequenceEncoder::new(&t, Segmentation::Plain);
        assert_eq!(enc.encode("_ab_").unwrap(), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_capital_without_fusion() {
        // C=0 A=1 T=2, TT=3 stands in for the high double-letter entry
        let t = table(&["C", "A", "T", "TT"]);
        let enc = SequenceEncoder::new(&t, Segmentation::CapitalDoubleLetter);
        assert_eq!(enc.encode("CAT").unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_capital_with_fusion() {
        let t = table(&["B", "A", "L", "LL"]);
        let enc = SequenceEncoder::new(&t, Segmentation::CapitalDoubleLetter);
        assert_eq!(enc.encode("BALL").unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn test_capital_triple_letter_is_one_pair_plus_single() {
        let t = table(&["B", "z", "zz"]);
        let enc = SequenceEncoder::new(&t, Segmentation::CapitalDoubleLetter);
        assert_eq!(enc.tokenize("bzzz"), vec!["B", "zz", "z"]);
        assert_eq!(enc.encode("bzzz").unwrap(), vec![0, 2, 1]);
    }

    #[test]
    fn test_capital_words_and_markers() {
        let t = table(&["<", ">", "S", "H", "e", "a", "d", "h"]);
        let enc = SequenceEncoder::new(&t, Segmentation::CapitalDoubleLetter);
        assert_eq!(enc.tokenize("<she_had>"), vec!["<", "S", "h", "e", "H", "a", "d", ">"]);
        assert_eq!(enc.encode("<she_had>").unwrap(), vec![0, 2, 7, 4, 3, 5, 6, 1]);
    }

    #[test]
    fn test_capital_pair_missing_from_table_falls_back() {
        let t = table(&["B", "o", "k"]);
        let enc = SequenceEncoder::new(&t, Segmentation::CapitalDoubleLetter);
        assert_eq!(enc.encode("book").unwrap(), vec![0, 1, 1, 2]);
    }

    #[test]
    fn test_greedy_pair() {
        let t = table(&["_", "NZ", "キ", "キャ", "ャ", "ア"]);
        let enc = SequenceEncoder::new(&t, Segmentation::GreedyPair);
        assert_eq!(enc.tokenize("_キャアNZ_"), vec!["_", "キャ", "ア", "NZ", "_"]);
        assert_eq!(enc.encode("_キャアNZ_").unwrap(), vec![0, 3, 5, 1, 0]);
    }

    #[test]
    fn test_phone_with_markers() {
        let t = table(&["<", ">", "aa", "b", "sil"]);
        let enc = SequenceEncoder::new(&t, Segmentation::Phone).with_markers(true);
        let indices = enc.encode("sil b aa sil").unwrap();
        assert_eq!(indices, vec![0, 4, 3, 2, 4, 1]);
        assert_eq!(indices.len(), 4 + 2);
        assert_eq!(enc.encode_tokens(&["b", "aa"]).unwrap(), vec![0, 3, 2, 1]);
    }

    #[test]
    fn test_unknown_symbol_is_named() {
        let t = table(&["a"]);
        let enc = SequenceEncoder::new(&t, Segmentation::Plain);
        match enc.encode("ab") {
            Err(LabelError::UnknownSymbol { symbol, label }) => {
                assert_eq!(symbol, "b");
                assert_eq!(label, "ab");
            }
            other => panic!("expected UnknownSymbol, got {other:?}"),
        }
    }

    #[test]
    fn test_length_matches_token_count() {
        let t = table(&["_", "h", "e", "l", "ll", "o", "H"]);
        for (seg, label) in [
            (Segmentation::Plain, "_hello_"),
            (Segmentation::GreedyPair, "_hello_"),
            (Segmentation::CapitalDoubleLetter, "hello_hello"),
        ] {
            let enc = SequenceEncoder::new(&t, seg);
            assert_eq!(enc.encode(label).unwrap().len(), enc.tokenize(label).len());
        }
    }

    #[test]
    fn test_decode_round_trip() {
        let t = table(&["_", "NZ", "キ", "キャ", "ア"]);
        let enc = SequenceEncoder::new(&t, Segmentation::GreedyPair);
        let label = "_キャキアNZ_";
        let decoded = enc.decode(&enc.encode(label).unwrap()).unwrap();
        assert_eq!(decoded, enc.tokenize(label));
        assert_eq!(decoded.concat(), label);
        assert!(matches!(
            enc.decode(&[99]),
            Err(LabelError::UnknownIndex { index: 99 })
        ));
    }
}
