//! TIMIT phone sets and the 61 → 48 → 39 collapse table.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::info;

use crate::error::{LabelError, Result};

/// Marks a phone with no counterpart in the reduced sets.
const DROPPED: &str = "nan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhoneSet {
    Phone61,
    Phone48,
    Phone39,
}

impl PhoneSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneSet::Phone61 => "phone61",
            PhoneSet::Phone48 => "phone48",
            PhoneSet::Phone39 => "phone39",
        }
    }
}

impl fmt::Display for PhoneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhoneSet {
    type Err = LabelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "phone61" => Ok(PhoneSet::Phone61),
            "phone48" => Ok(PhoneSet::Phone48),
            "phone39" => Ok(PhoneSet::Phone39),
            other => Err(LabelError::UnknownSelector {
                kind: "phone set",
                value: other.to_string(),
                expected: "phone61, phone48, phone39",
            }),
        }
    }
}

/// Reduced forms of one 61-set phone; `None` where the phone is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reduced {
    phone48: Option<String>,
    phone39: Option<String>,
}

/// Collapse table read from `phone61 phone48 phone39` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneMap {
    rows: HashMap<String, Reduced>,
}

impl PhoneMap {
    pub fn parse(contents: &str) -> Result<Self> {
        let mut rows = HashMap::new();
        for (line_no, line) in contents.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != 3 {
                return Err(LabelError::MalformedTable {
                    line: line_no + 1,
                    content: line.to_string(),
                });
            }
            let keep = |phone: &str| (phone != DROPPED).then(|| phone.to_string());
            let reduced = Reduced {
                phone48: keep(fields[1]),
                phone39: keep(fields[2]),
            };
            if rows.insert(fields[0].to_string(), reduced).is_some() {
                return Err(LabelError::DuplicateSymbol {
                    symbol: fields[0].to_string(),
                });
            }
        }
        Ok(Self { rows })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LabelError::io(format!("reading phone map '{}'", path.display()), e))?;
        let map = Self::parse(&contents)?;
        info!(path = %path.display(), phones = map.rows.len(), "Loaded phone map");
        Ok(map)
    }

    fn target<'a>(&'a self, phone: &'a str, reduced: &'a Reduced, set: PhoneSet) -> Option<&'a str> {
        match set {
            PhoneSet::Phone61 => Some(phone),
            PhoneSet::Phone48 => reduced.phone48.as_deref(),
            PhoneSet::Phone39 => reduced.phone39.as_deref(),
        }
    }

    /// Maps a 61-set phone sequence onto `set`, dropping phones without a
    /// counterpart there.
    pub fn collapse<S: AsRef<str>>(&self, phones: &[S], set: PhoneSet) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(phones.len());
        for phone in phones {
            let phone = phone.as_ref();
            let reduced = self.rows.get(phone).ok_or_else(|| LabelError::UnknownSymbol {
                symbol: phone.to_string(),
                label: phones.iter().map(|p| p.as_ref()).collect::<Vec<_>>().join(" "),
            })?;
            if let Some(target) = self.target(phone, reduced, set) {
                out.push(target.to_string());
            }
        }
        Ok(out)
    }

    /// Symbols of `set`.
    pub fn inventory(&self, set: PhoneSet) -> BTreeSet<String> {
        self.rows
            .iter()
            .filter_map(|(phone, reduced)| self.target(phone, reduced, set))
            .map(str::to_string)
            .collect()
    }
}
