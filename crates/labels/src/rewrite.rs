//! Ordered regex rewrite rules with bounded fixed-point iteration.
//!
//! Annotation markup in corpus transcripts nests and chains (`[lem[guini]-/linguini]`),
//! so several rules have to be re-applied until the text stops matching. Every
//! fixed-point rule runs under an explicit pass limit and fails fast when a pass
//! matches without changing anything.

use regex::{Captures, Regex};

use crate::error::CleanError;

/// How a rule rewrites each match.
pub enum Replacement {
    /// Regex replacement template (`${1}` style group references).
    Template(&'static str),
    /// Computed replacement for rules that need to inspect the captures.
    With(fn(&Captures<'_>) -> String),
}

pub struct RewriteRule {
    name: &'static str,
    pattern: Regex,
    replacement: Replacement,
    fixed_point: bool,
}

impl RewriteRule {
    /// A rule applied once (all non-overlapping matches, single pass).
    pub fn once(name: &'static str, pattern: &str, replacement: Replacement) -> Self {
        Self::build(name, pattern, replacement, false)
    }

    /// A rule re-applied until the pattern no longer matches.
    pub fn fixed_point(name: &'static str, pattern: &str, replacement: Replacement) -> Self {
        Self::build(name, pattern, replacement, true)
    }

    fn build(name: &'static str, pattern: &str, replacement: Replacement, fixed_point: bool) -> Self {
        // Patterns are compile-time literals; a bad one is caught by the rule-set tests.
        let pattern = Regex::new(pattern).unwrap_or_else(|e| panic!("rule '{name}': {e}"));
        Self {
            name,
            pattern,
            replacement,
            fixed_point,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn replace(&self, text: &str) -> String {
        match &self.replacement {
            Replacement::Template(template) => {
                self.pattern.replace_all(text, *template).into_owned()
            }
            Replacement::With(f) => self.pattern.replace_all(text, |caps: &Captures<'_>| f(caps)).into_owned(),
        }
    }

    /// Applies the rule to `text`, running at most `max_passes` passes for
    /// fixed-point rules.
    pub fn apply(&self, text: &str, max_passes: usize) -> Result<String, CleanError> {
        if !self.fixed_point {
            return Ok(self.replace(text));
        }

        let mut current = text.to_string();
        for _ in 0..max_passes {
            if !self.pattern.is_match(&current) {
                return Ok(current);
            }
            let next = self.replace(&current);
            if next == current {
                return Err(CleanError::NoProgress { rule: self.name });
            }
            current = next;
        }

        if self.pattern.is_match(&current) {
            Err(CleanError::IterationCap {
                rule: self.name,
                limit: max_passes,
            })
        } else {
            Ok(current)
        }
    }
}

/// Runs `rules` in order over `text`.
pub fn apply_all(rules: &[RewriteRule], text: &str, max_passes: usize) -> Result<String, CleanError> {
    let mut current = text.to_string();
    for rule in rules {
        current = rule.apply(&current, max_passes)?;
    }
    Ok(current)
}

/// Collapses runs of `separator` into a single occurrence.
pub fn collapse_repeats(text: &str, separator: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_was_sep = false;
    for c in text.chars() {
        if c == separator {
            if prev_was_sep {
                continue;
            }
            prev_was_sep = true;
        } else {
            prev_was_sep = false;
        }
        out.push(c);
    }
    out
}
