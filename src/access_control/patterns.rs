//! Pattern matching for protected refs
//!
//! A protected ref name is either a literal ref name or a wildcard where every
//! `*` matches any run of characters, `/` included. Wildcards are compiled to
//! an anchored regex once, when the protected ref is built.

use regex::Regex;
use std::fmt;
use tracing::warn;

pub const WILDCARD: char = '*';

/// Check whether `ref_name` matches `pattern`
///
/// Compiles the pattern on every call; prefer [`RefPattern`] when matching
/// the same pattern repeatedly.
pub fn matches(pattern: &str, ref_name: &str) -> bool {
    RefPattern::new(pattern).matches(ref_name)
}

/// Compiled protected ref pattern
#[derive(Clone)]
pub struct RefPattern {
    source: String,
    matcher: Matcher,
}

#[derive(Clone)]
enum Matcher {
    Exact,
    Wildcard(Regex),
    Never,
}

impl RefPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        let source = pattern.into();
        let matcher = Self::compile(&source);
        Self { source, matcher }
    }

    fn compile(source: &str) -> Matcher {
        if source.is_empty() {
            return Matcher::Never;
        }
        if !source.contains(WILDCARD) {
            return Matcher::Exact;
        }

        let body = source
            .split(WILDCARD)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        match Regex::new(&format!("^{}$", body)) {
            Ok(regex) => Matcher::Wildcard(regex),
            Err(e) => {
                warn!(pattern = source, error = %e, "Protected ref pattern never matches");
                Matcher::Never
            }
        }
    }

    /// Check if a concrete ref name matches this pattern
    pub fn matches(&self, ref_name: &str) -> bool {
        match &self.matcher {
            Matcher::Exact => self.source == ref_name,
            Matcher::Wildcard(regex) => regex.is_match(ref_name),
            Matcher::Never => false,
        }
    }

    /// Candidate names this pattern matches, in input order
    pub fn matching<'a, I>(&self, ref_names: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ref_names
            .into_iter()
            .filter(|name| self.matches(name))
            .collect()
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.matcher, Matcher::Wildcard(_))
    }

    /// Patterns that can never match anything (currently only the empty pattern)
    pub fn is_never(&self) -> bool {
        matches!(self.matcher, Matcher::Never)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for RefPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefPattern").field(&self.source).finish()
    }
}

impl fmt::Display for RefPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for RefPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for RefPattern {}
