// LogWatch - core/matcher.rs
//
// Line match predicate: plain substring containment, optionally
// case-insensitive. Core layer: pure logic, no I/O.

use crate::util::error::ConfigError;

/// Substring predicate applied to every complete line a tailer reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    /// Term as supplied by the user.
    term: String,
    /// Lower-cased term, present only in case-insensitive mode.
    folded: Option<String>,
}

impl Matcher {
    /// Build a matcher for `term`. An empty term is rejected: it would match
    /// every line.
    pub fn new(term: &str, ignore_case: bool) -> Result<Self, ConfigError> {
        if term.is_empty() {
            return Err(ConfigError::MissingTerm);
        }
        Ok(Self {
            term: term.to_string(),
            folded: ignore_case.then(|| term.to_lowercase()),
        })
    }

    /// The search term as supplied.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn ignores_case(&self) -> bool {
        self.folded.is_some()
    }

    /// Returns true if the search term occurs anywhere in `line`.
    pub fn matches(&self, line: &str) -> bool {
        match &self.folded {
            Some(folded) => line.to_lowercase().contains(folded.as_str()),
            None => line.contains(self.term.as_str()),
        }
    }
}
