//! Dangerous hostname patterns
//!
//! An ordered list of substring and regex heuristics that flag
//! phishing-style hostnames. Matching is case-insensitive; registration
//! order only decides which pattern gets reported.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Error type for pattern compilation.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("Empty pattern at index {0}")]
    Empty(usize),
    #[error("Invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// =============================================================================
// Pattern Entry
// =============================================================================

/// A single dangerous-hostname heuristic.
#[derive(Debug, Clone)]
pub enum PatternEntry {
    /// Lowercase substring, e.g. `-verify.`
    Substring(String),
    /// Case-insensitive regular expression
    Regex(Regex),
}

impl PatternEntry {
    pub fn substring(pattern: impl AsRef<str>) -> Self {
        Self::Substring(pattern.as_ref().to_lowercase())
    }

    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Self::Regex)
            .map_err(|source| PatternError::InvalidRegex {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Source text of the pattern, as reported to front-ends.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Substring(s) => s,
            Self::Regex(re) => re.as_str(),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex(_))
    }

    /// Test against an already-lowercased hostname.
    #[inline]
    pub fn is_match(&self, domain: &str) -> bool {
        match self {
            Self::Substring(s) => domain.contains(s.as_str()),
            Self::Regex(re) => re.is_match(domain),
        }
    }
}

impl PartialEq for PatternEntry {
    fn eq(&self, other: &Self) -> bool {
        self.is_regex() == other.is_regex() && self.as_str() == other.as_str()
    }
}

impl Eq for PatternEntry {}

impl fmt::Display for PatternEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring(s) => f.write_str(s),
            Self::Regex(re) => write!(f, "/{}/i", re.as_str()),
        }
    }
}

// =============================================================================
// Pattern Spec (configuration form)
// =============================================================================

/// How a pattern is written in a registry file: a bare string is a
/// substring, `{"regex": "..."}` is a regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Substring(String),
    Regex { regex: String },
}

impl PatternSpec {
    pub fn compile(&self) -> Result<PatternEntry, PatternError> {
        match self {
            Self::Substring(s) => Ok(PatternEntry::substring(s)),
            Self::Regex { regex } => PatternEntry::regex(regex),
        }
    }
}

impl From<&PatternEntry> for PatternSpec {
    fn from(entry: &PatternEntry) -> Self {
        match entry {
            PatternEntry::Substring(s) => Self::Substring(s.clone()),
            PatternEntry::Regex(re) => Self::Regex {
                regex: re.as_str().to_string(),
            },
        }
    }
}

// =============================================================================
// Pattern Set
// =============================================================================

/// Ordered set of dangerous patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    entries: Vec<PatternEntry>,
}

impl PatternSet {
    pub fn new(entries: Vec<PatternEntry>) -> Self {
        Self { entries }
    }

    /// Compile configuration specs in order. Empty patterns are rejected
    /// since they would match every hostname.
    pub fn from_specs(specs: &[PatternSpec]) -> Result<Self, PatternError> {
        let mut entries = Vec::with_capacity(specs.len());
        for (idx, spec) in specs.iter().enumerate() {
            let entry = spec.compile()?;
            if entry.as_str().is_empty() {
                return Err(PatternError::Empty(idx));
            }
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    /// First pattern, in registration order, that matches `domain`.
    pub fn matches_any(&self, domain: &str) -> Option<&PatternEntry> {
        let domain = domain.to_lowercase();
        self.entries.iter().find(|entry| entry.is_match(&domain))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternEntry> {
        self.entries.iter()
    }

    /// Serializable form: pattern sources in registration order.
    pub fn sources(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.as_str().to_string()).collect()
    }

    pub fn specs(&self) -> Vec<PatternSpec> {
        self.entries.iter().map(PatternSpec::from).collect()
    }
}
