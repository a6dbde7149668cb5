//! Core type definitions for SafeWeb
//!
//! These types map directly to the extension message protocol and
//! are used throughout the classification engine.

use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;

use crate::patterns::PatternEntry;

// =============================================================================
// Site Records
// =============================================================================

/// Metadata for one known-safe registered domain.
///
/// Field names on the wire are the short keys the extension front-ends read
/// (`n`, `c`, `t`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct SiteRecord {
    /// Display name
    #[serde(rename = "n")]
    pub name: String,
    /// Category label
    #[serde(rename = "c")]
    pub category: String,
    /// Free-text tags, in display order
    #[serde(rename = "t", default)]
    pub tags: Vec<String>,
}

impl SiteRecord {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive match against name, category or any tag.
    /// `needle` must already be lowercase.
    pub fn mentions(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.category.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

// =============================================================================
// Verdicts
// =============================================================================

/// The three possible classification verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
pub enum SafetyStatus {
    #[serde(rename = "safe")]
    Safe,
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "not-safe")]
    NotSafe,
}

impl SafetyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyStatus::Safe => "safe",
            SafetyStatus::Unknown => "unknown",
            SafetyStatus::NotSafe => "not-safe",
        }
    }
}

impl fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Why a verdict was reached. Each reason belongs to exactly one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    UnparseableDomain,
    PhishingPattern,
    VerifiedSafe,
    SafeSubdomain,
    NotListed,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::UnparseableDomain => "unparseable domain",
            Reason::PhishingPattern => "phishing pattern detected",
            Reason::VerifiedSafe => "verified safe site",
            Reason::SafeSubdomain => "subdomain of verified safe site",
            Reason::NotListed => "not in registry, no patterns matched",
        }
    }

    pub fn status(&self) -> SafetyStatus {
        match self {
            Reason::VerifiedSafe | Reason::SafeSubdomain => SafetyStatus::Safe,
            Reason::PhishingPattern => SafetyStatus::NotSafe,
            Reason::UnparseableDomain | Reason::NotListed => SafetyStatus::Unknown,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// =============================================================================
// Classification Result
// =============================================================================

/// The evidence behind a decisive verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum Evidence {
    /// Registry record that produced a SAFE verdict, with the key it was found under.
    Site { domain: String, record: SiteRecord },
    /// Pattern that produced a NOT_SAFE verdict.
    Pattern(PatternEntry),
}

/// Output of classifying one hostname.
///
/// Constructed only through [`ClassificationResult::safe`],
/// [`ClassificationResult::not_safe`] and [`ClassificationResult::unknown`],
/// so evidence is always consistent with the status.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    reason: Reason,
    evidence: Option<Evidence>,
    normalized: Option<String>,
}

impl ClassificationResult {
    /// SAFE verdict backed by the registry entry at `matched_domain`.
    /// `reason` must be one of the SAFE reasons; anything else is treated as
    /// an exact match.
    pub fn safe(
        normalized: impl Into<String>,
        matched_domain: impl Into<String>,
        record: SiteRecord,
        reason: Reason,
    ) -> Self {
        let reason = match reason {
            Reason::SafeSubdomain => Reason::SafeSubdomain,
            _ => Reason::VerifiedSafe,
        };
        Self {
            reason,
            evidence: Some(Evidence::Site {
                domain: matched_domain.into(),
                record,
            }),
            normalized: Some(normalized.into()),
        }
    }

    pub fn not_safe(normalized: impl Into<String>, pattern: PatternEntry) -> Self {
        Self {
            reason: Reason::PhishingPattern,
            evidence: Some(Evidence::Pattern(pattern)),
            normalized: Some(normalized.into()),
        }
    }

    pub fn unknown(normalized: impl Into<String>) -> Self {
        Self {
            reason: Reason::NotListed,
            evidence: None,
            normalized: Some(normalized.into()),
        }
    }

    pub fn unparseable() -> Self {
        Self {
            reason: Reason::UnparseableDomain,
            evidence: None,
            normalized: None,
        }
    }

    pub fn status(&self) -> SafetyStatus {
        self.reason.status()
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    pub fn is_safe(&self) -> bool {
        self.status() == SafetyStatus::Safe
    }

    /// Registry record behind a SAFE verdict.
    pub fn matched_record(&self) -> Option<&SiteRecord> {
        match &self.evidence {
            Some(Evidence::Site { record, .. }) => Some(record),
            _ => None,
        }
    }

    /// Registry key the record was found under (the parent for subdomains).
    pub fn matched_domain(&self) -> Option<&str> {
        match &self.evidence {
            Some(Evidence::Site { domain, .. }) => Some(domain),
            _ => None,
        }
    }

    /// Pattern behind a NOT_SAFE verdict.
    pub fn matched_pattern(&self) -> Option<&PatternEntry> {
        match &self.evidence {
            Some(Evidence::Pattern(pattern)) => Some(pattern),
            _ => None,
        }
    }

    /// Normalized hostname that was classified, absent when the input was
    /// unparseable.
    pub fn normalized(&self) -> Option<&str> {
        self.normalized.as_deref()
    }
}

/// `{ safe, reason, details }` where details is the site record, a
/// `{ type, pattern }` object or null.
impl Serialize for ClassificationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct PatternDetails<'a> {
            #[serde(rename = "type")]
            kind: &'static str,
            pattern: &'a str,
        }

        let mut state = serializer.serialize_struct("ClassificationResult", 3)?;
        state.serialize_field("safe", &self.status())?;
        state.serialize_field("reason", self.reason.as_str())?;
        match &self.evidence {
            Some(Evidence::Site { record, .. }) => state.serialize_field("details", record)?,
            Some(Evidence::Pattern(pattern)) => state.serialize_field(
                "details",
                &PatternDetails {
                    kind: "phishing",
                    pattern: pattern.as_str(),
                },
            )?,
            None => state.serialize_field("details", &Option::<()>::None)?,
        }
        state.end()
    }
}
