//! Known-safe site registry
//!
//! A static table of trusted registered domains. Lookups are exact: callers
//! normalize hostnames first (see [`crate::domain::Domain`]). The table is
//! validated once at construction and never mutated afterwards.

use std::collections::btree_map::{BTreeMap, Entry};

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::types::SiteRecord;

/// Error type for registry construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Duplicate domain: {0}")]
    Duplicate(String),
    #[error("Domain key '{domain}' is not normalized (expected '{expected}')")]
    NotNormalized { domain: String, expected: String },
    #[error("Invalid domain key '{0}'")]
    InvalidKey(String),
    #[error("Site '{0}' has an empty name")]
    EmptyName(String),
    #[error("Site '{0}' has an empty category")]
    EmptyCategory(String),
}

/// One registry row as written in configuration: the domain key plus the
/// record fields (`n`, `c`, `t`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteEntry {
    pub domain: String,
    #[serde(flatten)]
    pub record: SiteRecord,
}

impl SiteEntry {
    pub fn new(domain: impl Into<String>, record: SiteRecord) -> Self {
        Self {
            domain: domain.into(),
            record,
        }
    }
}

/// Immutable mapping from normalized domain to site metadata.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    sites: BTreeMap<String, SiteRecord>,
}

impl Registry {
    /// Build a registry, enforcing that keys are normalized and unique.
    pub fn from_entries<I>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = SiteEntry>,
    {
        let mut sites = BTreeMap::new();

        for SiteEntry { domain, record } in entries {
            let normalized = Domain::parse(&domain).map_err(|_| RegistryError::InvalidKey(domain.clone()))?;
            if normalized.as_str() != domain {
                return Err(RegistryError::NotNormalized {
                    domain,
                    expected: normalized.into_string(),
                });
            }
            if record.name.trim().is_empty() {
                return Err(RegistryError::EmptyName(domain));
            }
            if record.category.trim().is_empty() {
                return Err(RegistryError::EmptyCategory(domain));
            }

            match sites.entry(domain) {
                Entry::Occupied(slot) => return Err(RegistryError::Duplicate(slot.key().clone())),
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
            }
        }

        Ok(Self { sites })
    }

    /// Exact-match lookup. No normalization is performed.
    #[inline]
    pub fn lookup(&self, domain: &str) -> Option<&SiteRecord> {
        self.sites.get(domain)
    }

    /// Exact-match lookup returning the stored key alongside the record.
    #[inline]
    pub fn lookup_entry(&self, domain: &str) -> Option<(&str, &SiteRecord)> {
        self.sites.get_key_value(domain).map(|(k, v)| (k.as_str(), v))
    }

    pub fn all(&self) -> &BTreeMap<String, SiteRecord> {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Distinct categories with the number of sites in each.
    pub fn categories(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for record in self.sites.values() {
            *counts.entry(record.category.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn category_count(&self) -> usize {
        self.categories().len()
    }

    /// Case-insensitive search over domain, name, category and tags,
    /// sorted by display name. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<(&str, &SiteRecord)> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<(&str, &SiteRecord)> = self
            .sites
            .iter()
            .filter(|(domain, record)| domain.contains(&needle) || record.mentions(&needle))
            .map(|(domain, record)| (domain.as_str(), record))
            .collect();

        results.sort_by(|a, b| {
            a.1.name
                .to_lowercase()
                .cmp(&b.1.name.to_lowercase())
                .then_with(|| a.0.cmp(b.0))
        });
        results
    }

    /// Rows in configuration form, ordered by domain.
    pub fn entries(&self) -> Vec<SiteEntry> {
        self.sites
            .iter()
            .map(|(domain, record)| SiteEntry::new(domain.clone(), record.clone()))
            .collect()
    }
}
