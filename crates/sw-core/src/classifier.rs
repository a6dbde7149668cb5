//! Domain Classifier
//!
//! Combines the registry and the pattern set into a single verdict. The
//! function is total: every input string produces a result.
//!
//! Rules, first decisive one wins:
//!
//! 1. normalize (failure -> UNKNOWN "unparseable domain")
//! 2. dangerous pattern -> NOT_SAFE
//! 3. exact registry key -> SAFE
//! 4. registry parent (never a bare TLD) -> SAFE
//! 5. otherwise UNKNOWN

use log::debug;

use crate::domain::Domain;
use crate::patterns::PatternSet;
use crate::registry::Registry;
use crate::types::{ClassificationResult, Reason};

/// Pure classification over a registry and a pattern set.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    registry: Registry,
    patterns: PatternSet,
}

impl Classifier {
    pub fn new(registry: Registry, patterns: PatternSet) -> Self {
        Self { registry, patterns }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Classify a raw hostname.
    pub fn classify(&self, raw_domain: &str) -> ClassificationResult {
        let domain = match Domain::parse(raw_domain) {
            Ok(domain) => domain,
            Err(e) => {
                debug!("Unparseable domain {:?}: {}", raw_domain, e);
                return ClassificationResult::unparseable();
            }
        };

        let result = self.classify_domain(&domain);
        debug!("{} -> {} ({})", domain, result.status(), result.reason());
        result
    }

    /// Classify an already-normalized domain.
    pub fn classify_domain(&self, domain: &Domain) -> ClassificationResult {
        let host = domain.as_str();

        // Patterns first: a lookalike must be flagged even if it collides
        // with a registry key
        if let Some(pattern) = self.patterns.matches_any(host) {
            return ClassificationResult::not_safe(host, pattern.clone());
        }

        if let Some((key, record)) = self.registry.lookup_entry(host) {
            return ClassificationResult::safe(host, key, record.clone(), Reason::VerifiedSafe);
        }

        for parent in domain.parents() {
            if let Some((key, record)) = self.registry.lookup_entry(parent) {
                return ClassificationResult::safe(host, key, record.clone(), Reason::SafeSubdomain);
            }
        }

        ClassificationResult::unknown(host)
    }
}
