//! Classification result cache
//!
//! Memoizes verdicts per raw input string. Keys are NOT normalized, so
//! `WWW.Google.com` and `google.com` occupy separate entries; the entry
//! count is reported to front-ends as-is.
//!
//! There is no eviction. Entries live until [`ResultCache::clear`].
//!
//! A panic inside a compute closure poisons the lock before anything is
//! inserted, so the map behind a poisoned lock is still consistent and is
//! reused as-is.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::types::ClassificationResult;

/// Hit/miss counters plus the current entry count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Process-wide memo of raw domain string -> verdict.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, ClassificationResult>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ClassificationResult>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Result cache lock was poisoned, recovering");
            self.entries.clear_poison();
            PoisonError::into_inner(poisoned)
        })
    }

    /// Return the cached verdict for `raw_domain`, computing and storing it
    /// on a miss. The lock is held across check, compute and insert so
    /// concurrent callers never classify the same key twice.
    pub fn get_or_compute<F>(&self, raw_domain: &str, compute: F) -> ClassificationResult
    where
        F: FnOnce() -> ClassificationResult,
    {
        let mut entries = self.lock();

        if let Some(hit) = entries.get(raw_domain) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit: {:?}", raw_domain);
            return hit.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss: {:?}", raw_domain);
        let result = compute();
        entries.insert(raw_domain.to_string(), result.clone());
        result
    }

    /// Look up without computing.
    pub fn get(&self, raw_domain: &str) -> Option<ClassificationResult> {
        self.lock().get(raw_domain).cloned()
    }

    /// Drop every entry. Idempotent; counters are kept.
    pub fn clear(&self) {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        info!("Result cache cleared ({} entries)", dropped);
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.size(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn test_second_lookup_is_a_hit() {
        let cache = ResultCache::new();
        let computed = Cell::new(0);
        let compute = || {
            computed.set(computed.get() + 1);
            ClassificationResult::unknown("example.xyz")
        };

        let first = cache.get_or_compute("example.xyz", compute);
        let second = cache.get_or_compute("example.xyz", || {
            computed.set(computed.get() + 1);
            ClassificationResult::unparseable()
        });

        assert_eq!(first, second);
        assert_eq!(computed.get(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn test_keys_are_raw_strings() {
        let cache = ResultCache::new();
        cache.get_or_compute("google.com", || ClassificationResult::unknown("google.com"));
        cache.get_or_compute("WWW.GOOGLE.COM", || ClassificationResult::unknown("google.com"));
        assert_eq!(cache.size(), 2);
        assert!(cache.get("www.google.com").is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let cache = ResultCache::new();
        cache.get_or_compute("a.com", || ClassificationResult::unknown("a.com"));
        cache.clear();
        assert_eq!(cache.size(), 0);
        cache.clear();
        assert_eq!(cache.size(), 0);
        assert!(cache.get("a.com").is_none());
    }

    #[test]
    fn test_panicking_compute_does_not_break_cache() {
        let cache = ResultCache::new();
        cache.get_or_compute("a.com", || ClassificationResult::unknown("a.com"));

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            cache.get_or_compute("boom.com", || panic!("compute failed"));
        }));
        assert!(outcome.is_err());

        assert_eq!(cache.size(), 1);
        assert!(cache.get("boom.com").is_none());
        let result = cache.get_or_compute("b.com", || ClassificationResult::unknown("b.com"));
        assert_eq!(result.normalized(), Some("b.com"));
        assert_eq!(cache.size(), 2);
        cache.clear();
        assert_eq!(cache.size(), 0);
    }
}
