//! SafeWeb Core Library
//!
//! This crate provides the domain classification engine for the SafeWeb
//! browser extension. It decides whether a hostname is SAFE, UNKNOWN or
//! NOT-SAFE using a static allow-list and phishing-pattern heuristics.
//!
//! # Architecture
//!
//! Front-ends (link hover, search-result scan, popup) send messages to a
//! single [`Router`]. The router consults the [`ResultCache`]; on a miss it
//! asks the [`Classifier`], which checks the [`PatternSet`] first and then
//! the [`Registry`] (exact key, then parent domains). Everything is local
//! and synchronous.
//!
//! # Modules
//!
//! - `domain`: hostname normalization, parent-domain walk, URL host extraction
//! - `registry`: known-safe site table
//! - `patterns`: dangerous hostname heuristics
//! - `classifier`: the verdict function
//! - `cache`: per-raw-string result memo
//! - `router`: message protocol and dispatch
//! - `config`: registry file loading and validation
//! - `types`: shared type definitions

pub mod cache;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod patterns;
pub mod registry;
pub mod router;
pub mod types;

// Re-export commonly used types
pub use cache::{CacheStats, ResultCache};
pub use classifier::Classifier;
pub use config::{ConfigError, EngineConfig};
pub use domain::{extract_host, Domain, DomainError};
pub use patterns::{PatternEntry, PatternSet, PatternSpec};
pub use registry::{Registry, SiteEntry};
pub use router::{Request, Response, Router, RouterError, Stats};
pub use types::{ClassificationResult, Reason, SafetyStatus, SiteRecord};
