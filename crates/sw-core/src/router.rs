//! Message router
//!
//! The single entry point front-ends talk to. Every message gets exactly
//! one response; failures are converted into `{success: false, error}` at
//! this boundary and never escape to the transport.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cache::{CacheStats, ResultCache};
use crate::classifier::Classifier;
use crate::config::{ConfigError, EngineConfig};
use crate::domain::extract_host;
use crate::patterns::PatternSpec;
use crate::types::{ClassificationResult, SiteRecord};

/// Error type for request handling.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("unknown action")]
    UnknownAction(Option<String>),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unsupported url")]
    UnsupportedUrl(String),
}

// =============================================================================
// Requests
// =============================================================================

/// A front-end request, tagged by its `action` field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    CheckDomain { domain: String },
    CheckUrl { url: String },
    GetAllSites,
    GetStats,
    ClearCache,
    SearchSites { query: String },
    ExportDatabase,
}

impl Request {
    /// Every action tag the router understands.
    pub const ACTIONS: &'static [&'static str] = &[
        "checkDomain",
        "checkUrl",
        "getAllSites",
        "getStats",
        "clearCache",
        "searchSites",
        "exportDatabase",
    ];

    pub fn action(&self) -> &'static str {
        match self {
            Request::CheckDomain { .. } => "checkDomain",
            Request::CheckUrl { .. } => "checkUrl",
            Request::GetAllSites => "getAllSites",
            Request::GetStats => "getStats",
            Request::ClearCache => "clearCache",
            Request::SearchSites { .. } => "searchSites",
            Request::ExportDatabase => "exportDatabase",
        }
    }

    /// Decode a raw message, separating unknown actions from malformed
    /// payloads of known ones.
    pub fn from_value(message: Value) -> Result<Self, RouterError> {
        let action = message.get("action").and_then(Value::as_str);
        match action {
            Some(action) if Self::ACTIONS.contains(&action) => {}
            other => return Err(RouterError::UnknownAction(other.map(str::to_string))),
        }
        serde_json::from_value(message).map_err(|e| RouterError::InvalidRequest(e.to_string()))
    }
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckDomainResponse {
    pub result: ClassificationResult,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllSitesResponse {
    pub sites: BTreeMap<String, SiteRecord>,
    pub patterns: Vec<String>,
    pub cache_size: usize,
    pub total_sites: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_safe: usize,
    pub total_categories: usize,
    pub total_patterns: usize,
    pub cache_size: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StatsResponse {
    pub stats: Stats,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ClearCacheResponse {}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SearchHit {
    pub domain: String,
    pub site: SiteRecord,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub total: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ExportResponse {
    pub version: String,
    pub description: String,
    pub sites: BTreeMap<String, SiteRecord>,
    pub patterns: Vec<PatternSpec>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One response per request kind, plus the error case.
#[derive(Debug, Clone)]
pub enum Response {
    CheckDomain(CheckDomainResponse),
    AllSites(AllSitesResponse),
    Stats(StatsResponse),
    ClearCache(ClearCacheResponse),
    Search(SearchResponse),
    Export(ExportResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            error: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Response::Error(_))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| json!({"success": false, "error": e.to_string()}).to_string())
    }
}

/// Every response is `{success, ...body}`.
impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Envelope<'a, T: Serialize> {
            success: bool,
            #[serde(flatten)]
            body: &'a T,
        }

        fn envelope<S: Serializer, T: Serialize>(serializer: S, success: bool, body: &T) -> Result<S::Ok, S::Error> {
            Envelope { success, body }.serialize(serializer)
        }

        match self {
            Response::CheckDomain(body) => envelope(serializer, true, body),
            Response::AllSites(body) => envelope(serializer, true, body),
            Response::Stats(body) => envelope(serializer, true, body),
            Response::ClearCache(body) => envelope(serializer, true, body),
            Response::Search(body) => envelope(serializer, true, body),
            Response::Export(body) => envelope(serializer, true, body),
            Response::Error(body) => envelope(serializer, false, body),
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Engine context: classifier plus the process-wide result cache.
///
/// Construct once at startup and share by reference. `handle` takes `&self`,
/// so a router can sit behind an `Arc` and serve several threads.
#[derive(Debug)]
pub struct Router {
    classifier: Classifier,
    cache: ResultCache,
    version: String,
    description: String,
}

impl Router {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            cache: ResultCache::new(),
            version: String::new(),
            description: String::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let mut router = Self::new(config.build()?);
        router.version = config.version.clone();
        router.description = config.description.clone();
        Ok(router)
    }

    /// Router over the registry shipped with the crate.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_config(&EngineConfig::bundled()?)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Handle a typed request. Never fails; errors become error responses.
    pub fn handle(&self, request: Request) -> Response {
        let action = request.action();
        debug!("Handling {}", action);
        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                warn!("{} failed: {}", action, e);
                Response::error(e.to_string())
            }
        }
    }

    /// Handle an untyped JSON message.
    pub fn handle_value(&self, message: Value) -> Response {
        match Request::from_value(message) {
            Ok(request) => self.handle(request),
            Err(e) => {
                match &e {
                    RouterError::UnknownAction(action) => warn!("Rejected unknown action {:?}", action),
                    other => warn!("Rejected request: {}", other),
                }
                Response::error(e.to_string())
            }
        }
    }

    /// Handle a message in JSON text form, returning JSON text.
    pub fn handle_json(&self, message: &str) -> String {
        let response = match serde_json::from_str::<Value>(message) {
            Ok(value) => self.handle_value(value),
            Err(e) => {
                warn!("Rejected malformed message: {}", e);
                Response::error(format!("invalid JSON: {}", e))
            }
        };
        response.to_json()
    }

    fn dispatch(&self, request: Request) -> Result<Response, RouterError> {
        match request {
            Request::CheckDomain { domain } => Ok(Response::CheckDomain(CheckDomainResponse {
                result: self.check_domain(&domain),
            })),
            Request::CheckUrl { url } => Ok(Response::CheckDomain(CheckDomainResponse {
                result: self.check_url(&url)?,
            })),
            Request::GetAllSites => {
                let registry = self.classifier.registry();
                Ok(Response::AllSites(AllSitesResponse {
                    sites: registry.all().clone(),
                    patterns: self.classifier.patterns().sources(),
                    cache_size: self.cache.size(),
                    total_sites: registry.len(),
                }))
            }
            Request::GetStats => Ok(Response::Stats(StatsResponse { stats: self.stats() })),
            Request::ClearCache => {
                self.cache.clear();
                Ok(Response::ClearCache(ClearCacheResponse {}))
            }
            Request::SearchSites { query } => {
                let results: Vec<SearchHit> = self
                    .classifier
                    .registry()
                    .search(&query)
                    .into_iter()
                    .map(|(domain, site)| SearchHit {
                        domain: domain.to_string(),
                        site: site.clone(),
                    })
                    .collect();
                let total = results.len();
                Ok(Response::Search(SearchResponse { query, results, total }))
            }
            Request::ExportDatabase => Ok(Response::Export(ExportResponse {
                version: self.version.clone(),
                description: self.description.clone(),
                sites: self.classifier.registry().all().clone(),
                patterns: self.classifier.patterns().specs(),
            })),
        }
    }

    /// Classify through the cache, keyed on the raw string.
    pub fn check_domain(&self, raw_domain: &str) -> ClassificationResult {
        self.cache
            .get_or_compute(raw_domain, || self.classifier.classify(raw_domain))
    }

    /// Classify the host of an http(s) URL.
    pub fn check_url(&self, url: &str) -> Result<ClassificationResult, RouterError> {
        let host = extract_host(url).ok_or_else(|| RouterError::UnsupportedUrl(url.to_string()))?;
        Ok(self.check_domain(host))
    }

    pub fn stats(&self) -> Stats {
        let registry = self.classifier.registry();
        Stats {
            total_safe: registry.len(),
            total_categories: registry.category_count(),
            total_patterns: self.classifier.patterns().len(),
            cache_size: self.cache.size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn router() -> Router {
        Router::bundled().unwrap()
    }

    #[test]
    fn test_request_decoding() {
        let request = Request::from_value(json!({"action": "checkDomain", "domain": "a.com"})).unwrap();
        assert_eq!(request, Request::CheckDomain { domain: "a.com".into() });
        assert_eq!(request.action(), "checkDomain");

        let request = Request::from_value(json!({"action": "getStats"})).unwrap();
        assert_eq!(request, Request::GetStats);

        assert!(matches!(
            Request::from_value(json!({"action": "getSettings"})),
            Err(RouterError::UnknownAction(Some(_)))
        ));
        assert!(matches!(
            Request::from_value(json!({"domain": "a.com"})),
            Err(RouterError::UnknownAction(None))
        ));
        assert!(matches!(
            Request::from_value(json!({"action": "checkDomain"})),
            Err(RouterError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_actions_table_matches_variants() {
        let samples = [
            Request::CheckDomain { domain: String::new() },
            Request::CheckUrl { url: String::new() },
            Request::GetAllSites,
            Request::GetStats,
            Request::ClearCache,
            Request::SearchSites { query: String::new() },
            Request::ExportDatabase,
        ];
        assert_eq!(samples.len(), Request::ACTIONS.len());
        for request in samples {
            assert!(Request::ACTIONS.contains(&request.action()));
            let encoded = serde_json::to_value(&request).unwrap();
            assert_eq!(encoded["action"], request.action());
        }
    }

    #[test]
    fn test_check_domain_envelope() {
        let response = router().handle(Request::CheckDomain {
            domain: "youtube.com".into(),
        });
        assert!(response.is_success());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["result"]["safe"], "safe");
        assert_eq!(value["result"]["details"]["n"], "YouTube");
    }

    #[test]
    fn test_check_url_uses_host() {
        let r = router();
        let response = r.handle(Request::CheckUrl {
            url: "https://www.youtube.com/watch?v=1".into(),
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["result"]["reason"], "verified safe site");
        assert_eq!(r.cache.get("www.youtube.com").map(|c| c.is_safe()), Some(true));

        let rejected = r.handle(Request::CheckUrl {
            url: "chrome://extensions".into(),
        });
        assert_eq!(
            serde_json::to_value(&rejected).unwrap(),
            json!({"success": false, "error": "unsupported url"})
        );
    }

    #[test]
    fn test_clear_cache_envelope() {
        let r = router();
        r.check_domain("a.com");
        let value = serde_json::to_value(r.handle(Request::ClearCache)).unwrap();
        assert_eq!(value, json!({"success": true}));
        assert_eq!(r.stats().cache_size, 0);
    }

    #[test]
    fn test_unknown_action_message() {
        let text = router().handle_json(r#"{"action":"updateSettings","settings":{}}"#);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"success": false, "error": "unknown action"}));
    }

    #[test]
    fn test_malformed_json_message() {
        let text = router().handle_json("{not json");
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().starts_with("invalid JSON"));
    }

    #[test]
    fn test_search_and_export() {
        let r = router();
        let value = serde_json::to_value(r.handle(Request::SearchSites { query: "Музыка".into() })).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["results"][0]["domain"], "soundcloud.com");
        assert_eq!(value["results"][1]["domain"], "spotify.com");

        let value = serde_json::to_value(r.handle(Request::ExportDatabase)).unwrap();
        assert_eq!(value["version"], "2.0.2");
        assert_eq!(value["sites"].as_object().unwrap().len(), 53);
        assert_eq!(value["patterns"].as_array().unwrap().len(), 17);
    }

    #[test]
    fn test_router_survives_panicking_classification() {
        let r = router();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            r.cache.get_or_compute("boom.com", || panic!("compute failed"));
        }));

        let response = r.handle(Request::CheckDomain {
            domain: "youtube.com".into(),
        });
        assert!(response.is_success());
        let value = serde_json::to_value(r.handle(Request::GetStats)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["stats"]["cacheSize"], 1);
    }
}
