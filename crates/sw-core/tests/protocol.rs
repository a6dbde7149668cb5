use serde_json::{json, Value};

use sw_core::{EngineConfig, PatternSpec, Reason, Request, Router, SafetyStatus, SiteEntry, SiteRecord};

fn bundled() -> Router {
    Router::bundled().unwrap()
}

fn send(router: &Router, message: Value) -> Value {
    let text = router.handle_json(&message.to_string());
    serde_json::from_str(&text).unwrap()
}

/// 58 sites spread over 20 categories, 18 patterns.
fn sized_config() -> EngineConfig {
    let sites = (0..58)
        .map(|i| SiteEntry::new(format!("site{i}.example"), SiteRecord::new(format!("Site {i}"), format!("Category {}", i % 20))))
        .collect();
    let patterns = (0..18).map(|i| PatternSpec::Substring(format!("-bait{i}."))).collect();
    EngineConfig {
        version: "test".into(),
        description: String::new(),
        sites,
        patterns,
    }
}

#[test]
fn test_youtube_is_verified() {
    let value = send(&bundled(), json!({"action": "checkDomain", "domain": "youtube.com"}));
    assert_eq!(
        value,
        json!({
            "success": true,
            "result": {
                "safe": "safe",
                "reason": "verified safe site",
                "details": {"n": "YouTube", "c": "Видео", "t": ["видео", "стриминг", "развлечение"]}
            }
        })
    );
}

#[test]
fn test_subdomain_of_youtube() {
    let value = send(&bundled(), json!({"action": "checkDomain", "domain": "mail.youtube.com"}));
    assert_eq!(value["result"]["safe"], "safe");
    assert_eq!(value["result"]["reason"], "subdomain of verified safe site");
    assert_eq!(value["result"]["details"]["n"], "YouTube");
}

#[test]
fn test_google_verify_is_phishing() {
    let value = send(&bundled(), json!({"action": "checkDomain", "domain": "google-verify.com"}));
    assert_eq!(value["result"]["safe"], "not-safe");
    assert_eq!(value["result"]["reason"], "phishing pattern detected");
    assert_eq!(value["result"]["details"], json!({"type": "phishing", "pattern": "google-verify"}));
}

#[test]
fn test_unlisted_site_is_unknown() {
    let value = send(
        &bundled(),
        json!({"action": "checkDomain", "domain": "some-random-unlisted-site.xyz"}),
    );
    assert_eq!(value["result"]["safe"], "unknown");
    assert!(value["result"]["details"].is_null());
}

#[test]
fn test_stats_for_sized_registry() {
    let router = Router::from_config(&sized_config()).unwrap();
    let value = send(&router, json!({"action": "getStats"}));
    assert_eq!(
        value,
        json!({
            "success": true,
            "stats": {"totalSafe": 58, "totalCategories": 20, "totalPatterns": 18, "cacheSize": 0}
        })
    );
}

#[test]
fn test_get_all_sites_shape() {
    let router = bundled();
    send(&router, json!({"action": "checkDomain", "domain": "github.com"}));
    let value = send(&router, json!({"action": "getAllSites"}));
    assert_eq!(value["success"], true);
    assert_eq!(value["totalSites"], 53);
    assert_eq!(value["cacheSize"], 1);
    assert_eq!(value["sites"]["github.com"]["n"], "GitHub");
    assert_eq!(value["patterns"][0], "rnicrosoft");
    assert_eq!(value["patterns"].as_array().unwrap().len(), 17);
}

#[test]
fn test_every_registered_domain_is_safe() {
    let router = bundled();
    let registry = router.classifier().registry();
    for (domain, record) in registry.all() {
        let result = router.check_domain(domain);
        assert_eq!(result.reason(), Reason::VerifiedSafe, "{domain}");
        assert_eq!(result.matched_record(), Some(record));
    }
}

#[test]
fn test_every_single_label_prefix_inherits() {
    let router = bundled();
    let classifier = router.classifier();
    for (domain, record) in classifier.registry().all() {
        for prefix in ["m", "cdn", "login2"] {
            let host = format!("{prefix}.{domain}");
            if classifier.patterns().matches_any(&host).is_some() {
                continue;
            }
            let result = classifier.classify(&host);
            assert_eq!(result.status(), SafetyStatus::Safe, "{host}");
            if classifier.registry().lookup(&host).is_none() {
                assert_eq!(result.reason(), Reason::SafeSubdomain, "{host}");
            }
            // Registered subdomains (drive.google.com) win over their parents
            if result.matched_domain() == Some(domain.as_str()) {
                assert_eq!(result.matched_record(), Some(record));
            }
        }
    }
}

#[test]
fn test_pattern_beats_colliding_registry_entry() {
    let mut config = sized_config();
    config.sites.push(SiteEntry::new("acme-verify.example", SiteRecord::new("Acme", "Category 0")));
    config.patterns.push(PatternSpec::Substring("-verify.".into()));
    let router = Router::from_config(&config).unwrap();

    let result = router.check_domain("acme-verify.example");
    assert_eq!(result.status(), SafetyStatus::NotSafe);
    assert!(result.matched_record().is_none());
    assert_eq!(result.matched_pattern().unwrap().as_str(), "-verify.");
}

#[test]
fn test_normalization_idempotence() {
    let router = bundled();
    let classifier = router.classifier();
    assert_eq!(classifier.classify("WWW.GOOGLE.COM"), classifier.classify("google.com"));

    for raw in ["WWW.YouTube.com", "Mail.Google.COM.", "unlisted.XYZ", "googie.com"] {
        let first = classifier.classify(raw);
        let normalized = first.normalized().unwrap().to_string();
        let second = classifier.classify(&normalized);
        assert_eq!(first, second, "{raw}");
        assert_eq!(second.normalized(), Some(normalized.as_str()));
    }
}

#[test]
fn test_repeat_check_hits_cache() {
    let router = bundled();
    let message = json!({"action": "checkDomain", "domain": "mail.youtube.com"});

    let first = send(&router, message.clone());
    let misses_after_first = router.cache_stats().misses;
    let second = send(&router, message);
    let stats = router.cache_stats();

    assert_eq!(first, second);
    assert_eq!(stats.misses, misses_after_first);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
}

#[test]
fn test_raw_keys_are_cached_separately() {
    let router = bundled();
    send(&router, json!({"action": "checkDomain", "domain": "google.com"}));
    send(&router, json!({"action": "checkDomain", "domain": "WWW.GOOGLE.COM"}));
    let value = send(&router, json!({"action": "getStats"}));
    assert_eq!(value["stats"]["cacheSize"], 2);
}

#[test]
fn test_clear_cache_then_stats() {
    let router = bundled();
    for domain in ["a.com", "b.com", "youtube.com"] {
        send(&router, json!({"action": "checkDomain", "domain": domain}));
    }
    assert_eq!(send(&router, json!({"action": "clearCache"})), json!({"success": true}));
    let value = send(&router, json!({"action": "getStats"}));
    assert_eq!(value["stats"]["cacheSize"], 0);
}

#[test]
fn test_unparseable_domain_still_succeeds() {
    let value = send(&bundled(), json!({"action": "checkDomain", "domain": ""}));
    assert_eq!(value["success"], true);
    assert_eq!(value["result"]["safe"], "unknown");
    assert_eq!(value["result"]["reason"], "unparseable domain");
}

#[test]
fn test_unknown_and_invalid_requests() {
    let router = bundled();
    assert_eq!(
        send(&router, json!({"action": "getSettings"})),
        json!({"success": false, "error": "unknown action"})
    );
    assert_eq!(send(&router, json!({})), json!({"success": false, "error": "unknown action"}));

    let value = send(&router, json!({"action": "checkDomain", "domain": 42}));
    assert_eq!(value["success"], false);
    assert!(value["error"].as_str().unwrap().starts_with("invalid request"));
}

#[test]
fn test_search_sites() {
    let value = send(&bundled(), json!({"action": "searchSites", "query": "google"}));
    assert_eq!(value["success"], true);
    assert_eq!(value["query"], "google");
    let domains: Vec<&str> = value["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["domain"].as_str().unwrap())
        .collect();
    assert_eq!(domains, vec!["google.com", "drive.google.com", "maps.google.com"]);
    assert_eq!(value["total"], 3);
}

#[test]
fn test_concurrent_checks_compute_once_per_key() {
    let router = bundled();
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for domain in ["youtube.com", "mail.youtube.com", "unknown.xyz"] {
                    router.handle(Request::CheckDomain { domain: domain.into() });
                }
            });
        }
    });
    let stats = router.cache_stats();
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.hits, 21);
    assert_eq!(stats.entries, 3);
}

#[test]
fn test_check_url_classifies_the_host_the_browser_visits() {
    let router = bundled();
    for url in ["https://evil.example\\@google.com/", "https://google.com@evil.example/login"] {
        let value = send(&router, json!({"action": "checkUrl", "url": url}));
        assert_eq!(value["success"], true, "{url}");
        assert_eq!(value["result"]["safe"], "unknown", "{url}");
        assert!(value["result"]["details"].is_null(), "{url}");
        assert_eq!(router.check_url(url).unwrap().normalized(), Some("evil.example"));
    }
    assert_eq!(router.cache_stats().entries, 1);
}
