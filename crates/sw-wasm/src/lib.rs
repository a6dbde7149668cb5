//! WebAssembly bindings for SafeWeb
//!
//! The extension service worker constructs one `SafeWebEngine` at startup and
//! forwards every `chrome.runtime.onMessage` request to `handleMessage`.

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::prelude::*;

use sw_core::{Domain, EngineConfig, Router};

// =============================================================================
// Console Logging
// =============================================================================

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[safeweb] {}", record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Warn)
}

/// Route `log` output to the browser console. Safe to call more than once;
/// later calls only change the level.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(parse_level(level));
}

// =============================================================================
// Engine
// =============================================================================

#[wasm_bindgen]
pub struct SafeWebEngine {
    router: Router,
}

#[wasm_bindgen]
impl SafeWebEngine {
    /// Engine over the bundled registry.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<SafeWebEngine, JsValue> {
        let router = Router::bundled()
            .map_err(|e| JsValue::from_str(&format!("Failed to load bundled registry: {}", e)))?;
        Ok(Self { router })
    }

    /// Engine over a registry document in JSON form.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_json: &str) -> Result<SafeWebEngine, JsValue> {
        let router = EngineConfig::from_json(config_json)
            .and_then(|config| Router::from_config(&config))
            .map_err(|e| JsValue::from_str(&format!("Failed to load registry: {}", e)))?;
        Ok(Self { router })
    }

    /// Handle a request object, returning a response object. Never throws.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, message: JsValue) -> JsValue {
        let text = match stringify_message(&message) {
            Some(text) => text,
            None => return error_object("invalid JSON: message is not serializable"),
        };
        let response = self.router.handle_json(&text);
        js_sys::JSON::parse(&response).unwrap_or_else(|_| error_object("internal error: bad response"))
    }

    /// Same as `handleMessage`, in JSON text form.
    #[wasm_bindgen(js_name = handleMessageJson)]
    pub fn handle_message_json(&self, message: &str) -> String {
        self.router.handle_json(message)
    }

    #[wasm_bindgen(js_name = cacheSize)]
    pub fn cache_size(&self) -> u32 {
        self.router.stats().cache_size as u32
    }

    #[wasm_bindgen(js_name = siteCount)]
    pub fn site_count(&self) -> u32 {
        self.router.classifier().registry().len() as u32
    }

    #[wasm_bindgen(js_name = patternCount)]
    pub fn pattern_count(&self) -> u32 {
        self.router.classifier().patterns().len() as u32
    }
}

/// JSON text of `message`. `JSON.stringify` yields `undefined` rather than
/// throwing for `undefined`, functions and symbols, so both cases map to None.
fn stringify_message(message: &JsValue) -> Option<String> {
    js_sys::JSON::stringify(message).ok().and_then(|text| text.as_string())
}

fn error_object(message: &str) -> JsValue {
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"success".into(), &JsValue::from(false));
    let _ = js_sys::Reflect::set(&result, &"error".into(), &JsValue::from_str(message));
    result.into()
}

// =============================================================================
// Helpers
// =============================================================================

#[wasm_bindgen(js_name = extractHost)]
pub fn extract_host_js(url: &str) -> Option<String> {
    sw_core::extract_host(url).map(|h| h.to_string())
}

/// Normalized form of a hostname, or undefined when unparseable.
#[wasm_bindgen(js_name = normalizeDomain)]
pub fn normalize_domain(raw: &str) -> Option<String> {
    Domain::parse(raw).ok().map(Domain::into_string)
}
