use std::fs;
use std::path::Path;

use sw_core::{EngineConfig, Router};

/// Load the registry at `path`, or the bundled one when no path is given.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig, String> {
    match path {
        Some(path) => EngineConfig::load(Path::new(path)).map_err(|e| e.to_string()),
        None => EngineConfig::bundled().map_err(|e| format!("Bundled registry is invalid: {}", e)),
    }
}

pub fn load_router(path: Option<&str>) -> Result<Router, String> {
    let config = load_config(path)?;
    Router::from_config(&config).map_err(|e| e.to_string())
}

pub fn write_text(path: &Path, text: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
    }
    fs::write(path, text)
        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))
}
