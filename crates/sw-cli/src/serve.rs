//! JSON-lines message host
//!
//! One request per input line, one response per output line. The loop is
//! single-threaded and processes each message to completion.

use std::io::{BufRead, Write};

use log::info;
use serde_json::Value;
use sw_core::{Response, Router};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeSummary {
    pub handled: usize,
    pub failed: usize,
}

pub fn run_serve<R: BufRead, W: Write>(router: &Router, input: R, mut output: W) -> Result<ServeSummary, String> {
    let mut summary = ServeSummary::default();

    for line in input.lines() {
        let line = line.map_err(|e| format!("Failed to read input: {}", e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(trimmed) {
            Ok(message) => router.handle_value(message),
            Err(e) => Response::error(format!("invalid JSON: {}", e)),
        };

        summary.handled += 1;
        if !response.is_success() {
            summary.failed += 1;
        }

        writeln!(output, "{}", response.to_json())
            .and_then(|_| output.flush())
            .map_err(|e| format!("Failed to write response: {}", e))?;
    }

    info!("Serve loop finished: {} handled, {} failed", summary.handled, summary.failed);
    Ok(summary)
}
