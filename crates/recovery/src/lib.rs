//! Response recovery: raw LLM text → key/value tree.
//!
//! Replies are supposed to be pure YAML but frequently arrive wrapped in prose
//! or code fences. Recovery tries each strategy in order and returns the first
//! non-empty mapping:
//!
//! 1. `direct`: the whole text as YAML
//! 2. `fenced_block`: the interior of a fenced code block
//! 3. `line_scan`: a run of `key:` lines embedded in prose
//! 4. `first_key`: everything from a top-level `key:` line onwards
//!
//! When all of them fail the text is returned verbatim under `content`, with
//! the reason under `parsing_error`. Recovery never fails.

mod strategies;
mod yaml;

use serde::Serialize;
use serde_json::{Map, Value};

/// Key holding the verbatim reply when nothing could be recovered.
pub const CONTENT_KEY: &str = "content";

/// Marker key of a fallback result.
pub const PARSING_ERROR_KEY: &str = "parsing_error";

/// Name reported for the fallback result.
pub const FALLBACK: &str = "fallback";

type Strategy = fn(&str) -> Option<Map<String, Value>>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", strategies::direct),
    ("fenced_block", strategies::fenced_block),
    ("line_scan", strategies::line_scan),
    ("first_key", strategies::first_key),
];

/// A recovered tree and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recovered {
    pub strategy: &'static str,
    pub values: Map<String, Value>,
}

impl Recovered {
    pub fn is_fallback(&self) -> bool {
        self.strategy == FALLBACK
    }
}

/// Recover a key/value tree from raw reply text.
pub fn recover(raw: &str) -> Map<String, Value> {
    recover_detailed(raw).values
}

/// Like [`recover`], also reporting which strategy succeeded.
pub fn recover_detailed(raw: &str) -> Recovered {
    for &(name, attempt) in STRATEGIES {
        if let Some(values) = attempt(raw) {
            tracing::debug!(strategy = %name, keys = values.len(), "Reply recovered");
            return Recovered {
                strategy: name,
                values,
            };
        }
    }

    let reason = match yaml::parse(raw) {
        Err(e) => format!("reply is not valid YAML: {e}"),
        Ok(_) => "reply does not contain a non-empty mapping".to_string(),
    };
    tracing::warn!(reason = %reason, chars = raw.len(), "No recovery strategy succeeded");

    let mut values = Map::new();
    values.insert(CONTENT_KEY.to_string(), Value::String(raw.to_string()));
    values.insert(PARSING_ERROR_KEY.to_string(), Value::String(reason));
    Recovered {
        strategy: FALLBACK,
        values,
    }
}
