// src/config.rs
//! Environment-driven runtime configuration. `.env` is loaded by main in
//! local/dev; in production the variables come from the host.

use std::path::PathBuf;

use tracing::warn;

use crate::analyze::weights::WeightConfig;

/// LLM collaborator settings (any OpenAI-compatible chat endpoint).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    /// Flat-file backing store for the result cache.
    pub cache_path: PathBuf,
    pub bind_addr: String,
    /// Max comments fetched per query.
    pub fetch_limit: usize,
    pub weights: WeightConfig,
}

impl AppConfig {
    /// Build from environment, falling back to defaults everywhere except
    /// the API key (a missing key just degrades LLM calls at runtime).
    pub fn from_env() -> Self {
        let llm = LlmConfig {
            endpoint: env_or("OPENAI_ENDPOINT", "https://api.openai.com/v1"),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
        };

        let weights = match std::env::var("REVIEW_WEIGHTS_PATH") {
            Ok(path) => match WeightConfig::load_from_file(std::path::Path::new(&path)) {
                Ok(w) => w,
                Err(e) => {
                    warn!(path, error = %e, "weights override unreadable, using defaults");
                    WeightConfig::default()
                }
            },
            Err(_) => WeightConfig::default(),
        };

        let fetch_limit = std::env::var("REVIEW_FETCH_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(50);

        Self {
            llm,
            cache_path: PathBuf::from(env_or("REVIEW_CACHE_PATH", "cache/results.json")),
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8000"),
            fetch_limit,
            weights,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
