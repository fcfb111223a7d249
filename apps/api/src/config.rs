use anyhow::{Context, Result};

use crate::llm_client::candidates::CandidateList;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration loaded from environment variables.
/// Only malformed values fail startup; a missing API key is tolerated.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub candidates: CandidateList,
    pub gemini_timeout_secs: u64,
    /// Reject responses whose recommendation/action cross-references are broken.
    pub strict_integrity: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let candidates = match optional_env("GEMINI_MODELS") {
            Some(raw) => CandidateList::parse(&raw)
                .context("GEMINI_MODELS must name at least one model")?,
            None => CandidateList::default(),
        };

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_base_url: optional_env("GEMINI_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            candidates,
            gemini_timeout_secs: std::env::var("GEMINI_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse::<u64>()
                .context("GEMINI_TIMEOUT_SECS must be a whole number of seconds")?,
            strict_integrity: parse_bool(
                &std::env::var("ANALYSIS_STRICT_INTEGRITY").unwrap_or_default(),
            )
            .context("ANALYSIS_STRICT_INTEGRITY must be true or false")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Treats unset and blank variables the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => anyhow::bail!("unrecognized boolean '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_common_spellings() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool(" YES ").unwrap());
        assert!(parse_bool("1").unwrap());
        assert!(!parse_bool("").unwrap());
        assert!(!parse_bool("off").unwrap());
    }

    #[test]
    fn test_parse_bool_rejects_garbage() {
        assert!(parse_bool("maybe").is_err());
    }
}
