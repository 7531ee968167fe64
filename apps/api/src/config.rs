use std::time::Duration;

use anyhow::{Context, Result};

use crate::resilience::RetryPolicy;

const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_LLM_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub llm_model: String,
    pub llm_api_base: String,
    pub llm_max_retries: u32,
    pub llm_retry_base_delay_secs: u64,
    pub llm_http_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            gemini_api_key: require("GEMINI_API_KEY")?,
            llm_model: or_default("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_api_base: or_default("LLM_API_BASE", DEFAULT_LLM_API_BASE),
            llm_max_retries: or_default("LLM_MAX_RETRIES", "2")
                .parse::<u32>()
                .context("LLM_MAX_RETRIES must be a non-negative integer")?,
            llm_retry_base_delay_secs: or_default("LLM_RETRY_BASE_DELAY_SECS", "5")
                .parse::<u64>()
                .context("LLM_RETRY_BASE_DELAY_SECS must be a non-negative integer")?,
            llm_http_timeout_secs: or_default("LLM_HTTP_TIMEOUT_SECS", "120")
                .parse::<u64>()
                .context("LLM_HTTP_TIMEOUT_SECS must be a non-negative integer")?,
            request_timeout_secs: or_default("REQUEST_TIMEOUT_SECS", "300")
                .parse::<u64>()
                .context("REQUEST_TIMEOUT_SECS must be a non-negative integer")?,
            port: or_default("PORT", "8001")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.llm_max_retries, self.llm_retry_base_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.llm_model, "gemini-2.0-flash");
        assert_eq!(config.port, 8001);
        assert_eq!(config.retry_policy(), RetryPolicy::new(2, 5));
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_overrides_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("LLM_MAX_RETRIES", "0"),
            ("LLM_RETRY_BASE_DELAY_SECS", "1"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.retry_policy(), RetryPolicy::new(0, 1));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_malformed_number_fails() {
        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("LLM_MAX_RETRIES", "-1"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LLM_MAX_RETRIES"));
    }
}
