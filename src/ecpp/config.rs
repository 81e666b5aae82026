//! Runtime configuration.
//!
//! [`EcppConfig`] is a plain struct: construct it by hand, take the
//! [`Default`], or read it from the process environment with
//! [`EcppConfig::from_env`]. Call [`load_settings`](crate::load_settings)
//! first if values should come from a local `.env` file.
//!
//! ```rust
//! use ecpp_assistant::EcppConfig;
//!
//! let config = EcppConfig {
//!     llm_model: "llama3.1".to_string(),
//!     ..EcppConfig::default()
//! };
//! assert_eq!(config.max_tool_iterations, 10);
//! ```

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:18000/api/v1";
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "qwen2.5";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant with authorized permissions to access user's private data.";
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct EcppConfig {
    /// Base URL of the ECPP back-office API, without a trailing slash.
    pub api_base_url: String,
    /// Base URL of the Ollama-compatible chat endpoint.
    pub llm_base_url: String,
    pub llm_model: String,
    pub system_prompt: String,
    /// Upper bound on tool rounds within one query.
    pub max_tool_iterations: usize,
    pub http_timeout: Duration,
}

impl Default for EcppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl EcppConfig {
    /// Read configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `ECPP_API_BASE_URL` | `http://localhost:18000/api/v1` |
    /// | `LLM_BASE_URL` | `http://localhost:11434` |
    /// | `LLM_MODEL` | `qwen2.5` |
    /// | `ECPP_SYSTEM_PROMPT` | built-in assistant prompt |
    /// | `MAX_TOOL_ITERATIONS` | `10` |
    /// | `HTTP_TIMEOUT_SECS` | `30` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            api_base_url: text("ECPP_API_BASE_URL", defaults.api_base_url)
                .trim_end_matches('/')
                .to_string(),
            llm_base_url: text("LLM_BASE_URL", defaults.llm_base_url)
                .trim_end_matches('/')
                .to_string(),
            llm_model: text("LLM_MODEL", defaults.llm_model),
            system_prompt: text("ECPP_SYSTEM_PROMPT", defaults.system_prompt),
            max_tool_iterations: parse_number(
                lookup("MAX_TOOL_ITERATIONS"),
                "MAX_TOOL_ITERATIONS",
                defaults.max_tool_iterations,
            ),
            http_timeout: Duration::from_secs(parse_number(
                lookup("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
        }
    }
}

fn parse_number<T>(value: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match value {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                log::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EcppConfig::from_lookup(|_| None);
        assert_eq!(config, EcppConfig::default());
        assert_eq!(config.api_base_url, "http://localhost:18000/api/v1");
        assert_eq!(config.llm_model, "qwen2.5");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = EcppConfig::from_lookup(lookup_from(&[
            ("ECPP_API_BASE_URL", "https://ecpp.example.com/api/v1/"),
            ("LLM_MODEL", "llama3.1"),
            ("MAX_TOOL_ITERATIONS", "3"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.api_base_url, "https://ecpp.example.com/api/v1");
        assert_eq!(config.llm_model, "llama3.1");
        assert_eq!(config.max_tool_iterations, 3);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = EcppConfig::from_lookup(lookup_from(&[
            ("MAX_TOOL_ITERATIONS", "many"),
            ("HTTP_TIMEOUT_SECS", "-1"),
        ]));
        assert_eq!(config.max_tool_iterations, DEFAULT_MAX_TOOL_ITERATIONS);
        assert_eq!(config.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    }
}
