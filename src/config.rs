use dotenv::dotenv;
use std::env;
use tracing::warn;

/// Env var naming the variable that holds the API key.
pub const API_KEY_VAR_ENV: &str = "MEAL_JOURNAL_API_KEY_VAR";
pub const BASE_URL_ENV: &str = "MEAL_JOURNAL_BASE_URL";
pub const MODEL_ENV: &str = "MEAL_JOURNAL_MODEL";
pub const MAX_TOKENS_ENV: &str = "MEAL_JOURNAL_MAX_TOKENS";

pub const DEFAULT_API_KEY_ENV_VAR: &str = "DASHSCOPE_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://dashscope-intl.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "qwen2.5-vl-72b-instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub api_key_env_var: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key_env_var: DEFAULT_API_KEY_ENV_VAR.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl AnalyzerConfig {
    /// Loads `.env` and reads the analyzer settings, falling back to defaults.
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let max_tokens = match non_blank(MAX_TOKENS_ENV) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Ignoring invalid {}", MAX_TOKENS_ENV);
                defaults.max_tokens
            }),
            None => defaults.max_tokens,
        };

        Self {
            api_key_env_var: non_blank(API_KEY_VAR_ENV).unwrap_or(defaults.api_key_env_var),
            base_url: non_blank(BASE_URL_ENV).unwrap_or(defaults.base_url),
            model: non_blank(MODEL_ENV).unwrap_or(defaults.model),
            max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = AnalyzerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.api_key_env_var, "DASHSCOPE_API_KEY");
        assert_eq!(config.max_tokens, 1000);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AnalyzerConfig::from_lookup(lookup_from(&[
            (API_KEY_VAR_ENV, "OPENROUTER_API_KEY"),
            (BASE_URL_ENV, "https://openrouter.ai/api/v1"),
            (MODEL_ENV, "qwen/qwen2.5-vl-32b-instruct"),
            (MAX_TOKENS_ENV, " 1500 "),
        ]));
        assert_eq!(config.api_key_env_var, "OPENROUTER_API_KEY");
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.model, "qwen/qwen2.5-vl-32b-instruct");
        assert_eq!(config.max_tokens, 1500);
    }

    #[test]
    fn blank_and_invalid_values_fall_back() {
        let config = AnalyzerConfig::from_lookup(lookup_from(&[
            (MODEL_ENV, "   "),
            (MAX_TOKENS_ENV, "lots"),
        ]));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
    }
}
