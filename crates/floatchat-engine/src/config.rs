use std::env;
use std::time::Duration;

use log::warn;
use serde::Serialize;

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "x-ai/grok-4-fast:free";
pub const DEFAULT_ERDDAP_URL: &str = "https://polarwatch.noaa.gov/erddap/tabledap/argoFloats.json";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

impl ChartFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// Process-wide settings, read once at startup and handed to the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub model_timeout: Duration,
    pub erddap_url: String,
    pub fetch_timeout: Duration,
    pub chart_format: ChartFormat,
    pub synthetic_fallback: bool,
    /// Skip the live data service entirely.
    pub offline: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            erddap_url: DEFAULT_ERDDAP_URL.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            chart_format: ChartFormat::Png,
            synthetic_fallback: true,
            offline: false,
        }
    }
}

impl EngineConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(non_empty_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let chart_format = match lookup("FLOATCHAT_CHART_FORMAT") {
            Some(raw) => ChartFormat::parse(&raw).unwrap_or_else(|| {
                warn!("ignoring FLOATCHAT_CHART_FORMAT={raw:?}; expected png or svg");
                defaults.chart_format
            }),
            None => defaults.chart_format,
        };

        Self {
            api_key: lookup("OPENROUTER_API_KEY").or_else(|| lookup("OPENROUTER_API")),
            api_base: lookup("OPENROUTER_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            model: lookup("FLOATCHAT_MODEL").unwrap_or(defaults.model),
            model_timeout: timeout_from(
                &lookup,
                "FLOATCHAT_MODEL_TIMEOUT_SECS",
                defaults.model_timeout,
            ),
            erddap_url: lookup("FLOATCHAT_ERDDAP_URL").unwrap_or(defaults.erddap_url),
            fetch_timeout: timeout_from(
                &lookup,
                "FLOATCHAT_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout,
            ),
            chart_format,
            synthetic_fallback: lookup("FLOATCHAT_SYNTHETIC_FALLBACK")
                .map(|raw| !matches!(raw.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(defaults.synthetic_fallback),
            offline: false,
        }
    }
}

fn timeout_from<F>(lookup: &F, key: &str, fallback: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return fallback;
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!("ignoring {key}={raw:?}; expected a positive number of seconds");
            fallback
        }
    }
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{ChartFormat, EngineConfig, DEFAULT_MODEL};

    fn config_from(pairs: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.api_key, None);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.chart_format, ChartFormat::Png);
        assert!(config.synthetic_fallback);
    }

    #[test]
    fn legacy_key_name_is_accepted() {
        let config = config_from(&[("OPENROUTER_API", "sk-legacy")]);
        assert_eq!(config.api_key.as_deref(), Some("sk-legacy"));

        let config = config_from(&[("OPENROUTER_API", "sk-legacy"), ("OPENROUTER_API_KEY", "sk-new")]);
        assert_eq!(config.api_key.as_deref(), Some("sk-new"));
    }

    #[test]
    fn overrides_and_invalid_values() {
        let config = config_from(&[
            ("OPENROUTER_API_BASE", "http://localhost:8080/v1/"),
            ("FLOATCHAT_CHART_FORMAT", "SVG"),
            ("FLOATCHAT_FETCH_TIMEOUT_SECS", "soon"),
            ("FLOATCHAT_MODEL_TIMEOUT_SECS", "15"),
            ("FLOATCHAT_SYNTHETIC_FALLBACK", "false"),
        ]);
        assert_eq!(config.api_base, "http://localhost:8080/v1");
        assert_eq!(config.chart_format, ChartFormat::Svg);
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.model_timeout, Duration::from_secs(15));
        assert!(!config.synthetic_fallback);
    }
}
