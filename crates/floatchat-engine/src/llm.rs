use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::EngineConfig;
use crate::error::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionPurpose {
    Map,
    Chart,
    Text,
}

impl CompletionPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Chart => "chart",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub purpose: CompletionPurpose,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// A text-completion service. One blocking call, no retries.
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;
    fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

#[derive(Default)]
pub struct CompletionProviderRegistry {
    providers: BTreeMap<String, Box<dyn CompletionProvider>>,
}

impl CompletionProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: CompletionProvider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.name().to_string(), Box::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&dyn CompletionProvider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

pub fn default_provider_registry(config: &EngineConfig) -> Result<CompletionProviderRegistry> {
    let mut providers = CompletionProviderRegistry::new();
    providers.register(DryrunProvider);
    providers.register(OpenRouterProvider::new(config)?);
    Ok(providers)
}

pub struct OpenRouterProvider {
    api_base: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl OpenRouterProvider {
    const LABEL: &'static str = "OpenRouter";

    pub fn new(config: &EngineConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.model_timeout)
            .build()
            .context("failed to build OpenRouter HTTP client")?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn payload(request: &CompletionRequest) -> Value {
        let mut payload = map_object(json!({
            "model": request.model,
            "messages": request.messages,
        }));
        if let Some(max_tokens) = request.max_tokens {
            payload.insert("max_tokens".to_string(), json!(max_tokens));
        }
        if let Some(temperature) = request.temperature {
            payload.insert("temperature".to_string(), json!(temperature));
        }
        Value::Object(payload)
    }

    fn message_content(payload: &Value) -> Option<String> {
        payload
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()
            .map(str::to_string)
    }
}

impl CompletionProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::MissingApiKey);
        };
        let endpoint = self.endpoint();
        debug!("POST {endpoint} model={} purpose={}", request.model, request.purpose.as_str());

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&Self::payload(request))
            .send()
            .map_err(|source| ProviderError::Transport {
                provider: Self::LABEL.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| ProviderError::Transport {
            provider: Self::LABEL.to_string(),
            source,
        })?;
        if status.as_u16() == 401 || body.contains("User not found") {
            return Err(ProviderError::Unauthorized {
                provider: Self::LABEL.to_string(),
                detail: truncate_text(&body, 512),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Http {
                provider: Self::LABEL.to_string(),
                status: status.as_u16(),
                body: truncate_text(&body, 512),
            });
        }

        let parsed: Value =
            serde_json::from_str(&body).map_err(|err| ProviderError::InvalidResponse {
                provider: Self::LABEL.to_string(),
                detail: format!("invalid JSON payload: {err}"),
            })?;
        Self::message_content(&parsed).ok_or_else(|| ProviderError::InvalidResponse {
            provider: Self::LABEL.to_string(),
            detail: format!(
                "missing choices[0].message.content in {}",
                truncate_text(&parsed.to_string(), 256)
            ),
        })
    }
}

/// Offline provider with canned, purpose-shaped answers.
pub struct DryrunProvider;

impl DryrunProvider {
    fn chart_lines() -> String {
        let mut out = String::new();
        for idx in 0..20u32 {
            let depth = 50 * (idx + 1);
            let temperature = 24.0 - f64::from(idx) * 1.1;
            let salinity = 35.6 - f64::from(idx) * 0.05;
            let latitude = 40.5 + f64::from(idx) * 0.1;
            let longitude = -120.3 + f64::from(idx) * 0.1;
            let _ = writeln!(
                out,
                "Temperature: {temperature:.1}°C at {depth}m depth, Salinity: {salinity:.2} PSU, Latitude: {latitude:.1}, Longitude: {longitude:.1}, Date: 2023-01-{day:02}",
                day = idx + 1
            );
        }
        out
    }
}

impl CompletionProvider for DryrunProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        Ok(match request.purpose {
            CompletionPurpose::Chart => Self::chart_lines(),
            CompletionPurpose::Map => [
                "North Pacific: latitude: 35.5, longitude: -150.2",
                "North Atlantic: latitude: 45.0, longitude: -30.0",
                "Indian Ocean: latitude: -10.2, longitude: 80.4",
            ]
            .join("\n"),
            CompletionPurpose::Text => "Hello! I'm a marine science assistant focused on Argo floats and the ocean. Ask me about ocean temperature, salinity, currents or where floats are drifting.".to_string(),
        })
    }
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        ChatMessage, CompletionProvider, CompletionPurpose, CompletionRequest, DryrunProvider,
        OpenRouterProvider,
    };
    use crate::config::EngineConfig;
    use crate::error::ProviderError;

    fn request(purpose: CompletionPurpose) -> CompletionRequest {
        CompletionRequest {
            model: "dryrun-text-1".to_string(),
            purpose,
            messages: vec![ChatMessage::user("plot temperature")],
            max_tokens: Some(600),
            temperature: Some(0.3),
        }
    }

    #[test]
    fn payload_carries_optional_limits() {
        let payload = OpenRouterProvider::payload(&request(CompletionPurpose::Chart));
        assert_eq!(payload["max_tokens"], json!(600));
        assert_eq!(payload["messages"][0]["role"], json!("user"));

        let mut bare = request(CompletionPurpose::Map);
        bare.max_tokens = None;
        bare.temperature = None;
        let payload = OpenRouterProvider::payload(&bare);
        assert!(payload.get("max_tokens").is_none());
        assert!(payload.get("temperature").is_none());
    }

    #[test]
    fn content_is_read_from_first_choice() {
        let payload = json!({"choices": [{"message": {"role": "assistant", "content": "Argo"}}]});
        assert_eq!(
            OpenRouterProvider::message_content(&payload).as_deref(),
            Some("Argo")
        );
        assert_eq!(OpenRouterProvider::message_content(&json!({"choices": []})), None);
    }

    #[test]
    fn missing_key_fails_before_any_request() -> anyhow::Result<()> {
        let provider = OpenRouterProvider::new(&EngineConfig::default())?;
        let err = provider
            .complete(&request(CompletionPurpose::Text))
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey));
        Ok(())
    }

    #[test]
    fn dryrun_chart_lines_follow_prompt_format() -> anyhow::Result<()> {
        let text = DryrunProvider.complete(&request(CompletionPurpose::Chart))?;
        assert_eq!(text.lines().count(), 20);
        assert!(text.starts_with("Temperature: 24.0°C at 50m depth, Salinity: 35.60 PSU"));
        Ok(())
    }
}
