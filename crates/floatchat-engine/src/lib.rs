pub mod artifact;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod erddap;
pub mod error;
pub mod llm;
pub mod map;
pub mod prompts;
pub mod synthetic;

use std::time::Instant;

use anyhow::{bail, Result};
use chrono::Utc;
use floatchat_contracts::intent::QueryIntent;
use floatchat_contracts::models::{ModelSelector, TEXT_CAPABILITY};
use log::{debug, info, warn};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::artifact::RenderedArtifact;
use crate::chart::render_chart;
use crate::config::{ChartFormat, EngineConfig};
use crate::dataset::{DataAssembler, DataOrigin};
use crate::erddap::{ErddapSource, OceanDataSource, OfflineSource};
use crate::error::{ChatError, ProviderError};
use crate::llm::{
    default_provider_registry, ChatMessage, CompletionProvider, CompletionProviderRegistry,
    CompletionPurpose, CompletionRequest,
};
use crate::map::render_map;
use crate::prompts::{
    chart_prompt, map_prompt, CHART_MAX_TOKENS, CHART_TEMPERATURE, REFUSAL_REPLY,
    TEXT_MAX_TOKENS, TEXT_SYSTEM_MESSAGE, TEXT_TEMPERATURE,
};

/// Answer to one chat message. At most one of `has_graph` and `has_map` is
/// set, and only when `artifact` holds the matching payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub reply: String,
    pub artifact: Option<RenderedArtifact>,
    pub has_graph: bool,
    pub has_map: bool,
    pub data_origin: Option<DataOrigin>,
}

impl ChatResponse {
    pub fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            artifact: None,
            has_graph: false,
            has_map: false,
            data_origin: None,
        }
    }

    fn chart(artifact: RenderedArtifact, data_origin: Option<DataOrigin>) -> Self {
        Self {
            reply: String::new(),
            artifact: Some(artifact),
            has_graph: true,
            has_map: false,
            data_origin,
        }
    }

    fn map(artifact: RenderedArtifact, data_origin: DataOrigin) -> Self {
        Self {
            reply: String::new(),
            artifact: Some(artifact),
            has_graph: false,
            has_map: true,
            data_origin: Some(data_origin),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("reply".to_string(), json!(self.reply));
        match &self.artifact {
            Some(artifact @ RenderedArtifact::Chart { .. }) => {
                body.insert("graph".to_string(), json!(artifact.payload()));
                body.insert("graph_content_type".to_string(), json!(artifact.content_type()));
            }
            Some(artifact @ RenderedArtifact::Map { .. }) => {
                body.insert("map".to_string(), json!(artifact.payload()));
            }
            None => {}
        }
        body.insert("has_graph".to_string(), json!(self.has_graph));
        body.insert("has_map".to_string(), json!(self.has_map));
        if let Some(origin) = self.data_origin {
            body.insert("data_origin".to_string(), json!(origin.as_str()));
        }
        Value::Object(body)
    }
}

impl Serialize for ChatResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

pub struct ChatEngine {
    model_selector: ModelSelector,
    model: String,
    chart_format: ChartFormat,
    synthetic_fallback: bool,
    providers: CompletionProviderRegistry,
    source: Box<dyn OceanDataSource>,
}

impl ChatEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let providers = default_provider_registry(&config)?;
        let source: Box<dyn OceanDataSource> = if config.offline {
            Box::new(OfflineSource)
        } else {
            Box::new(ErddapSource::new(&config)?)
        };
        Ok(Self::with_parts(config, providers, source))
    }

    pub fn with_parts(
        config: EngineConfig,
        providers: CompletionProviderRegistry,
        source: Box<dyn OceanDataSource>,
    ) -> Self {
        Self {
            model_selector: ModelSelector::default(),
            model: config.model,
            chart_format: config.chart_format,
            synthetic_fallback: config.synthetic_fallback,
            providers,
            source,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn chart_format(&self) -> ChartFormat {
        self.chart_format
    }

    pub fn set_chart_format(&mut self, format: ChartFormat) {
        self.chart_format = format;
    }

    fn resolve_model(&self) -> Result<(String, &dyn CompletionProvider), ChatError> {
        let selection = self
            .model_selector
            .select(Some(&self.model), TEXT_CAPABILITY)
            .map_err(ChatError::Configuration)?;
        if let Some(reason) = &selection.fallback_reason {
            warn!("{reason} Using {}.", selection.model.name);
        }
        let provider = self
            .providers
            .get(&selection.model.provider)
            .ok_or_else(|| ProviderError::UnknownProvider(selection.model.provider.clone()))?;
        Ok((selection.model.name, provider))
    }

    /// Routes one message through refusal, map, chart or text handling.
    pub fn respond(&self, message: &str) -> Result<ChatResponse, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::InvalidRequest);
        }
        let request_id = Uuid::new_v4();
        let intent = QueryIntent::classify(message);
        info!(
            "[{request_id}] received message: domain={} chart={} map={}",
            intent.is_domain, intent.wants_chart, intent.wants_map
        );
        if !intent.is_domain {
            info!("[{request_id}] rejected as off-topic");
            return Ok(ChatResponse::text(REFUSAL_REPLY));
        }

        let (model, provider) = self.resolve_model()?;
        let call = Completion {
            model: &model,
            provider,
            request_id,
        };

        if intent.wants_map {
            match self.map_flow(&call, message) {
                Ok(response) => return Ok(response),
                Err(err) => warn!("[{request_id}] map flow failed, answering in text: {err:#}"),
            }
        } else if intent.wants_chart {
            match self.chart_flow(&call, message) {
                Ok(response) => return Ok(response),
                Err(err) => warn!("[{request_id}] chart flow failed, answering in text: {err:#}"),
            }
        }
        self.text_flow(&call, message)
    }

    fn map_flow(&self, call: &Completion<'_>, message: &str) -> Result<ChatResponse> {
        info!("[{}] map flow", call.request_id);
        let text = call.run(CompletionPurpose::Map, vec![ChatMessage::user(map_prompt(message))], None, None)?;
        let assembler = DataAssembler::new(self.source.as_ref(), self.synthetic_fallback);
        let Some(assembled) = assembler.map_rows(&text) else {
            bail!("no float locations available");
        };
        let html = render_map(message, &assembled.rows)?;
        info!(
            "[{}] rendered map with {} floats from {} ({} bytes)",
            call.request_id,
            assembled.rows.len(),
            assembled.origin.as_str(),
            html.len()
        );
        Ok(ChatResponse::map(RenderedArtifact::map(html), assembled.origin))
    }

    fn chart_flow(&self, call: &Completion<'_>, message: &str) -> Result<ChatResponse> {
        info!("[{}] chart flow", call.request_id);
        let text = call.run(
            CompletionPurpose::Chart,
            vec![ChatMessage::user(chart_prompt(message))],
            Some(CHART_MAX_TOKENS),
            Some(CHART_TEMPERATURE),
        )?;
        let assembler = DataAssembler::new(self.source.as_ref(), self.synthetic_fallback);
        let (rows, origin) = match assembler.chart_rows(&text, Utc::now().naive_utc()) {
            Some(assembled) => (assembled.rows, Some(assembled.origin)),
            None => (Vec::new(), None),
        };
        let artifact = render_chart(message, &rows, self.chart_format)?;
        info!(
            "[{}] rendered {} chart from {} rows ({} bytes encoded)",
            call.request_id,
            self.chart_format.extension(),
            rows.len(),
            artifact.payload().len()
        );
        Ok(ChatResponse::chart(artifact, origin))
    }

    fn text_flow(&self, call: &Completion<'_>, message: &str) -> Result<ChatResponse, ChatError> {
        info!("[{}] text flow", call.request_id);
        let reply = call.run(
            CompletionPurpose::Text,
            vec![
                ChatMessage::system(TEXT_SYSTEM_MESSAGE),
                ChatMessage::user(message),
            ],
            Some(TEXT_MAX_TOKENS),
            Some(TEXT_TEMPERATURE),
        )?;
        Ok(ChatResponse::text(reply))
    }
}

/// The resolved model for one request.
struct Completion<'a> {
    model: &'a str,
    provider: &'a dyn CompletionProvider,
    request_id: Uuid,
}

impl Completion<'_> {
    fn run(
        &self,
        purpose: CompletionPurpose,
        messages: Vec<ChatMessage>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<String, ProviderError> {
        let request = CompletionRequest {
            model: self.model.to_string(),
            purpose,
            messages,
            max_tokens,
            temperature,
        };
        debug!(
            "[{}] {} completion via {} ({})",
            self.request_id,
            purpose.as_str(),
            self.provider.name(),
            self.model
        );
        let started = Instant::now();
        let text = self.provider.complete(&request)?;
        info!(
            "[{}] {} completion finished in {} ms ({} chars)",
            self.request_id,
            purpose.as_str(),
            started.elapsed().as_millis(),
            text.len()
        );
        Ok(text)
    }
}
