//! OpenAI-compatible reasoning engine.
//!
//! Speaks the streaming `/chat/completions` protocol with tool use and
//! multimodal (image data URL) content. Works with OpenAI, Azure OpenAI,
//! and any compatible endpoint.

use async_trait::async_trait;
use futures::StreamExt;
use roverctl_config::EngineConfig;
use roverctl_core::engine::{EngineEvent, EngineRequest, ReasoningEngine, RequestedCall, ToolSpec};
use roverctl_core::error::EngineError;
use roverctl_core::item::{ConversationItem, LogItem, ToolPayload};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// How the API key travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthStyle {
    /// `Authorization: Bearer <key>` (OpenAI and most compatibles).
    Bearer,
    /// `api-key: <key>` (Azure OpenAI).
    ApiKey,
}

/// An OpenAI-compatible reasoning engine.
pub struct OpenAiCompatEngine {
    name: String,
    /// Full URL of the chat-completions endpoint, query string included.
    completions_url: String,
    api_key: String,
    auth: AuthStyle,
    client: reqwest::Client,
}

impl OpenAiCompatEngine {
    /// Create an engine against a `/v1`-style base URL.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| EngineError::NotConfigured(format!("HTTP client: {e}")))?;

        let base = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            name: name.into(),
            completions_url: format!("{base}/chat/completions"),
            api_key: api_key.into(),
            auth: AuthStyle::Bearer,
            client,
        })
    }

    /// Create an OpenAI engine (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, EngineError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Azure OpenAI engine. Azure routes by deployment and
    /// authenticates with an `api-key` header instead of a bearer token.
    pub fn azure(
        endpoint: impl Into<String>,
        deployment: &str,
        api_version: &str,
        api_key: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let mut engine = Self::new("azure", &endpoint, api_key)?;
        engine.completions_url = format!(
            "{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
        );
        engine.auth = AuthStyle::ApiKey;
        Ok(engine)
    }

    /// Build an engine from configuration. Fails if no API key is set.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            EngineError::NotConfigured(
                "no API key (set ROVERCTL_API_KEY or OPENAI_API_KEY, or config.toml)".into(),
            )
        })?;
        Self::new("openai", &config.api_url, api_key)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            AuthStyle::Bearer => {
                request.header("Authorization", format!("Bearer {}", self.api_key))
            }
            AuthStyle::ApiKey => request.header("api-key", &self.api_key),
        }
    }

    /// Convert the conversation log to API messages.
    ///
    /// Mapping rules:
    /// - instructions become the leading system message;
    /// - a user message with a photo becomes a content-parts array
    ///   (text part + `image_url` part with the data URL, detail high);
    /// - consecutive `ToolCall` items merge into one assistant message
    ///   carrying the whole `tool_calls` array;
    /// - a `ToolResult` becomes a `tool` role message keyed by `call_id`,
    ///   with photo payloads again as content parts;
    /// - `ReasoningFragment` items are never sent back.
    fn to_api_messages(instructions: &str, items: &[LogItem]) -> Vec<ApiMessage> {
        let mut messages = vec![ApiMessage::system(instructions)];
        let mut pending_calls: Vec<ApiToolCall> = Vec::new();

        for log_item in items {
            // A non-ToolCall item closes any open tool_calls group
            if !matches!(log_item.item, ConversationItem::ToolCall { .. })
                && !pending_calls.is_empty()
            {
                messages.push(ApiMessage::assistant_calls(std::mem::take(
                    &mut pending_calls,
                )));
            }

            match &log_item.item {
                ConversationItem::UserMessage { text, image } => {
                    let content = match image {
                        Some(image) => content_parts(text, &image.data_url),
                        None => serde_json::Value::String(text.clone()),
                    };
                    messages.push(ApiMessage {
                        role: "user".into(),
                        content: Some(content),
                        tool_calls: None,
                        tool_call_id: None,
                    });
                }
                ConversationItem::ToolCall {
                    id,
                    action,
                    arguments,
                } => {
                    pending_calls.push(ApiToolCall {
                        id: id.clone(),
                        r#type: "function".into(),
                        function: ApiFunction {
                            name: action.clone(),
                            arguments: arguments.to_string(),
                        },
                    });
                }
                ConversationItem::ToolResult { call_id, payload } => {
                    let content = match payload {
                        ToolPayload::Text { text } => serde_json::Value::String(text.clone()),
                        ToolPayload::Image { image } => {
                            content_parts("Here is the photo:", &image.data_url)
                        }
                    };
                    messages.push(ApiMessage {
                        role: "tool".into(),
                        content: Some(content),
                        tool_calls: None,
                        tool_call_id: Some(call_id.clone()),
                    });
                }
                ConversationItem::AssistantMessage { text } => {
                    messages.push(ApiMessage {
                        role: "assistant".into(),
                        content: Some(serde_json::Value::String(text.clone())),
                        tool_calls: None,
                        tool_call_id: None,
                    });
                }
                ConversationItem::ReasoningFragment { .. } => {}
            }
        }

        if !pending_calls.is_empty() {
            messages.push(ApiMessage::assistant_calls(pending_calls));
        }

        messages
    }

    fn to_api_tools(tools: &[ToolSpec]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }
}

fn content_parts(text: &str, data_url: &str) -> serde_json::Value {
    serde_json::json!([
        { "type": "text", "text": text },
        {
            "type": "image_url",
            "image_url": { "url": data_url, "detail": "high" }
        }
    ])
}

#[async_trait]
impl ReasoningEngine for OpenAiCompatEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_turn(
        &self,
        request: EngineRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<EngineEvent, EngineError>>,
        EngineError,
    > {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.instructions, &request.items),
            "temperature": request.temperature,
            "stream": true,
        });

        if let Some(max_tokens) = request.max_output_tokens {
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        debug!(engine = %self.name, model = %request.model, items = request.items.len(), "Starting turn");

        let response = self
            .authorize(self.client.post(&self.completions_url))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(EngineError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(EngineError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Engine returned error");
            return Err(EngineError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let engine_name = self.name.clone();

        // Read the SSE byte stream and translate chunks into engine events
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut final_text = String::new();

            // Tool call deltas keyed by index; BTreeMap keeps the calls in
            // the order the engine listed them
            let mut accumulators: BTreeMap<u32, CallAccumulator> = BTreeMap::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(EngineError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete lines
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let data = data.trim();

                    if data == "[DONE]" {
                        finish(&tx, accumulators, final_text).await;
                        return;
                    }

                    match serde_json::from_str::<StreamResponse>(data) {
                        Ok(stream_resp) => {
                            let Some(choice) = stream_resp.choices.first() else {
                                continue;
                            };
                            let delta = &choice.delta;

                            if let Some(ref tc_deltas) = delta.tool_calls {
                                for tc_delta in tc_deltas {
                                    let acc = accumulators.entry(tc_delta.index).or_default();
                                    if let Some(ref id) = tc_delta.id {
                                        acc.id = id.clone();
                                    }
                                    if let Some(ref func) = tc_delta.function {
                                        if let Some(ref name) = func.name {
                                            acc.name = name.clone();
                                        }
                                        if let Some(ref args) = func.arguments {
                                            acc.arguments.push_str(args);
                                        }
                                    }
                                }
                            }

                            if let Some(text) = delta
                                .reasoning
                                .as_deref()
                                .filter(|t| !t.is_empty())
                            {
                                let event = EngineEvent::ReasoningDelta { text: text.into() };
                                if tx.send(Ok(event)).await.is_err() {
                                    return; // receiver dropped
                                }
                            }

                            if let Some(text) =
                                delta.content.as_deref().filter(|t| !t.is_empty())
                            {
                                final_text.push_str(text);
                                let event = EngineEvent::TextDelta { text: text.into() };
                                if tx.send(Ok(event)).await.is_err() {
                                    return;
                                }
                            }

                            if let Some(reason) = &choice.finish_reason {
                                trace!(engine = %engine_name, reason, "Turn finishing");
                            }
                        }
                        Err(e) => {
                            trace!(
                                engine = %engine_name,
                                data = %data,
                                error = %e,
                                "Ignoring unparseable SSE chunk"
                            );
                        }
                    }
                }
            }

            // Stream ended without [DONE]
            finish(&tx, accumulators, final_text).await;
        });

        Ok(rx)
    }
}

/// Emit the terminal event: requested calls if any arrived, otherwise the
/// completed text.
async fn finish(
    tx: &tokio::sync::mpsc::Sender<std::result::Result<EngineEvent, EngineError>>,
    accumulators: BTreeMap<u32, CallAccumulator>,
    final_text: String,
) {
    let event = if accumulators.is_empty() {
        EngineEvent::Completed {
            final_text: if final_text.is_empty() {
                None
            } else {
                Some(final_text)
            },
        }
    } else {
        EngineEvent::ToolCalls {
            calls: accumulators.into_values().map(CallAccumulator::build).collect(),
        }
    };
    let _ = tx.send(Ok(event)).await;
}

// --- API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ApiMessage {
    fn system(instructions: &str) -> Self {
        Self {
            role: "system".into(),
            content: Some(serde_json::Value::String(instructions.into())),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn assistant_calls(calls: Vec<ApiToolCall>) -> Self {
        Self {
            role: "assistant".into(),
            content: None,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCallDelta>>,
}

/// A tool call delta, arriving incrementally across chunks.
#[derive(Debug, Deserialize)]
struct StreamToolCallDelta {
    index: u32,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Accumulates incremental tool call deltas into a complete call.
#[derive(Default)]
struct CallAccumulator {
    id: String,
    name: String,
    arguments: String,
}

impl CallAccumulator {
    fn build(self) -> RequestedCall {
        RequestedCall {
            id: self.id,
            name: self.name,
            arguments: self.arguments,
        }
    }
}
