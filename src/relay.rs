//! The proxy's single round trip: validate, build the chat request, call the
//! provider once, normalize the answer.

use crate::{
    diagnostics::Diagnostics,
    error::{AvatarError, Result},
    logger,
    models::{ChatCompletionRequest, GenerateEnvelope, GenerateRequest, GenerateResult, ModelConfig},
    normalizer,
    prompt::build_prompt,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;

/// Raw provider answer, before any interpretation.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub status: u16,
    pub status_text: String,
    pub headers: Value,
    pub body: Value,
}

impl ProviderReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound chat-completion call.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn post_chat(
        &self,
        url: &str,
        api_token: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ProviderReply>;
}

/// `reqwest` transport with the client's default timeouts.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build_headers(api_token: &str) -> Result<reqwest::header::HeaderMap> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_token)).map_err(
                |_| AvatarError::Validation("API token contains invalid characters".into()),
            )?,
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn post_chat(
        &self,
        url: &str,
        api_token: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ProviderReply> {
        let response = self
            .client
            .post(url)
            .headers(Self::build_headers(api_token)?)
            .json(request)
            .send()
            .await
            .map_err(|e| AvatarError::Unexpected(format!("Provider request failed: {}", e)))?;

        let status = response.status();
        let headers: serde_json::Map<String, Value> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    Value::String(value.to_str().unwrap_or_default().to_string()),
                )
            })
            .collect();

        let text = response.text().await.map_err(|e| {
            AvatarError::Unexpected(format!("Failed to read provider response: {}", e))
        })?;

        let body = match serde_json::from_str::<Value>(&text) {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(AvatarError::Unexpected(format!(
                    "Provider returned invalid JSON: {}",
                    e
                )));
            }
            // Error pages are often HTML; keep the text for the snapshot.
            Err(_) => Value::String(text),
        };

        Ok(ProviderReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: Value::Object(headers),
            body,
        })
    }
}

/// HTTP status plus the canonical body returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    pub result: GenerateResult,
}

#[derive(Clone)]
pub struct Relay {
    transport: Arc<dyn CompletionTransport>,
    diagnostics: Diagnostics,
}

impl Relay {
    pub fn new(transport: Arc<dyn CompletionTransport>, diagnostics: Diagnostics) -> Self {
        Self {
            transport,
            diagnostics,
        }
    }

    pub fn http(diagnostics: Diagnostics) -> Self {
        Self::new(Arc::new(HttpTransport::new()), diagnostics)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Run one generation. Every failure is folded into the result.
    pub async fn generate(&self, request_id: &str, envelope: &GenerateEnvelope) -> RelayResponse {
        match self.try_generate(request_id, envelope).await {
            Ok(image_url) => {
                log::info!("[{}] ✅ Avatar generated", request_id);
                RelayResponse {
                    status: 200,
                    result: GenerateResult::success(image_url),
                }
            }
            Err(e) => {
                match &e {
                    AvatarError::Validation(msg) => {
                        log::warn!("[{}] ⚠️  Rejected request: {}", request_id, msg)
                    }
                    AvatarError::Unexpected(msg) => {
                        log::error!("[{}] ❌ Server error: {}", request_id, msg);
                        self.diagnostics.failure(
                            request_id,
                            "exception.json",
                            json!({
                                "timestamp": Utc::now().to_rfc3339(),
                                "error": { "message": msg, "name": "UnexpectedError" }
                            }),
                        );
                    }
                    other => log::error!("[{}] ❌ Generation failed: {}", request_id, other),
                }
                RelayResponse {
                    status: e.status_code(),
                    result: e.into_result(),
                }
            }
        }
    }

    pub async fn try_generate(&self, request_id: &str, envelope: &GenerateEnvelope) -> Result<String> {
        let (config, request) = validate(envelope)?;

        let payload = build_chat_request(config, request);
        let url = config.completions_url();
        log::info!("[{}] Calling {} with model {}", request_id, url, config.model_name);

        self.diagnostics.snapshot(
            request_id,
            "ai_request.json",
            json!({
                "timestamp": Utc::now().to_rfc3339(),
                "url": url,
                "payload": payload,
            }),
        );

        let reply = {
            let _timer = logger::timer("Provider call");
            self.transport
                .post_chat(&url, &config.api_token, &payload)
                .await?
        };

        if reply.is_success() {
            log::debug!("AI API Response: {}", reply.body);
            self.diagnostics.snapshot(
                request_id,
                "ai_response.json",
                json!({
                    "timestamp": Utc::now().to_rfc3339(),
                    "status": reply.status,
                    "statusText": reply.status_text,
                    "headers": reply.headers,
                    "data": reply.body,
                }),
            );
        } else {
            log::error!("[{}] AI API Error: {} {}", request_id, reply.status, reply.body);
            self.diagnostics.failure(
                request_id,
                "ai_error_response.json",
                json!({
                    "timestamp": Utc::now().to_rfc3339(),
                    "status": reply.status,
                    "statusText": reply.status_text,
                    "headers": reply.headers,
                    "error": reply.body,
                }),
            );
        }

        if let Some(message) = reply.body.pointer("/choices/0/message") {
            if let Some(map) = message.as_object() {
                log::debug!("📋 Message object keys: {:?}", map.keys().collect::<Vec<_>>());
            }
        }

        let outcome = normalizer::classify(&reply.body, reply.status, &reply.status_text);
        match &outcome {
            Ok(image_url) => self.diagnostics.snapshot(
                request_id,
                "final_result.json",
                json!({
                    "timestamp": Utc::now().to_rfc3339(),
                    "success": true,
                    "imageUrl": image_url,
                    "imageUrlLength": image_url.len(),
                    "imageUrlPreview": image_url.chars().take(200).collect::<String>(),
                }),
            ),
            Err(AvatarError::IncompleteGeneration(_)) => self.diagnostics.failure(
                request_id,
                "finish_reason_error.json",
                json!({
                    "timestamp": Utc::now().to_rfc3339(),
                    "finishReason": reply.body.pointer("/choices/0/finish_reason"),
                    "nativeFinishReason": normalizer::native_finish_reason(&reply.body),
                    "fullResponse": reply.body,
                }),
            ),
            Err(AvatarError::Extraction) => {
                log::error!("[{}] ❌ Failed to extract content from any known format", request_id);
                self.diagnostics.failure(
                    request_id,
                    "parse_error.json",
                    json!({
                        "timestamp": Utc::now().to_rfc3339(),
                        "error": "Failed to extract content from any known format",
                        "actualStructure": normalizer::describe_structure(&reply.body),
                        "fullResponse": reply.body,
                    }),
                );
            }
            Err(_) => {}
        }
        outcome
    }
}

/// Presence checks on the envelope. Blank strings count as missing.
pub fn validate(envelope: &GenerateEnvelope) -> Result<(&ModelConfig, &GenerateRequest)> {
    let (config, request) = match (&envelope.model_config, &envelope.generate_request) {
        (Some(config), Some(request)) => (config, request),
        (config, request) => {
            let mut missing = Vec::new();
            if config.is_none() {
                missing.push("modelConfig");
            }
            if request.is_none() {
                missing.push("generateRequest");
            }
            return Err(AvatarError::Validation(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        }
    };

    let missing: Vec<&str> = [
        ("baseURL", &config.base_url),
        ("apiToken", &config.api_token),
        ("modelName", &config.model_name),
    ]
    .iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| *name)
    .collect();
    if !missing.is_empty() {
        return Err(AvatarError::Validation(format!(
            "Model configuration is incomplete: missing {}",
            missing.join(", ")
        )));
    }

    let missing: Vec<&str> = [
        ("userImage", &request.user_image),
        ("referenceImage", &request.reference_image),
    ]
    .iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| *name)
    .collect();
    if !missing.is_empty() {
        return Err(AvatarError::Validation(format!(
            "Missing required image: {}",
            missing.join(", ")
        )));
    }

    Ok((config, request))
}

pub fn build_chat_request(config: &ModelConfig, request: &GenerateRequest) -> ChatCompletionRequest {
    ChatCompletionRequest::avatar(
        &config.model_name,
        build_prompt(&request.background),
        &request.user_image,
        &request.reference_image,
    )
}

/// Inbound envelope as it is safe to persist: the API token is masked.
pub fn redacted(envelope: &GenerateEnvelope) -> Value {
    let mut value = serde_json::to_value(envelope).unwrap_or(Value::Null);
    if let Some(token) = value.pointer_mut("/modelConfig/apiToken") {
        *token = Value::String("***".to_string());
    }
    value
}
