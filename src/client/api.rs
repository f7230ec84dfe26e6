use crate::models::{GenerateEnvelope, GenerateRequest, GenerateResult, ModelConfig};
use reqwest::Client;

const GENERATION_FAILED: &str = "Generation failed, please check the configuration";

/// Talks to the proxy, never to the provider directly.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    backend_url: String,
}

impl ApiClient {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            backend_url: backend_url.into(),
        }
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.backend_url.trim_end_matches('/'))
    }

    /// Every outcome, including network failures, comes back as a result.
    pub async fn generate_avatar(
        &self,
        config: &ModelConfig,
        request: &GenerateRequest,
    ) -> GenerateResult {
        let envelope = GenerateEnvelope::new(config.clone(), request.clone());

        let response = match self
            .client
            .post(self.generate_url())
            .json(&envelope)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::error!("API Error: {}", e);
                return GenerateResult::failure(format!(
                    "Network error, please check that the backend service is running: {}",
                    e
                ));
            }
        };

        let status = response.status();
        let data: GenerateResult = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                log::error!("API Error: unreadable response ({}): {}", status, e);
                return GenerateResult::failure(format!("{} (HTTP {})", GENERATION_FAILED, status));
            }
        };

        if !status.is_success() || !data.success || data.image_url.is_empty() {
            return GenerateResult::failure(data.error.unwrap_or_else(|| GENERATION_FAILED.to_string()));
        }
        GenerateResult::success(data.image_url)
    }
}
