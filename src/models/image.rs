use super::{BackgroundSpec, ModelConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Source photo as a data URI.
    #[serde(rename = "userImage", default)]
    pub user_image: String,
    /// Style reference as a data URI.
    #[serde(rename = "referenceImage", default)]
    pub reference_image: String,
    #[serde(default)]
    pub background: BackgroundSpec,
}

/// Body of `POST /generate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateEnvelope {
    #[serde(rename = "modelConfig", default)]
    pub model_config: Option<ModelConfig>,
    #[serde(rename = "generateRequest", default)]
    pub generate_request: Option<GenerateRequest>,
}

impl GenerateEnvelope {
    pub fn new(model_config: ModelConfig, generate_request: GenerateRequest) -> Self {
        Self {
            model_config: Some(model_config),
            generate_request: Some(generate_request),
        }
    }
}

/// The only contract the proxy guarantees to its callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResult {
    pub success: bool,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResult {
    pub fn success(image_url: impl Into<String>) -> Self {
        Self {
            success: true,
            image_url: image_url.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            image_url: String::new(),
            error: Some(error.into()),
        }
    }
}
