use serde::{Deserialize, Serialize};

/// Provider endpoint settings supplied by the user.
///
/// Fields default to empty strings so that a partially filled config still
/// deserializes and is rejected by validation instead of by the JSON layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(rename = "baseURL", default)]
    pub base_url: String,
    #[serde(rename = "apiToken", default)]
    pub api_token: String,
    #[serde(rename = "modelName", default)]
    pub model_name: String,
}

impl ModelConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            model_name: model_name.into(),
        }
    }

    /// `{baseURL}/v1/chat/completions`, tolerating a trailing slash on the base.
    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    Color,
    #[default]
    Auto,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundSpec {
    #[serde(rename = "type", default)]
    pub kind: BackgroundType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<String>,
}

impl BackgroundSpec {
    pub fn color(color: impl Into<String>) -> Self {
        Self {
            kind: BackgroundType::Color,
            color: Some(color.into()),
            elements: None,
        }
    }

    pub fn auto() -> Self {
        Self::default()
    }

    pub fn with_elements(mut self, elements: impl Into<String>) -> Self {
        self.elements = Some(elements.into());
        self
    }

    /// Decorative elements, if any non-empty description was given.
    pub fn elements(&self) -> Option<&str> {
        self.elements.as_deref().filter(|e| !e.is_empty())
    }
}
