use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Outbound OpenAI-style chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

impl ChatCompletionRequest {
    /// Single user message carrying the prompt followed by the two images.
    pub fn avatar(model: &str, prompt: String, user_image: &str, reference_image: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::text(prompt),
                    ContentPart::image(user_image),
                    ContentPart::image(reference_image),
                ],
            }],
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_avatar_request_wire_format() {
        let request = ChatCompletionRequest::avatar("m", "draw".into(), "data:a", "data:b");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "m",
                "messages": [{
                    "role": "user",
                    "content": [
                        { "type": "text", "text": "draw" },
                        { "type": "image_url", "image_url": { "url": "data:a" } },
                        { "type": "image_url", "image_url": { "url": "data:b" } }
                    ]
                }],
                "max_tokens": 4096
            })
        );
    }
}
