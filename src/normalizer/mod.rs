//! Turns an arbitrary chat-completion response into a [`GenerateResult`].
//!
//! Providers disagree about where an image lands in the response, so the
//! normalizer checks the transport status, then the native finish reason,
//! then probes the known shapes in a fixed order (see [`extract::EXTRACTORS`])
//! and finally classifies the extracted payload.

pub mod extract;
pub mod payload;

pub use extract::{extract, Extractor, Probe, EXTRACTORS, IMAGE_FALLBACK_KEYS};
pub use payload::{is_bare_base64, normalize_payload, PayloadKind};

use crate::{
    error::{AvatarError, Result},
    models::GenerateResult,
};
use serde_json::Value;

/// Classify a provider response, returning the normalized image URL.
pub fn classify(body: &Value, status: u16, status_text: &str) -> Result<String> {
    if !(200..300).contains(&status) {
        return Err(AvatarError::Transport {
            status,
            message: provider_error_message(body)
                .unwrap_or_else(|| fallback_error_message(status, status_text)),
        });
    }

    log::debug!(
        "🏁 Finish reasons: finish_reason={:?} native_finish_reason={:?}",
        body.pointer("/choices/0/finish_reason"),
        body.pointer("/choices/0/native_finish_reason")
    );

    if let Some(reason) = native_finish_reason(body) {
        if !reason.eq_ignore_ascii_case("STOP") {
            return Err(AvatarError::IncompleteGeneration(reason.to_string()));
        }
    }

    let (_, raw) = extract(body).ok_or(AvatarError::Extraction)?;
    let image_url = normalize_payload(&raw);
    if image_url.is_empty() {
        return Err(AvatarError::Extraction);
    }
    Ok(image_url)
}

/// [`classify`] folded into the canonical result shape.
pub fn normalize(body: &Value, status: u16, status_text: &str) -> GenerateResult {
    match classify(body, status, status_text) {
        Ok(image_url) => GenerateResult::success(image_url),
        Err(e) => e.into_result(),
    }
}

/// `choices[0].native_finish_reason`, when it is a non-empty string.
pub fn native_finish_reason(body: &Value) -> Option<&str> {
    body.pointer("/choices/0/native_finish_reason")
        .and_then(Value::as_str)
        .filter(|r| !r.is_empty())
}

/// `error.message`, or a bare string `error`, from a provider error body.
pub fn provider_error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

fn fallback_error_message(status: u16, status_text: &str) -> String {
    if status_text.is_empty() {
        format!("Generation failed (HTTP {}), please check the model configuration", status)
    } else {
        format!(
            "Generation failed (HTTP {} {}), please check the model configuration",
            status, status_text
        )
    }
}

/// Snapshot of which shapes were present, recorded when extraction fails.
pub fn describe_structure(body: &Value) -> Value {
    let keys = |v: Option<&Value>| {
        v.and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect::<Vec<_>>())
    };
    let images = body.pointer("/choices/0/message/images");

    serde_json::json!({
        "hasChoices": body.get("choices").is_some(),
        "choicesLength": body.get("choices").and_then(Value::as_array).map(Vec::len),
        "firstChoice": keys(body.pointer("/choices/0")),
        "message": keys(body.pointer("/choices/0/message")),
        "hasImages": images.is_some(),
        "imagesLength": images.and_then(Value::as_array).map(Vec::len),
        "imagesContent": images,
        "hasCandidates": body.get("candidates").is_some(),
        "topLevelKeys": keys(Some(body)),
        "attemptedPaths": EXTRACTORS.iter().map(|e| e.path).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(body: Value) -> GenerateResult {
        normalize(&body, 200, "OK")
    }

    #[test]
    fn test_transport_failure_uses_provider_message() {
        let body = json!({ "error": { "message": "rate limited" } });
        let result = normalize(&body, 500, "Internal Server Error");
        assert!(!result.success);
        assert!(result.image_url.is_empty());
        assert!(result.error.unwrap().contains("rate limited"));
    }

    #[test]
    fn test_transport_failure_skips_extraction() {
        let body = json!({
            "choices": [{ "message": { "content": "data:image/png;base64,AAAA" } }]
        });
        let err = classify(&body, 401, "Unauthorized").unwrap_err();
        assert!(matches!(err, AvatarError::Transport { status: 401, .. }));
        assert!(err.to_string().contains("401 Unauthorized"));
    }

    #[test]
    fn test_transport_failure_string_error() {
        let err = classify(&json!({ "error": "quota exceeded" }), 429, "").unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
        let err = classify(&Value::Null, 502, "").unwrap_err();
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[test]
    fn test_non_stop_finish_reason_fails_despite_content() {
        let result = ok(json!({
            "choices": [{
                "native_finish_reason": "length",
                "message": { "images": [{ "image_url": { "url": "data:image/png;base64,AAAA" } }] }
            }]
        }));
        assert!(!result.success);
        assert!(result.image_url.is_empty());
        assert!(result.error.unwrap().contains("length"));
    }

    #[test]
    fn test_finish_reason_is_case_insensitive() {
        for reason in ["STOP", "stop", "Stop"] {
            let result = ok(json!({
                "choices": [{
                    "native_finish_reason": reason,
                    "message": { "content": "https://cdn.example.com/a.png" }
                }]
            }));
            assert_eq!(result, GenerateResult::success("https://cdn.example.com/a.png"));
        }
    }

    #[test]
    fn test_only_native_finish_reason_is_checked() {
        let result = ok(json!({
            "choices": [{
                "finish_reason": "length",
                "message": { "content": "https://cdn.example.com/a.png" }
            }]
        }));
        assert!(result.success);
    }

    #[test]
    fn test_images_shape_wins_over_content() {
        let result = ok(json!({
            "choices": [{
                "native_finish_reason": "STOP",
                "message": {
                    "content": "some narration",
                    "images": [{ "image_url": { "url": "data:image/png;base64,AAAA" } }]
                }
            }]
        }));
        assert_eq!(result, GenerateResult::success("data:image/png;base64,AAAA"));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_bare_base64_content_is_wrapped() {
        let result = ok(json!({
            "choices": [{ "message": { "content": "iVBORw0KGgoAAAANSUhEUgAAAAE=" } }]
        }));
        assert_eq!(result.image_url, "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAE=");
    }

    #[test]
    fn test_whitespace_content_is_extraction_failure() {
        let body = json!({ "choices": [{ "message": { "content": "   " } }] });
        assert!(matches!(classify(&body, 200, "OK"), Err(AvatarError::Extraction)));
        let result = ok(body);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("could not extract"));
    }

    #[test]
    fn test_whitespace_text_is_extraction_failure() {
        let body = json!({ "choices": [{ "message": { "text": "  " } }] });
        assert!(matches!(classify(&body, 200, "OK"), Err(AvatarError::Extraction)));
    }

    #[test]
    fn test_data_uri_round_trip_is_byte_identical() {
        let uri = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";
        let result = ok(json!({ "choices": [{ "message": { "content": uri } }] }));
        assert_eq!(result.image_url, uri);
    }

    #[test]
    fn test_describe_structure() {
        let body = json!({ "choices": [{ "message": { "images": [] } }], "id": "x" });
        let described = describe_structure(&body);
        assert_eq!(described["choicesLength"], 1);
        assert_eq!(described["hasImages"], true);
        assert_eq!(described["imagesLength"], 0);
        assert_eq!(described["hasCandidates"], false);
        assert_eq!(described["attemptedPaths"].as_array().unwrap().len(), 5);
    }
}
