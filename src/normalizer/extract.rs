//! Ordered probes over the known chat-completion response shapes.

use serde_json::Value;

/// Keys tried, in order, on an image object that has no `image_url.url`.
pub const IMAGE_FALLBACK_KEYS: [&str; 4] = ["url", "data", "content", "image"];

/// What a single extractor made of the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The shape is not present; try the next extractor.
    Miss,
    /// The shape is present and owns the outcome, even when it yields nothing.
    Committed(Option<String>),
}

pub struct Extractor {
    pub path: &'static str,
    pub probe: fn(&Value) -> Probe,
}

/// Strict priority order. The first extractor that does not miss wins.
pub const EXTRACTORS: [Extractor; 5] = [
    Extractor {
        path: "choices[0].message.images[0]",
        probe: message_images,
    },
    Extractor {
        path: "choices[0].message.content",
        probe: message_content,
    },
    Extractor {
        path: "choices[0].message.text",
        probe: message_text,
    },
    Extractor {
        path: "choices[0].text",
        probe: choice_text,
    },
    Extractor {
        path: "candidates[0].content.parts[0].text",
        probe: candidate_part_text,
    },
];

/// Run the extractors in order. Returns the winning path and its payload.
pub fn extract(body: &Value) -> Option<(&'static str, String)> {
    for extractor in EXTRACTORS.iter() {
        match (extractor.probe)(body) {
            Probe::Miss => continue,
            Probe::Committed(Some(payload)) => {
                log::debug!("✅ Extracted from: {}", extractor.path);
                return Some((extractor.path, payload));
            }
            Probe::Committed(None) => {
                log::debug!("📸 {} present but held no usable payload", extractor.path);
                return None;
            }
        }
    }
    None
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn found(value: Option<String>) -> Probe {
    match value {
        Some(payload) => Probe::Committed(Some(payload)),
        None => Probe::Miss,
    }
}

fn message_images(body: &Value) -> Probe {
    let first = match body.pointer("/choices/0/message/images").and_then(Value::as_array) {
        Some(images) if !images.is_empty() => &images[0],
        _ => return Probe::Miss,
    };

    if let Some(url) = non_empty_str(first.pointer("/image_url/url")) {
        return Probe::Committed(Some(url));
    }

    let payload = match first {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        // First key holding a non-empty string wins. A truthy non-string value
        // under an earlier key does not stop the search.
        Value::Object(map) => IMAGE_FALLBACK_KEYS
            .iter()
            .find_map(|key| non_empty_str(map.get(*key))),
        _ => None,
    };
    Probe::Committed(payload)
}

fn message_content(body: &Value) -> Probe {
    found(
        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string),
    )
}

fn message_text(body: &Value) -> Probe {
    found(non_empty_str(body.pointer("/choices/0/message/text")))
}

fn choice_text(body: &Value) -> Probe {
    found(non_empty_str(body.pointer("/choices/0/text")))
}

fn candidate_part_text(body: &Value) -> Probe {
    found(non_empty_str(
        body.pointer("/candidates/0/content/parts/0/text"),
    ))
}
