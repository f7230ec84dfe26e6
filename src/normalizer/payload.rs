//! Classification of an extracted payload into something an `<img>` can render.

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    DataUri,
    Base64,
    Url,
    Unknown,
}

impl PayloadKind {
    pub fn of(payload: &str) -> Self {
        if payload.starts_with("data:image/") {
            PayloadKind::DataUri
        } else if is_bare_base64(payload) {
            PayloadKind::Base64
        } else if payload.starts_with("http://") || payload.starts_with("https://") {
            PayloadKind::Url
        } else {
            PayloadKind::Unknown
        }
    }
}

/// Base64 alphabet with at most two trailing `=`.
///
/// Padded input must be a whole number of quads. Unpadded input is accepted
/// unless its length leaves a single dangling character.
pub fn is_bare_base64(s: &str) -> bool {
    let body = s.trim_end_matches('=');
    let padding = s.len() - body.len();

    if body.is_empty() || padding > 2 {
        return false;
    }
    if !body
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
    {
        return false;
    }
    if padding > 0 {
        s.len() % 4 == 0
    } else {
        body.len() % 4 != 1
    }
}

/// Trim and classify. Only bare base64 is rewritten.
pub fn normalize_payload(raw: &str) -> String {
    let payload = raw.trim();
    log::debug!(
        "📝 Content preview (first 200 chars): {}",
        payload.chars().take(200).collect::<String>()
    );

    match PayloadKind::of(payload) {
        PayloadKind::DataUri => {
            log::debug!("✅ Already a valid data URI");
            payload.to_string()
        }
        PayloadKind::Base64 => {
            log::debug!("🔧 Converting bare base64 to data URI");
            format!("{}{}", PNG_DATA_URI_PREFIX, payload)
        }
        PayloadKind::Url => {
            log::debug!("✅ Using image URL directly");
            payload.to_string()
        }
        PayloadKind::Unknown => {
            log::warn!("⚠️  Unknown image format, using as-is");
            log::debug!(
                "Content type detection: starts_with_data={} starts_with_http={} length={}",
                payload.starts_with("data:"),
                payload.starts_with("http"),
                payload.len()
            );
            payload.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_is_untouched() {
        for uri in [
            "data:image/png;base64,AAAA",
            "data:image/jpeg;base64,/9j/4AAQ",
            "data:image/webp;base64,!!not base64!!",
        ] {
            assert_eq!(normalize_payload(uri), uri);
            assert_eq!(normalize_payload(&normalize_payload(uri)), uri);
        }
    }

    #[test]
    fn test_bare_base64_is_wrapped() {
        assert_eq!(
            normalize_payload("  iVBORw0KGgoAAAANSUhEUgAAAAE=\n"),
            "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAE="
        );
        assert_eq!(
            normalize_payload("iVBORw0KGgo"),
            "data:image/png;base64,iVBORw0KGgo"
        );
    }

    #[test]
    fn test_base64_padding_rules() {
        assert!(is_bare_base64("AAAA"));
        assert!(is_bare_base64("AAA="));
        assert!(is_bare_base64("AA=="));
        assert!(is_bare_base64("AAAAAA"));
        assert!(!is_bare_base64("AAAAA"));
        assert!(!is_bare_base64("AA="));
        assert!(!is_bare_base64("A==="));
        assert!(!is_bare_base64("===="));
        assert!(!is_bare_base64(""));
        assert!(!is_bare_base64("AA-_"));
        assert!(!is_bare_base64("AB=C"));
    }

    #[test]
    fn test_urls_are_untouched() {
        assert_eq!(
            normalize_payload("https://cdn.example.com/avatar.png"),
            "https://cdn.example.com/avatar.png"
        );
        assert_eq!(PayloadKind::of("http://x/y"), PayloadKind::Url);
    }

    // Permissive on purpose: providers occasionally return other renderable
    // text. This documents current behavior rather than a guarantee.
    #[test]
    fn test_unknown_format_passes_through() {
        let markdown = "![avatar](https://cdn.example.com/a.png)";
        assert_eq!(PayloadKind::of(markdown), PayloadKind::Unknown);
        assert_eq!(normalize_payload(markdown), markdown);
    }
}
