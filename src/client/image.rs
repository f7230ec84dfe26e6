use crate::error::{AvatarError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};

pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
pub const ACCEPTED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/jpg"];

pub fn validate_image(mime: &str, size: u64) -> Result<()> {
    if !ACCEPTED_TYPES.contains(&mime) {
        return Err(AvatarError::Image(
            "only JPG and PNG images are supported".into(),
        ));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(AvatarError::Image("image must not exceed 5MB".into()));
    }
    Ok(())
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URI into its mime type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| AvatarError::Image("not a data URI".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AvatarError::Image("data URI has no payload".into()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| AvatarError::Image("only base64 data URIs are supported".into()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AvatarError::Image(format!("failed to decode base64 image: {}", e)))?;
    Ok((mime.to_string(), bytes))
}

/// Read a user photo, enforcing type and size limits.
pub async fn file_to_data_uri(path: &Path) -> Result<String> {
    let mime = mime_for_path(path).unwrap_or("application/octet-stream");
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| AvatarError::Image(format!("failed to read {}: {}", path.display(), e)))?;
    validate_image(mime, metadata.len())?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AvatarError::Image(format!("failed to read {}: {}", path.display(), e)))?;
    Ok(encode_data_uri(mime, &bytes))
}

/// The style reference must exist; its absence stops the whole flow.
pub async fn load_reference_image(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        log::error!("Failed to load reference image: {}", e);
        AvatarError::Image(format!(
            "failed to load the reference image, make sure {} exists",
            path.display()
        ))
    })?;
    Ok(encode_data_uri(
        mime_for_path(path).unwrap_or("image/jpeg"),
        &bytes,
    ))
}

/// Write a generated avatar as `avatar-<millis>.png` in `dir`.
///
/// Data URIs are decoded locally; URLs are downloaded with `client`.
pub async fn save_avatar(client: &reqwest::Client, image_url: &str, dir: &Path) -> Result<PathBuf> {
    let bytes = if image_url.starts_with("data:") {
        decode_data_uri(image_url)?.1
    } else if image_url.starts_with("http://") || image_url.starts_with("https://") {
        let response = client
            .get(image_url)
            .send()
            .await
            .map_err(|e| AvatarError::Image(format!("failed to download avatar: {}", e)))?;
        if !response.status().is_success() {
            return Err(AvatarError::Image(format!(
                "failed to download avatar: HTTP {}",
                response.status()
            )));
        }
        response
            .bytes()
            .await
            .map_err(|e| AvatarError::Image(format!("failed to download avatar: {}", e)))?
            .to_vec()
    } else {
        return Err(AvatarError::Image("unsupported image URL".into()));
    };

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AvatarError::Storage(e.to_string()))?;
    let path = dir.join(format!("avatar-{}.png", chrono::Utc::now().timestamp_millis()));
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AvatarError::Storage(e.to_string()))?;
    log::info!("💾 Avatar saved to: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_image() {
        assert!(validate_image("image/png", 1024).is_ok());
        assert!(validate_image("image/jpg", MAX_IMAGE_BYTES).is_ok());
        assert!(validate_image("image/gif", 10).is_err());
        assert!(validate_image("image/jpeg", MAX_IMAGE_BYTES + 1).is_err());
    }

    #[test]
    fn test_data_uri_encoding() {
        let uri = encode_data_uri("image/png", b"hello");
        assert_eq!(uri, "data:image/png;base64,aGVsbG8=");
        let (mime, bytes) = decode_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"hello");
        assert!(decode_data_uri("https://x/y.png").is_err());
        assert!(decode_data_uri("data:image/png,raw").is_err());
    }

    #[tokio::test]
    async fn test_file_to_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("me.JPG");
        std::fs::write(&photo, [0xFF, 0xD8, 0xFF]).unwrap();
        assert_eq!(file_to_data_uri(&photo).await.unwrap(), "data:image/jpeg;base64,/9j/");

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "x").unwrap();
        assert!(file_to_data_uri(&text).await.is_err());
    }

    #[tokio::test]
    async fn test_reference_image_is_read_as_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("refer_avatar.png");
        std::fs::write(&reference, b"hello").unwrap();
        assert_eq!(
            load_reference_image(&reference).await.unwrap(),
            "data:image/png;base64,aGVsbG8="
        );
    }

    #[tokio::test]
    async fn test_missing_reference_image_is_hard_error() {
        let err = load_reference_image(Path::new("/definitely/missing/refer_avatar.jpg"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("refer_avatar.jpg"));
    }

    #[tokio::test]
    async fn test_save_data_uri_avatar() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_avatar(
            &reqwest::Client::new(),
            "data:image/png;base64,aGVsbG8=",
            dir.path(),
        )
        .await
        .unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("avatar-"));
        assert_eq!(std::fs::read(path).unwrap(), b"hello");

        assert!(save_avatar(&reqwest::Client::new(), "not-an-image", dir.path())
            .await
            .is_err());
    }
}
