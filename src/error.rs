use crate::models::GenerateResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AvatarError {
    /// Missing or malformed request fields. Raised before any outbound call.
    #[error("{0}")]
    Validation(String),

    /// The provider call failed or answered with a non-2xx status.
    #[error("{message}")]
    Transport { status: u16, message: String },

    /// The provider reported a native finish reason other than STOP.
    #[error("AI generation did not complete normally. Reason: {0}")]
    IncompleteGeneration(String),

    /// No known response shape yielded an image payload.
    #[error("Response format not recognized, could not extract content. Check the backend logs for details.")]
    Extraction,

    #[error("{0}")]
    Unexpected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AvatarError {
    /// HTTP status the proxy answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AvatarError::Validation(_) => 400,
            AvatarError::Transport { status, .. } if *status >= 400 => *status,
            _ => 500,
        }
    }

    /// Render the error as the canonical failure result.
    pub fn into_result(self) -> GenerateResult {
        GenerateResult::failure(self.to_string())
    }
}

impl From<serde_json::Error> for AvatarError {
    fn from(e: serde_json::Error) -> Self {
        AvatarError::Serialization(e.to_string())
    }
}

#[cfg(feature = "server")]
impl actix_web::ResponseError for AvatarError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(AvatarError::status_code(self))
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(actix_web::ResponseError::status_code(self))
            .json(GenerateResult::failure(self.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, AvatarError>;
