use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct AppError {
    pub message: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError { message: msg }
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError {
            message: msg.to_string(),
        }
    }
}

/// Why a selected file was not turned into an [`UploadedImage`](crate::models::classify_types::UploadedImage).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickError {
    #[error("not an image file (media type {media_type})")]
    InvalidFile { media_type: String },

    #[error("could not read file: {0}")]
    Unreadable(String),
}

/// Failure kinds of a single classify request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifyError {
    #[error("network failure: {message}")]
    NetworkFailure { message: String },

    #[error("server error: HTTP {status}")]
    ServerError { status: u16, body: String },

    #[error("malformed response: {message}")]
    ParseFailure { message: String },
}

impl ClassifyError {
    pub fn network(message: impl Into<String>) -> Self {
        ClassifyError::NetworkFailure {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        ClassifyError::ParseFailure {
            message: message.into(),
        }
    }

    /// Stable tag used as the `kind` field in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifyError::NetworkFailure { .. } => "network_failure",
            ClassifyError::ServerError { .. } => "server_error",
            ClassifyError::ParseFailure { .. } => "parse_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_display_leaves_body_out() {
        let err = ClassifyError::ServerError {
            status: 500,
            body: "internal error".to_string(),
        };
        assert_eq!(err.to_string(), "server error: HTTP 500");
        assert_eq!(err.kind(), "server_error");
    }

    #[test]
    fn kinds_are_distinct() {
        assert_eq!(ClassifyError::network("refused").kind(), "network_failure");
        assert_eq!(ClassifyError::parse("bad json").kind(), "parse_failure");
    }

    #[test]
    fn app_error_from_str() {
        let err: AppError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
