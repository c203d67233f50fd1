//! Error handling and custom error types
//!
//! Provides unified error handling across the relay using thiserror. The HTTP
//! mapping of each variant lives in `server::error`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing API Key")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable, machine-readable code reported next to the error detail.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthorized => "UNAUTHORIZED",
            Error::InvalidRequest(_) => "INVALID_REQUEST",
            Error::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Error::AiProvider(_) | Error::Http(_) => "UPSTREAM_ERROR",
            Error::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Error::Io(_) | Error::EnvVar(_) | Error::Config(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
