//! Error types for the question maker backend.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::QuestionType;

/// Failure to coerce raw model output into a question object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No JSON object could be recovered. Carries a prefix of the raw text.
    #[error("{reason}. Raw response: {excerpt}")]
    UnparseableResponse { reason: String, excerpt: String },

    /// The model returned an empty array.
    #[error("AI returned empty array response")]
    EmptyResponse,

    /// JSON was recovered but is not the expected object shape.
    #[error("AI response is not a valid object: {0}")]
    MalformedResponse(String),
}

/// Catalog store transport and decoding failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("store response could not be decoded: {0}")]
    Decode(String),
}

/// Startup configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidVar { name: &'static str, value: String },

    #[error("failed to read prompts file {path}: {source}")]
    PromptsRead {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse prompts file {path}: {source}")]
    PromptsParse {
        path: String,
        source: toml::de::Error,
    },
}

/// Terminal failure of a single generation request.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Topic not found")]
    NotFound(String),

    #[error("No Gemini API keys configured")]
    NoCredentials,

    #[error("All Gemini API keys exhausted. Last error: {0}")]
    CredentialsExhausted(String),

    #[error("Gemini API error: {0}")]
    Upstream(String),

    #[error("Error parsing AI response: {0}")]
    GenerationFailed(#[from] ParseError),

    #[error("Generated question doesn't meet {0} validation rules")]
    InvalidGeneratedAnswer(QuestionType),

    #[error("Error saving question to database: {0}")]
    Persistence(String),

    #[error("Error reading catalog: {0}")]
    Store(#[from] StoreError),
}

impl GenerationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GenerationError::NotFound(_) => StatusCode::NOT_FOUND,
            GenerationError::CredentialsExhausted(_) => StatusCode::TOO_MANY_REQUESTS,
            GenerationError::InvalidGeneratedAnswer(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP-facing error. Rendered as `{"detail": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Error fetching {what}: {source}")]
    Fetch {
        what: &'static str,
        source: StoreError,
    },

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn fetch(what: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |source| ApiError::Fetch { what, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Generation(e) => e.status_code(),
            ApiError::Fetch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
