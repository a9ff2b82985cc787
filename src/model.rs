//! Text-generation seam between the orchestrator and an AI provider, plus the
//! classification of provider failures into retryable vs fatal.

use async_trait::async_trait;

use crate::rotator::Credential;

/// Sampling temperature used for question generation.
pub const GENERATION_TEMPERATURE: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseFormat {
  Text,
  Json,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationOptions {
  pub response_format: ResponseFormat,
  pub temperature: f32,
}

impl GenerationOptions {
  /// Structured JSON output at the fixed generation temperature.
  pub fn json() -> Self {
    Self { response_format: ResponseFormat::Json, temperature: GENERATION_TEMPERATURE }
  }
}

/// A provider that turns a prompt into raw text using the given credential.
/// Failures are reported as the provider's error message.
#[async_trait]
pub trait TextModel: Send + Sync {
  async fn generate(
    &self,
    prompt: &str,
    options: &GenerationOptions,
    credential: &Credential,
  ) -> Result<String, String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
  /// Quota or authentication problem tied to the credential; try the next one.
  Retryable,
  /// Anything else; give up on the request.
  Fatal,
}

const CREDENTIAL_FAILURE_MARKERS: [&str; 4] = ["quota", "429", "exceeded", "invalid api key"];

pub fn classify_failure(message: &str) -> FailureClass {
  let lower = message.to_lowercase();
  if CREDENTIAL_FAILURE_MARKERS.iter().any(|m| lower.contains(m)) {
    FailureClass::Retryable
  } else {
    FailureClass::Fatal
  }
}
