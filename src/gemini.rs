//! Minimal Gemini client for our use-case.
//!
//! We only call `models/{model}:generateContent` and request either plain text
//! or JSON. Calls are instrumented and log the model, latency, and response size
//! (not contents).
//!
//! NOTE: The API key is passed per call and only ever logged redacted.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::model::{GenerationOptions, ResponseFormat, TextModel};
use crate::rotator::Credential;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  pub base_url: String,
  pub model: String,
}

impl Gemini {
  pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.to_string(),
    })
  }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url, self.model)
  }
}

#[async_trait]
impl TextModel for Gemini {
  #[instrument(level = "info", skip(self, prompt, credential), fields(model = %self.model, key = %credential, prompt_len = prompt.len()))]
  async fn generate(
    &self,
    prompt: &str,
    options: &GenerationOptions,
    credential: &Credential,
  ) -> Result<String, String> {
    let req = build_request(prompt, options);
    let start = Instant::now();

    let res = self.client.post(self.endpoint())
      .header(USER_AGENT, "question-maker-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(API_KEY_HEADER, credential.expose())
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_gemini_error(&body).unwrap_or(body);
      error!(elapsed = ?start.elapsed(), %status, "Gemini call failed");
      return Err(format!("Gemini HTTP {}: {}", status, msg));
    }

    let body: GenerateContentResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage_metadata {
      info!(prompt_tokens = ?usage.prompt_token_count, candidates_tokens = ?usage.candidates_token_count, total_tokens = ?usage.total_token_count, "Gemini usage");
    }
    let text = response_text(&body)?;
    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Gemini response received");
    Ok(text)
  }
}

fn build_request(prompt: &str, options: &GenerationOptions) -> GenerateContentRequest {
  GenerateContentRequest {
    contents: vec![Content {
      role: Some("user".into()),
      parts: vec![Part { text: Some(prompt.to_string()) }],
    }],
    generation_config: GenerationConfig {
      response_mime_type: match options.response_format {
        ResponseFormat::Json => Some("application/json".into()),
        ResponseFormat::Text => None,
      },
      temperature: options.temperature,
    },
  }
}

/// Concatenated text parts of the first candidate.
fn response_text(body: &GenerateContentResponse) -> Result<String, String> {
  let candidate = body.candidates.first().ok_or_else(|| "Gemini returned no candidates".to_string())?;
  let text: String = candidate
    .content
    .as_ref()
    .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
    .unwrap_or_default();
  if text.trim().is_empty() {
    let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
    return Err(format!("Gemini returned empty content (finish reason: {})", reason));
  }
  Ok(text)
}

// --- Gemini DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  contents: Vec<Content>,
  generation_config: GenerationConfig,
}
#[derive(Serialize, Deserialize)]
struct Content {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  #[serde(default)]
  parts: Vec<Part>,
}
#[derive(Serialize, Deserialize)]
struct Part {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  text: Option<String>,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  #[serde(skip_serializing_if = "Option::is_none")]
  response_mime_type: Option<String>,
  temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  #[serde(default)] content: Option<Content>,
  #[serde(default)] finish_reason: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}

/// Try to extract a clean error message from a Gemini error body. Rejected
/// keys are reported with an `invalid api key` prefix so callers can tell
/// credential problems apart from other 400s.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
    #[serde(default)] details: Vec<serde_json::Value>,
  }
  let w = serde_json::from_str::<EWrap>(body).ok()?;
  let key_rejected = w.error.message.contains("API key not valid")
    || w.error.details.iter().any(|d| d.get("reason").and_then(|r| r.as_str()) == Some("API_KEY_INVALID"));
  if key_rejected {
    Some(format!("invalid api key: {}", w.error.message))
  } else {
    Some(w.error.message)
  }
}
