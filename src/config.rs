//! Runtime configuration: environment variables plus optional prompt overrides
//! loaded from TOML.
//!
//! See `Config::from_env` for the variables read and `Prompts` for the TOML schema.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::error::ConfigError;
use crate::rotator::Credential;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct Config {
  pub port: u16,
  /// Empty means any origin.
  pub cors_origins: Vec<String>,
  pub supabase_url: String,
  pub supabase_key: String,
  pub gemini_keys: Vec<Credential>,
  pub gemini_base_url: String,
  pub gemini_model: String,
  pub gemini_timeout: Duration,
  pub prompts: Prompts,
}

impl Config {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Build from an arbitrary variable source (the process env in production).
  pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let required = |name: &'static str| {
      var(name).filter(|v| !v.trim().is_empty()).ok_or(ConfigError::MissingVar(name))
    };

    let port = match var("PORT") {
      Some(p) => p.trim().parse::<u16>().map_err(|_| ConfigError::InvalidVar { name: "PORT", value: p })?,
      None => DEFAULT_PORT,
    };
    let gemini_timeout = match var("GEMINI_TIMEOUT_SECS") {
      Some(s) => s
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidVar { name: "GEMINI_TIMEOUT_SECS", value: s })?,
      None => Duration::from_secs(DEFAULT_GEMINI_TIMEOUT_SECS),
    };

    let prompts = match var("PROMPTS_CONFIG_PATH") {
      Some(path) => load_prompts(&path).unwrap_or_else(|e| {
        error!(target: "question_maker", error = %e, "Falling back to built-in prompts");
        Prompts::default()
      }),
      None => Prompts::default(),
    };

    Ok(Self {
      port,
      cors_origins: split_list(&var("CORS_ORIGINS").unwrap_or_else(|| "*".into()))
        .into_iter()
        .filter(|o| o != "*")
        .collect(),
      supabase_url: required("SUPABASE_URL")?.trim_end_matches('/').to_string(),
      supabase_key: required("SUPABASE_ANON_KEY")?,
      gemini_keys: split_list(&var("GEMINI_API_KEYS").unwrap_or_default())
        .into_iter()
        .map(Credential::new)
        .collect(),
      gemini_base_url: var("GEMINI_BASE_URL")
        .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into())
        .trim_end_matches('/')
        .to_string(),
      gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
      gemini_timeout,
      prompts,
    })
  }
}

/// Comma separated list; entries are trimmed and blanks dropped.
pub fn split_list(raw: &str) -> Vec<String> {
  raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

/// Prompt text for question generation. Any subset may be overridden in TOML.
///
/// `question_template` placeholders: `{question_type}`, `{topic_name}`,
/// `{topic_description}`, `{chapter_name}`, `{reference_questions}`,
/// `{previous_questions}`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Prompts {
  pub question_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self { question_template: DEFAULT_QUESTION_TEMPLATE.into() }
  }
}

const DEFAULT_QUESTION_TEMPLATE: &str = r#"
You are an expert question creator for educational content. Generate a {question_type} type question for the following topic:

Topic: {topic_name}
Description: {topic_description}
Chapter: {chapter_name}

Question Type Rules:
- MCQ: Multiple Choice Question with exactly ONE correct answer (4 options)
- MSQ: Multiple Select Question with ONE OR MORE correct answers (4 options)
- NAT: Numerical Answer Type with a numerical answer (no options)
- SUB: Subjective question with descriptive answer (no options)

Context from existing questions (DO NOT COPY, use for inspiration only):
{reference_questions}

Previously generated questions (AVOID similar content):
{previous_questions}

Requirements:
1. Generate a FRESH, ORIGINAL question that tests understanding of the topic
2. Make it educationally valuable and appropriately challenging
3. For MCQ/MSQ: Provide exactly 4 options
4. Ensure the answer follows the question type rules
5. Provide a detailed solution explanation

Please respond in the following JSON format:
{
    "question_statement": "Your question here",
    "options": ["Option 1", "Option 2", "Option 3", "Option 4"] or null for NAT/SUB,
    "answer": "For MCQ: single number (0-3), for MSQ: comma-separated numbers (0,1,2), for NAT: numerical value, for SUB: descriptive answer",
    "solution": "Detailed step-by-step solution",
    "difficulty_level": "Easy/Medium/Hard"
}
"#;

/// Load prompt overrides from a TOML file.
pub fn load_prompts(path: &str) -> Result<Prompts, ConfigError> {
  let raw = std::fs::read_to_string(path)
    .map_err(|source| ConfigError::PromptsRead { path: path.to_string(), source })?;
  let prompts = toml::from_str::<Prompts>(&raw)
    .map_err(|source| ConfigError::PromptsParse { path: path.to_string(), source })?;
  info!(target: "question_maker", %path, "Loaded prompt overrides (TOML)");
  Ok(prompts)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
      pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn test_minimal_env() {
    let cfg = Config::from_lookup(lookup(&[
      ("SUPABASE_URL", "https://db.example.co/"),
      ("SUPABASE_ANON_KEY", "anon"),
    ]))
    .unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.supabase_url, "https://db.example.co");
    assert!(cfg.gemini_keys.is_empty());
    assert!(cfg.cors_origins.is_empty());
    assert_eq!(cfg.gemini_model, DEFAULT_GEMINI_MODEL);
    assert_eq!(cfg.prompts, Prompts::default());
  }

  #[test]
  fn test_key_list_and_origins() {
    let cfg = Config::from_lookup(lookup(&[
      ("SUPABASE_URL", "https://db.example.co"),
      ("SUPABASE_ANON_KEY", "anon"),
      ("GEMINI_API_KEYS", " k1, ,k2 ,"),
      ("CORS_ORIGINS", "https://a.example,https://b.example"),
      ("PORT", "8080"),
    ]))
    .unwrap();
    let keys: Vec<&str> = cfg.gemini_keys.iter().map(|k| k.expose()).collect();
    assert_eq!(keys, vec!["k1", "k2"]);
    assert_eq!(cfg.cors_origins.len(), 2);
    assert_eq!(cfg.port, 8080);
  }

  #[test]
  fn test_missing_supabase_url() {
    let err = Config::from_lookup(lookup(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
    assert!(matches!(err, ConfigError::MissingVar("SUPABASE_URL")));
  }

  #[test]
  fn test_invalid_port() {
    let err = Config::from_lookup(lookup(&[
      ("SUPABASE_URL", "u"),
      ("SUPABASE_ANON_KEY", "k"),
      ("PORT", "http"),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidVar { name: "PORT", .. }));
  }

  #[test]
  fn test_partial_prompt_toml_uses_defaults() {
    let p: Prompts = toml::from_str("").unwrap();
    assert_eq!(p, Prompts::default());
    let p: Prompts = toml::from_str("question_template = \"Make a {question_type}\"").unwrap();
    assert_eq!(p.question_template, "Make a {question_type}");
  }
}
