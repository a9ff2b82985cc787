//! Question generation: gather grounding from the catalog, render the prompt,
//! call the model with credential rotation, parse and validate the output, then
//! persist the result.
//!
//! Each request walks Gathering -> Prompting -> Generating -> Parsing ->
//! Validating -> Persisting and stops at the first failure. Persisting is the
//! last step, so a failed request never leaves a record behind.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::catalog::{CatalogStore, GENERATED_QUESTION_LIMIT, REFERENCE_QUESTION_LIMIT};
use crate::config::Prompts;
use crate::domain::{GeneratedQuestion, GenerationRequest};
use crate::error::GenerationError;
use crate::model::{classify_failure, FailureClass, GenerationOptions, TextModel};
use crate::parse::{parse_response, ParsedQuestion};
use crate::prompt::{render_prompt, Grounding};
use crate::rotator::CredentialRotator;
use crate::util::trunc_for_log;
use crate::validate::validate_answer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
  Gathering,
  Prompting,
  Generating,
  Parsing,
  Validating,
  Persisting,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Stage::Gathering => "gathering",
      Stage::Prompting => "prompting",
      Stage::Generating => "generating",
      Stage::Parsing => "parsing",
      Stage::Validating => "validating",
      Stage::Persisting => "persisting",
    };
    f.write_str(s)
  }
}

pub struct QuestionGenerator {
  catalog: Arc<dyn CatalogStore>,
  model: Arc<dyn TextModel>,
  rotator: Arc<CredentialRotator>,
  prompts: Prompts,
}

impl QuestionGenerator {
  pub fn new(
    catalog: Arc<dyn CatalogStore>,
    model: Arc<dyn TextModel>,
    rotator: Arc<CredentialRotator>,
    prompts: Prompts,
  ) -> Self {
    Self { catalog, model, rotator, prompts }
  }

  /// Run one generation request end to end.
  #[instrument(level = "info", skip(self, req), fields(topic_id = %req.topic_id, question_type = %req.question_type))]
  pub async fn generate(&self, req: &GenerationRequest) -> Result<GeneratedQuestion, GenerationError> {
    let result = self.run(req).await;
    match &result {
      Ok(q) => info!(target: "generator", id = %q.id, topic = %q.topic_name, difficulty = ?q.difficulty_level, "Question generated"),
      Err(e) => error!(target: "generator", error = %e, "Question generation failed"),
    }
    result
  }

  async fn run(&self, req: &GenerationRequest) -> Result<GeneratedQuestion, GenerationError> {
    debug!(target: "generator", stage = %Stage::Gathering);
    let grounding = self.gather(&req.topic_id).await?;

    debug!(target: "generator", stage = %Stage::Prompting);
    let prompt = render_prompt(&self.prompts, req.question_type, &grounding);

    debug!(target: "generator", stage = %Stage::Generating, prompt_len = prompt.len());
    let raw = self.call_model(&prompt).await?;

    debug!(target: "generator", stage = %Stage::Parsing, raw_len = raw.len());
    let object = parse_response(&raw)?;
    let parsed = ParsedQuestion::from_object(&object)?;

    debug!(target: "generator", stage = %Stage::Validating);
    if !validate_answer(req.question_type, &parsed.options, &parsed.answer) {
      warn!(target: "generator", answer = %trunc_for_log(&parsed.answer, 80), options = parsed.options.len(), "Generated answer failed validation");
      return Err(GenerationError::InvalidGeneratedAnswer(req.question_type));
    }

    debug!(target: "generator", stage = %Stage::Persisting);
    let question = assemble(req, &grounding, parsed);
    let inserted = self.catalog.insert_generated_question(&question).await.map_err(|e| {
      GenerationError::Persistence(e.to_string())
    })?;
    if !inserted {
      return Err(GenerationError::Persistence("no row inserted".into()));
    }
    Ok(question)
  }

  /// Topic is mandatory; chapter and example questions are best-effort context.
  async fn gather(&self, topic_id: &str) -> Result<Grounding, GenerationError> {
    let topic = self
      .catalog
      .get_topic(topic_id)
      .await?
      .ok_or_else(|| GenerationError::NotFound(topic_id.to_string()))?;

    let chapter = self.catalog.get_chapter(&topic.chapter_id).await.unwrap_or_else(|e| {
      warn!(target: "generator", chapter_id = %topic.chapter_id, error = %e, "Chapter lookup failed; continuing without it");
      None
    });
    let reference = self
      .catalog
      .list_reference_questions(topic_id, REFERENCE_QUESTION_LIMIT)
      .await
      .unwrap_or_else(|e| {
        warn!(target: "generator", error = %e, "Reference questions unavailable");
        Vec::new()
      });
    let previous = self
      .catalog
      .list_generated_questions(topic_id, GENERATED_QUESTION_LIMIT)
      .await
      .unwrap_or_else(|e| {
        warn!(target: "generator", error = %e, "Previously generated questions unavailable");
        Vec::new()
      });

    debug!(target: "generator", has_chapter = chapter.is_some(), reference = reference.len(), previous = previous.len(), "Grounding gathered");
    Ok(Grounding { topic, chapter, reference, previous })
  }

  /// Try each pool credential at most once. Quota/auth failures rotate to the
  /// next credential; anything else ends the request.
  async fn call_model(&self, prompt: &str) -> Result<String, GenerationError> {
    let attempts = self.rotator.len();
    if attempts == 0 {
      return Err(GenerationError::NoCredentials);
    }
    let options = GenerationOptions::json();

    let mut attempt = 0;
    loop {
      attempt += 1;
      let credential = self.rotator.next().map_err(|_| GenerationError::NoCredentials)?;
      match self.model.generate(prompt, &options, &credential).await {
        Ok(text) => {
          debug!(target: "generator", attempt, credential = %credential, "Model call succeeded");
          return Ok(text);
        }
        Err(msg) => match classify_failure(&msg) {
          FailureClass::Retryable => {
            self.rotator.mark_failed(&credential);
            if attempt >= attempts {
              return Err(GenerationError::CredentialsExhausted(msg));
            }
            warn!(target: "generator", attempt, attempts, credential = %credential, error = %msg, "Credential rejected; rotating");
          }
          FailureClass::Fatal => return Err(GenerationError::Upstream(msg)),
        },
      }
    }
  }
}

fn assemble(req: &GenerationRequest, g: &Grounding, parsed: ParsedQuestion) -> GeneratedQuestion {
  let now = Utc::now();
  GeneratedQuestion {
    id: Uuid::new_v4().to_string(),
    topic_id: req.topic_id.clone(),
    topic_name: g.topic.name.clone(),
    question_statement: parsed.question_statement,
    question_type: req.question_type,
    options: req.question_type.has_options().then_some(parsed.options),
    answer: parsed.answer,
    solution: parsed.solution,
    difficulty_level: parsed.difficulty_level,
    part_id: req.part_id.clone(),
    slot_id: req.slot_id.clone(),
    created_at: now,
    updated_at: now,
  }
}
