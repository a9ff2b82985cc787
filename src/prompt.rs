//! Deterministic prompt rendering for question generation.

use crate::config::Prompts;
use crate::domain::{Chapter, GeneratedQuestion, QuestionType, ReferenceQuestion, Topic};
use crate::util::fill_template;

/// Reference statements quoted in the prompt.
pub const PROMPT_REFERENCE_LIMIT: usize = 3;

/// Everything fetched from the catalog to ground one generation.
#[derive(Clone, Debug)]
pub struct Grounding {
  pub topic: Topic,
  pub chapter: Option<Chapter>,
  pub reference: Vec<ReferenceQuestion>,
  pub previous: Vec<GeneratedQuestion>,
}

pub fn render_prompt(prompts: &Prompts, question_type: QuestionType, g: &Grounding) -> String {
  let reference = statements_json(
    g.reference
      .iter()
      .filter_map(|q| q.question_statement.as_deref())
      .take(PROMPT_REFERENCE_LIMIT),
  );
  let previous = statements_json(g.previous.iter().map(|q| q.question_statement.as_str()));

  fill_template(
    &prompts.question_template,
    &[
      ("question_type", question_type.as_str()),
      ("topic_name", g.topic.name.as_str()),
      ("topic_description", g.topic.description.as_deref().unwrap_or("")),
      ("chapter_name", g.chapter.as_ref().map(|c| c.name.as_str()).unwrap_or("")),
      ("reference_questions", reference.as_str()),
      ("previous_questions", previous.as_str()),
    ],
  )
}

/// Pretty JSON array of statements, `[]` when there are none.
fn statements_json<'a>(statements: impl Iterator<Item = &'a str>) -> String {
  let list: Vec<&str> = statements.collect();
  serde_json::to_string_pretty(&list).unwrap_or_else(|_| "[]".into())
}
