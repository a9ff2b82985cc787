//! Domain models: taxonomy rows read from the catalog, question types, and the
//! generated question record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Which kind of question the model is asked to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
  /// Multiple choice, exactly one correct option.
  #[serde(rename = "MCQ")]
  Mcq,
  /// Multiple select, one or more correct options.
  #[serde(rename = "MSQ")]
  Msq,
  /// Numerical answer, no options.
  #[serde(rename = "NAT")]
  Nat,
  /// Subjective, free text answer.
  #[serde(rename = "SUB")]
  Sub,
}

impl QuestionType {
  pub fn as_str(self) -> &'static str {
    match self {
      QuestionType::Mcq => "MCQ",
      QuestionType::Msq => "MSQ",
      QuestionType::Nat => "NAT",
      QuestionType::Sub => "SUB",
    }
  }

  /// MCQ and MSQ carry an options list; NAT and SUB never do.
  pub fn has_options(self) -> bool {
    matches!(self, QuestionType::Mcq | QuestionType::Msq)
  }
}

impl fmt::Display for QuestionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  /// Case-insensitive match; anything unrecognised falls back to Medium.
  pub fn from_loose(s: &str) -> Self {
    match s.trim().to_ascii_lowercase().as_str() {
      "easy" => Difficulty::Easy,
      "hard" => Difficulty::Hard,
      _ => Difficulty::Medium,
    }
  }
}

/// Stored rows hold whatever the model returned, so decoding is as lenient as
/// `from_loose`; null reads as Medium.
impl<'de> Deserialize<'de> for Difficulty {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(Difficulty::from_loose).unwrap_or_default())
  }
}

// --- Taxonomy rows (exam -> course -> subject -> unit -> chapter -> topic) ---

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exam {
  pub id: String,
  pub name: String,
  #[serde(default)] pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
  pub id: String,
  pub exam_id: String,
  pub name: String,
  #[serde(default)] pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subject {
  pub id: String,
  pub course_id: String,
  pub name: String,
  #[serde(default)] pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
  pub id: String,
  pub subject_id: String,
  pub name: String,
  #[serde(default)] pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chapter {
  pub id: String,
  pub unit_id: String,
  pub name: String,
  #[serde(default)] pub description: Option<String>,
}

/// Leaf of the taxonomy; the thing a question targets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Topic {
  pub id: String,
  pub chapter_id: String,
  pub name: String,
  #[serde(default)] pub description: Option<String>,
  #[serde(default)] pub weightage: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Part {
  pub id: String,
  pub part_name: String,
  pub course_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Slot {
  pub id: String,
  pub slot_name: String,
  pub course_id: String,
}

/// Existing question shown to the model as context. Column shapes vary across
/// imports, so options and answer are kept as raw JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReferenceQuestion {
  #[serde(default)] pub question_statement: Option<String>,
  #[serde(default)] pub options: Option<serde_json::Value>,
  #[serde(default)] pub answer: Option<serde_json::Value>,
  #[serde(default)] pub solution: Option<String>,
  #[serde(default)] pub question_type: Option<String>,
}

// --- Generation ---

/// Caller-supplied generation request. Only `question_type` membership is checked.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GenerationRequest {
  pub topic_id: String,
  pub question_type: QuestionType,
  #[serde(default)] pub part_id: Option<String>,
  #[serde(default)] pub slot_id: Option<String>,
}

/// A persisted, model-generated question. Created once per successful
/// generation and never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeneratedQuestion {
  pub id: String,
  pub topic_id: String,
  /// Snapshot of the topic name at generation time.
  pub topic_name: String,
  pub question_statement: String,
  pub question_type: QuestionType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  pub answer: String,
  pub solution: String,
  #[serde(default)] pub difficulty_level: Difficulty,
  #[serde(default)] pub part_id: Option<String>,
  #[serde(default)] pub slot_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
