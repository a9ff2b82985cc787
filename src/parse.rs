//! Recovery of a single question object from raw model output.
//!
//! Structured-output mode usually yields clean JSON, but not always: stray
//! control characters, prose around the object, a wrapping array, or raw
//! newlines inside string values all show up in practice. Recovery is an
//! ordered chain of pure strategies; the first one that yields JSON wins.

use serde_json::Value;
use tracing::debug;

use crate::domain::Difficulty;
use crate::error::ParseError;
use crate::util::trunc_for_log;

const EXCERPT_CHARS: usize = 200;

type Strategy = fn(&str) -> Result<Value, ParseError>;

const STRATEGIES: &[(&str, Strategy)] = &[("direct", parse_direct), ("repaired", parse_repaired)];

/// Parse raw model text into a JSON object (a map), unwrapping a leading array.
pub fn parse_response(raw: &str) -> Result<serde_json::Map<String, Value>, ParseError> {
  let mut last_err = None;
  for (name, strategy) in STRATEGIES {
    match strategy(raw) {
      Ok(value) => {
        debug!(target: "generator", strategy = *name, "Model response parsed");
        return single_object(value);
      }
      Err(e) => {
        debug!(target: "generator", strategy = *name, error = %e, "Parse strategy failed");
        last_err = Some(e);
      }
    }
  }
  Err(last_err.unwrap_or_else(|| unparseable("no parse strategy configured", raw)))
}

/// Strategy 1: the whole trimmed text is JSON.
fn parse_direct(raw: &str) -> Result<Value, ParseError> {
  serde_json::from_str(raw.trim()).map_err(|e| unparseable(&e.to_string(), raw))
}

/// Strategy 2: strip control characters, cut to the outermost braces, escape
/// raw newlines/tabs/carriage returns inside string literals, parse again.
fn parse_repaired(raw: &str) -> Result<Value, ParseError> {
  let cleaned = strip_control_chars(raw);
  let (start, end) = match (cleaned.find('{'), cleaned.rfind('}')) {
    (Some(s), Some(e)) if s < e => (s, e),
    _ => return Err(unparseable("No JSON found in response", raw)),
  };
  let candidate = escape_raw_whitespace_in_strings(&cleaned[start..=end]);
  serde_json::from_str(&candidate).map_err(|e| unparseable(&e.to_string(), raw))
}

/// Removes U+0000–U+0008, U+000B–U+000C, U+000E–U+001F and U+007F–U+009F.
/// Tab, newline and carriage return are kept for the escaping pass.
pub fn strip_control_chars(s: &str) -> String {
  s.chars()
    .filter(|&c| {
      !matches!(c,
        '\u{00}'..='\u{08}' | '\u{0B}'..='\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}'..='\u{9F}')
    })
    .collect()
}

/// Escapes literal `\n`, `\t` and `\r` that appear inside JSON string literals.
/// Whitespace between tokens is left alone so pretty-printed objects survive.
pub fn escape_raw_whitespace_in_strings(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + 16);
  let mut in_string = false;
  let mut escaped = false;
  for c in s.chars() {
    if in_string {
      match c {
        _ if escaped => {
          escaped = false;
          out.push(c);
        }
        '\\' => {
          escaped = true;
          out.push(c);
        }
        '"' => {
          in_string = false;
          out.push(c);
        }
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        _ => out.push(c),
      }
    } else {
      if c == '"' {
        in_string = true;
      }
      out.push(c);
    }
  }
  out
}

fn single_object(value: Value) -> Result<serde_json::Map<String, Value>, ParseError> {
  let value = match value {
    Value::Array(items) => items.into_iter().next().ok_or(ParseError::EmptyResponse)?,
    other => other,
  };
  match value {
    Value::Object(map) => Ok(map),
    other => Err(ParseError::MalformedResponse(format!("got {}", json_kind(&other)))),
  }
}

fn json_kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

fn unparseable(reason: &str, raw: &str) -> ParseError {
  ParseError::UnparseableResponse {
    reason: reason.to_string(),
    excerpt: trunc_for_log(raw, EXCERPT_CHARS),
  }
}

/// Question fields as produced by the model, after lenient coercion.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedQuestion {
  pub question_statement: String,
  pub solution: String,
  pub options: Vec<String>,
  pub answer: String,
  pub difficulty_level: Difficulty,
}

impl ParsedQuestion {
  /// Pull the contract fields out of a parsed object. Statement and solution
  /// are required; everything else has a default.
  pub fn from_object(obj: &serde_json::Map<String, Value>) -> Result<Self, ParseError> {
    let required = |key: &str| -> Result<String, ParseError> {
      match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(ParseError::MalformedResponse(format!("missing string field '{key}'"))),
      }
    };

    let options = match obj.get("options") {
      Some(Value::Array(items)) => items.iter().map(scalar_text).collect(),
      _ => Vec::new(),
    };
    let answer = obj.get("answer").map(scalar_text).unwrap_or_default();
    let difficulty_level = obj
      .get("difficulty_level")
      .and_then(Value::as_str)
      .map(Difficulty::from_loose)
      .unwrap_or_default();

    Ok(Self {
      question_statement: required("question_statement")?,
      solution: required("solution")?,
      options,
      answer,
      difficulty_level,
    })
  }
}

/// Text form of a JSON scalar: strings verbatim, numbers/bools printed, null empty.
fn scalar_text(v: &Value) -> String {
  match v {
    Value::String(s) => s.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}
