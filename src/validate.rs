//! Structural answer checks per question type.

use crate::domain::QuestionType;

/// True when `answer` is well-formed for `question_type` given `options`.
/// Never fails: anything unparseable is simply invalid.
pub fn validate_answer(question_type: QuestionType, options: &[String], answer: &str) -> bool {
  match question_type {
    QuestionType::Mcq => match option_indices(answer) {
      Some(idx) => idx.len() == 1 && in_range(&idx, options.len()),
      None => false,
    },
    // Duplicate indices are tolerated.
    QuestionType::Msq => match option_indices(answer) {
      Some(idx) => !idx.is_empty() && in_range(&idx, options.len()),
      None => false,
    },
    QuestionType::Nat => answer.trim().parse::<f64>().is_ok(),
    QuestionType::Sub => !answer.trim().is_empty(),
  }
}

/// Comma-separated option indices. Blank segments are skipped; any other
/// non-integer segment invalidates the whole answer.
fn option_indices(answer: &str) -> Option<Vec<usize>> {
  answer
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| s.parse::<usize>().ok())
    .collect()
}

fn in_range(indices: &[usize], len: usize) -> bool {
  indices.iter().all(|&i| i < len)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn four() -> Vec<String> {
    ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn test_mcq() {
    assert!(validate_answer(QuestionType::Mcq, &four(), "1"));
    assert!(validate_answer(QuestionType::Mcq, &four(), " 3 "));
    assert!(!validate_answer(QuestionType::Mcq, &four(), "1,2"));
    assert!(!validate_answer(QuestionType::Mcq, &four(), "4"));
    assert!(!validate_answer(QuestionType::Mcq, &four(), ""));
    assert!(!validate_answer(QuestionType::Mcq, &four(), "B"));
    assert!(!validate_answer(QuestionType::Mcq, &[], "0"));
  }

  #[test]
  fn test_msq() {
    assert!(validate_answer(QuestionType::Msq, &four(), "0,2"));
    assert!(validate_answer(QuestionType::Msq, &four(), "3"));
    assert!(validate_answer(QuestionType::Msq, &four(), "1,1"));
    assert!(!validate_answer(QuestionType::Msq, &four(), "0,5"));
    assert!(!validate_answer(QuestionType::Msq, &four(), " , "));
    assert!(!validate_answer(QuestionType::Msq, &four(), "0,-1"));
  }

  #[test]
  fn test_nat() {
    assert!(validate_answer(QuestionType::Nat, &[], "3.14"));
    assert!(validate_answer(QuestionType::Nat, &[], "-2e3"));
    assert!(validate_answer(QuestionType::Nat, &[], " 42 "));
    assert!(!validate_answer(QuestionType::Nat, &[], "abc"));
    assert!(!validate_answer(QuestionType::Nat, &[], ""));
  }

  #[test]
  fn test_sub() {
    assert!(!validate_answer(QuestionType::Sub, &[], "  "));
    assert!(validate_answer(QuestionType::Sub, &[], "ok"));
  }
}
