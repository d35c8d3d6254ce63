//! Canonical quiz schema and its validation rules.
//!
//! Questions are a tagged union keyed on `type`, with one variant per
//! member of the closed type set. [`validate_quiz`] turns a repaired JSON
//! value into a [`Quiz`] or reports the first rule that is broken; it is
//! the acceptance gate that runs after [`transform`](crate::repair::transform).

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MCQ: &str = "MCQ";
pub const TRUE_FALSE: &str = "True/False";
pub const FILL_IN_BLANK: &str = "Fill in Blank";
pub const SHORT_ANSWER: &str = "Short Answer";

/// The closed set of question types.
pub const QUESTION_TYPES: [&str; 4] = [MCQ, TRUE_FALSE, FILL_IN_BLANK, SHORT_ANSWER];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub text: String,
    pub is_correct: bool,
}

/// MCQ and True/False share a shape; the rules differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceQuestion {
    pub question: String,
    pub options: Vec<QuizOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlankQuestion {
    pub question: String,
    #[serde(default)]
    pub blanks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeTextQuestion {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuizQuestion {
    #[serde(rename = "MCQ")]
    Mcq(ChoiceQuestion),
    #[serde(rename = "True/False")]
    TrueFalse(ChoiceQuestion),
    #[serde(rename = "Fill in Blank")]
    FillInBlank(BlankQuestion),
    #[serde(rename = "Short Answer")]
    ShortAnswer(FreeTextQuestion),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("quiz must be a JSON object with a `questions` array")]
    MissingQuestions,
    #[error("quiz has no questions")]
    NoQuestions,
    #[error("question {index}: unknown type {found}")]
    UnknownType { index: usize, found: String },
    #[error("question {index}: {reason}")]
    Malformed { index: usize, reason: String },
    #[error("question {index}: question text is empty")]
    EmptyQuestion { index: usize },
    #[error("question {index}: expected {expected} options, found {found}")]
    OptionCount {
        index: usize,
        expected: &'static str,
        found: usize,
    },
    #[error("question {index}: expected exactly one correct option, found {found}")]
    CorrectCount { index: usize, found: usize },
    #[error("question {index}: option {option} has no text")]
    EmptyOption { index: usize, option: usize },
    #[error("question {index}: no expected answer")]
    MissingAnswer { index: usize },
}

/// Cheap structural check used while recovering JSON: an object with a
/// `questions` array. Full validation happens after repair.
pub fn is_quiz_shaped(value: &Value) -> bool {
    value
        .get("questions")
        .map(Value::is_array)
        .unwrap_or(false)
}

/// Validate a repaired quiz value against the canonical schema.
pub fn validate_quiz(value: &Value) -> Result<Quiz, QuizError> {
    let questions = value
        .get("questions")
        .and_then(Value::as_array)
        .ok_or(QuizError::MissingQuestions)?;
    if questions.is_empty() {
        return Err(QuizError::NoQuestions);
    }

    for (index, q) in questions.iter().enumerate() {
        let found = q.get("type").and_then(Value::as_str).unwrap_or_default();
        if !QUESTION_TYPES.contains(&found) {
            return Err(QuizError::UnknownType {
                index,
                found: q.get("type").map(Value::to_string).unwrap_or_default(),
            });
        }
    }

    let quiz: Quiz = serde_json::from_value(value.clone()).map_err(|e| {
        let index = locate_malformed(questions);
        QuizError::Malformed {
            index,
            reason: e.to_string(),
        }
    })?;

    for (index, question) in quiz.questions.iter().enumerate() {
        validate_question(index, question)?;
    }
    Ok(quiz)
}

/// Index of the first question that fails to deserialize on its own.
fn locate_malformed(questions: &[Value]) -> usize {
    questions
        .iter()
        .position(|q| serde_json::from_value::<QuizQuestion>(q.clone()).is_err())
        .unwrap_or(0)
}

fn validate_question(index: usize, question: &QuizQuestion) -> Result<(), QuizError> {
    match question {
        QuizQuestion::Mcq(q) => {
            require_text(index, &q.question)?;
            if q.options.len() < 2 {
                return Err(QuizError::OptionCount {
                    index,
                    expected: "at least 2",
                    found: q.options.len(),
                });
            }
            validate_options(index, &q.options)
        }
        QuizQuestion::TrueFalse(q) => {
            require_text(index, &q.question)?;
            if q.options.len() != 2 {
                return Err(QuizError::OptionCount {
                    index,
                    expected: "exactly 2",
                    found: q.options.len(),
                });
            }
            validate_options(index, &q.options)
        }
        QuizQuestion::FillInBlank(q) => {
            require_text(index, &q.question)?;
            let has_blank = q.blanks.iter().any(|b| !b.trim().is_empty());
            if !has_blank && !has_text(q.answer.as_deref()) {
                return Err(QuizError::MissingAnswer { index });
            }
            Ok(())
        }
        QuizQuestion::ShortAnswer(q) => {
            require_text(index, &q.question)?;
            let has_listed = q.correct_answers.iter().any(|a| !a.trim().is_empty());
            if !has_listed && !has_text(q.answer.as_deref()) {
                return Err(QuizError::MissingAnswer { index });
            }
            Ok(())
        }
    }
}

fn validate_options(index: usize, options: &[QuizOption]) -> Result<(), QuizError> {
    if let Some(option) = options.iter().position(|o| o.text.trim().is_empty()) {
        return Err(QuizError::EmptyOption { index, option });
    }
    let found = options.iter().filter(|o| o.is_correct).count();
    if found != 1 {
        return Err(QuizError::CorrectCount { index, found });
    }
    Ok(())
}

fn require_text(index: usize, text: &str) -> Result<(), QuizError> {
    if text.trim().is_empty() {
        return Err(QuizError::EmptyQuestion { index });
    }
    Ok(())
}

fn has_text(s: Option<&str>) -> bool {
    s.map(|s| !s.trim().is_empty()).unwrap_or(false)
}
