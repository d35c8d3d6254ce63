//! Schema repair for model-generated quizzes.
//!
//! [`transform`] takes a parsed response of the form `{ "questions": [...] }`
//! and returns a copy in which every question carries a canonical type,
//! every option is an object `{ text, isCorrect: bool }`, and choice
//! questions have exactly one correct option wherever that can be
//! inferred. The input is never mutated. Values that are not shaped like a
//! quiz are returned unchanged, and unknown type strings pass through for
//! [`validate_quiz`](crate::quiz::validate_quiz) to reject.

use serde_json::{json, Map, Value};

use crate::quiz::{FILL_IN_BLANK, MCQ, SHORT_ANSWER, TRUE_FALSE};

/// Lowercased synonyms for each canonical type.
const TYPE_SYNONYMS: &[(&str, &str)] = &[
    ("mcq", MCQ),
    ("multiple choice", MCQ),
    ("multiple-choice", MCQ),
    ("multiple_choice", MCQ),
    ("multiplechoice", MCQ),
    ("single choice", MCQ),
    ("single", MCQ),
    ("choice", MCQ),
    ("true/false", TRUE_FALSE),
    ("true-false", TRUE_FALSE),
    ("true_false", TRUE_FALSE),
    ("true or false", TRUE_FALSE),
    ("truefalse", TRUE_FALSE),
    ("tf", TRUE_FALSE),
    ("t/f", TRUE_FALSE),
    ("boolean", TRUE_FALSE),
    ("bool", TRUE_FALSE),
    ("fill in blank", FILL_IN_BLANK),
    ("fill in the blank", FILL_IN_BLANK),
    ("fill-in-the-blank", FILL_IN_BLANK),
    ("fill-in-blank", FILL_IN_BLANK),
    ("fill_in_blank", FILL_IN_BLANK),
    ("fill in the blanks", FILL_IN_BLANK),
    ("fillup", FILL_IN_BLANK),
    ("fill-up", FILL_IN_BLANK),
    ("fill", FILL_IN_BLANK),
    ("blank", FILL_IN_BLANK),
    ("cloze", FILL_IN_BLANK),
    ("short answer", SHORT_ANSWER),
    ("short-answer", SHORT_ANSWER),
    ("short_answer", SHORT_ANSWER),
    ("shortanswer", SHORT_ANSWER),
    ("essay", SHORT_ANSWER),
    ("subjective", SHORT_ANSWER),
    ("open ended", SHORT_ANSWER),
    ("open-ended", SHORT_ANSWER),
    ("descriptive", SHORT_ANSWER),
];

/// Repair a parsed quiz response. Pure: works on a copy.
pub fn transform(response: &Value) -> Value {
    let mut out = response.clone();
    if let Some(questions) = out.get_mut("questions").and_then(Value::as_array_mut) {
        for question in questions.iter_mut() {
            repair_question(question);
        }
    }
    out
}

/// Canonical name for a raw `type` value.
///
/// Missing or non-string types default to MCQ. Unrecognized strings are
/// returned as given.
pub fn normalize_type(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(s)) => canonical_type(s).map(str::to_string).unwrap_or_else(|| s.clone()),
        _ => MCQ.to_string(),
    }
}

fn canonical_type(raw: &str) -> Option<&'static str> {
    let key = raw.trim().to_lowercase();
    TYPE_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|(_, canonical)| *canonical)
}

/// Index marked correct for an MCQ with no usable correctness signal.
pub fn default_correct_index(_options: &[Value]) -> usize {
    0
}

fn repair_question(question: &mut Value) {
    let Some(obj) = question.as_object_mut() else {
        return;
    };
    let kind = normalize_type(obj.get("type"));
    obj.insert("type".into(), Value::String(kind.clone()));

    if let Some(options) = obj.get_mut("options").and_then(Value::as_array_mut) {
        options.retain(|o| !o.is_null());
        for option in options.iter_mut() {
            normalize_option(option);
        }
    }

    match kind.as_str() {
        TRUE_FALSE => repair_true_false(obj),
        MCQ => repair_mcq(obj),
        _ => {}
    }
}

fn normalize_option(option: &mut Value) {
    match option {
        Value::String(s) => {
            let text = std::mem::take(s);
            *option = json!({ "text": text, "isCorrect": false });
        }
        Value::Object(obj) => {
            if let Some(legacy) = obj.remove("correct") {
                if !obj.contains_key("isCorrect") {
                    obj.insert("isCorrect".into(), Value::Bool(coerce_bool(&legacy)));
                }
            }
            match obj.get("isCorrect") {
                Some(Value::Bool(_)) => {}
                Some(other) => {
                    let coerced = coerce_bool(other);
                    obj.insert("isCorrect".into(), Value::Bool(coerced));
                }
                None => {
                    obj.insert("isCorrect".into(), Value::Bool(false));
                }
            }
        }
        _ => {
            let text = option.to_string();
            *option = json!({ "text": text, "isCorrect": false });
        }
    }
}

/// Truthiness of a correctness flag as models tend to write it.
fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "correct"
        ),
        _ => false,
    }
}

fn is_correct(option: &Value) -> bool {
    option
        .get("isCorrect")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn set_correct(option: &mut Value, correct: bool) {
    if let Some(obj) = option.as_object_mut() {
        obj.insert("isCorrect".into(), Value::Bool(correct));
    }
}

fn option_text(option: &Value) -> Option<&str> {
    option.get("text").and_then(Value::as_str)
}

fn answer_of(obj: &Map<String, Value>) -> Option<&Value> {
    obj.get("answer").or_else(|| obj.get("correctAnswer"))
}

fn answer_is_true(obj: &Map<String, Value>) -> bool {
    match answer_of(obj) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn truth_label(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" => Some(true),
        "false" | "f" | "no" => Some(false),
        _ => None,
    }
}

fn repair_true_false(obj: &mut Map<String, Value>) {
    let truth = answer_is_true(obj);
    let well_sized = obj
        .get("options")
        .and_then(Value::as_array)
        .map(|o| o.len() == 2)
        .unwrap_or(false);

    if !well_sized {
        obj.insert(
            "options".into(),
            json!([
                { "text": "True", "isCorrect": truth },
                { "text": "False", "isCorrect": !truth }
            ]),
        );
        return;
    }

    let Some(options) = obj.get_mut("options").and_then(Value::as_array_mut) else {
        return;
    };
    if options.iter().filter(|o| is_correct(o)).count() == 1 {
        return;
    }

    let labels: Vec<Option<bool>> = options
        .iter()
        .map(|o| option_text(o).and_then(truth_label))
        .collect();
    let by_label = matches!(labels.as_slice(), [Some(a), Some(b)] if a != b);

    for (i, option) in options.iter_mut().enumerate() {
        let says_true = if by_label {
            labels[i] == Some(true)
        } else {
            i == 0
        };
        set_correct(option, says_true == truth);
    }
}

fn repair_mcq(obj: &mut Map<String, Value>) {
    let answer = answer_of(obj).cloned();
    let Some(options) = obj.get_mut("options").and_then(Value::as_array_mut) else {
        return;
    };
    if options.is_empty() {
        return;
    }

    let marked: Vec<usize> = options
        .iter()
        .enumerate()
        .filter(|(_, o)| is_correct(o))
        .map(|(i, _)| i)
        .collect();

    let chosen = match marked.as_slice() {
        [_] => return,
        [first, ..] => *first,
        [] => answer
            .as_ref()
            .and_then(|a| match_answer(options, a))
            .unwrap_or_else(|| default_correct_index(options)),
    };

    for (i, option) in options.iter_mut().enumerate() {
        set_correct(option, i == chosen);
    }
}

/// Locate the option an `answer` field refers to: by text
/// (case-insensitive), then by 0-based index, then by letter.
fn match_answer(options: &[Value], answer: &Value) -> Option<usize> {
    match answer {
        Value::String(s) => {
            let wanted = s.trim().to_lowercase();
            if wanted.is_empty() {
                return None;
            }
            options
                .iter()
                .position(|o| {
                    option_text(o)
                        .map(|t| t.trim().to_lowercase() == wanted)
                        .unwrap_or(false)
                })
                .or_else(|| letter_index(&wanted, options.len()))
        }
        Value::Number(n) => n
            .as_u64()
            .map(|i| i as usize)
            .filter(|i| *i < options.len()),
        _ => None,
    }
}

fn letter_index(answer: &str, len: usize) -> Option<usize> {
    let mut chars = answer.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_ascii_lowercase() {
        return None;
    }
    let i = (c as u8 - b'a') as usize;
    (i < len).then_some(i)
}
