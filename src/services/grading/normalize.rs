use std::collections::BTreeSet;

use serde_json::Value;

use super::{boolean_choice_value, GradableQuestion};
use crate::db::types::QuestionType;

const UNDEFINED: &str = "undefined";
const KEY_PREFIX: &str = "question_";

/// Canonical per-question answer after client payload coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NormalizedAnswer {
    NoAnswer,
    Single(i64),
    Multiple(BTreeSet<i64>),
    Boolean { value: bool, choice_id: Option<i64> },
    Text(String),
}

/// Result of normalizing one question's raw value. `issues` carries the
/// non-fatal problems found on the way, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Normalized {
    pub(crate) answer: NormalizedAnswer,
    pub(crate) issues: Vec<String>,
}

impl Normalized {
    fn clean(answer: NormalizedAnswer) -> Self {
        Self { answer, issues: Vec::new() }
    }

    fn no_answer() -> Self {
        Self::clean(NormalizedAnswer::NoAnswer)
    }

    fn rejected(issue: String) -> Self {
        Self { answer: NormalizedAnswer::NoAnswer, issues: vec![issue] }
    }
}

/// Accepts `question_<id>` as well as a bare `<id>`.
pub(crate) fn parse_answer_key(key: &str) -> Option<i64> {
    let trimmed = key.trim();
    let digits = trimmed.strip_prefix(KEY_PREFIX).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Never fails: anything that cannot be read for the question's type ends up
/// as [`NormalizedAnswer::NoAnswer`] with an issue attached.
pub(crate) fn normalize_answer(question: &GradableQuestion, raw: Option<&Value>) -> Normalized {
    let Some(raw) = raw else {
        return Normalized::no_answer();
    };
    if is_blank(raw) {
        return Normalized::no_answer();
    }

    match question.question.question_type {
        QuestionType::SingleChoice => normalize_single(question, raw),
        QuestionType::MultiChoice => normalize_multiple(question, raw),
        QuestionType::Boolean => normalize_boolean(question, raw),
        QuestionType::Text => normalize_text(raw),
    }
}

fn normalize_single(question: &GradableQuestion, raw: &Value) -> Normalized {
    let Some(choice_id) = choice_id_of(raw) else {
        return Normalized::rejected(format!("unreadable choice id {raw}"));
    };

    if question.choice(choice_id).is_none() {
        return Normalized::rejected(format!("choice {choice_id} does not belong to the question"));
    }

    Normalized::clean(NormalizedAnswer::Single(choice_id))
}

fn normalize_multiple(question: &GradableQuestion, raw: &Value) -> Normalized {
    let items: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        scalar => vec![scalar],
    };

    let mut selected = BTreeSet::new();
    let mut issues = Vec::new();

    for item in items {
        if is_blank(item) {
            continue;
        }
        match choice_id_of(item) {
            Some(choice_id) if question.choice(choice_id).is_some() => {
                selected.insert(choice_id);
            }
            Some(choice_id) => {
                issues.push(format!("choice {choice_id} does not belong to the question"));
            }
            None => issues.push(format!("unreadable choice id {item}")),
        }
    }

    let answer = if selected.is_empty() {
        NormalizedAnswer::NoAnswer
    } else {
        NormalizedAnswer::Multiple(selected)
    };

    Normalized { answer, issues }
}

fn normalize_boolean(question: &GradableQuestion, raw: &Value) -> Normalized {
    let mut issues = Vec::new();

    let (value, explicit_choice) = match raw {
        Value::Bool(value) => (*value, None),
        Value::String(text) if text.trim().eq_ignore_ascii_case("true") => (true, None),
        Value::String(text) if text.trim().eq_ignore_ascii_case("false") => (false, None),
        other => match numeric_boolean(question, other) {
            Some(resolved) => resolved,
            None => {
                issues.push(format!("coerced {other} to a boolean"));
                (truthy(other), None)
            }
        },
    };

    let choice_id = explicit_choice
        .or_else(|| question.choice_by_text(if value { "true" } else { "false" }).map(|c| c.id));

    Normalized { answer: NormalizedAnswer::Boolean { value, choice_id }, issues }
}

/// An integer names one of the question's True/False choices when it can,
/// otherwise 0 and 1 read as false and true.
fn numeric_boolean(question: &GradableQuestion, raw: &Value) -> Option<(bool, Option<i64>)> {
    let number = choice_id_of(raw)?;

    if let Some(choice) = question.choice(number) {
        if let Some(value) = boolean_choice_value(choice) {
            return Some((value, Some(choice.id)));
        }
    }

    match number {
        0 => Some((false, None)),
        1 => Some((true, None)),
        _ => None,
    }
}

fn normalize_text(raw: &Value) -> Normalized {
    let text = match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    Normalized::clean(NormalizedAnswer::Text(text))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().eq_ignore_ascii_case(UNDEFINED),
        _ => false,
    }
}

fn choice_id_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number.as_f64().filter(|float| float.fract() == 0.0).map(|float| float as i64)
        }),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
                return None;
            }
            trimmed.parse().ok()
        }
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(value) => *value,
        Value::Number(number) => number.as_f64().map(|float| float != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
