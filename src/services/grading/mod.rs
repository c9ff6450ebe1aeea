//! Pure grading core: raw client answers in, per-question verdicts and
//! attempt totals out. Nothing here touches the database or the network.

mod aggregate;
mod normalize;
mod score;

use std::collections::BTreeSet;

use crate::db::models::{Choice, Question};

pub(crate) use aggregate::{grade_attempt, AttemptGrade, GradedAnswer};
pub(crate) use normalize::{normalize_answer, parse_answer_key, Normalized, NormalizedAnswer};
pub(crate) use score::{score_answer, Verdict};

/// A question together with its choices, as needed for grading.
#[derive(Debug, Clone)]
pub(crate) struct GradableQuestion {
    pub(crate) question: Question,
    pub(crate) choices: Vec<Choice>,
}

impl GradableQuestion {
    pub(crate) fn id(&self) -> i64 {
        self.question.id
    }

    pub(crate) fn choice(&self, choice_id: i64) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id == choice_id)
    }

    pub(crate) fn choice_by_text(&self, text: &str) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.text.trim().eq_ignore_ascii_case(text))
    }

    pub(crate) fn correct_choice_ids(&self) -> BTreeSet<i64> {
        self.choices.iter().filter(|choice| choice.is_correct).map(|choice| choice.id).collect()
    }
}

/// Pairs each question with its choices, keeping the question order.
pub(crate) fn assemble(questions: Vec<Question>, choices: Vec<Choice>) -> Vec<GradableQuestion> {
    let mut gradable: Vec<GradableQuestion> = questions
        .into_iter()
        .map(|question| GradableQuestion { question, choices: Vec::new() })
        .collect();

    for choice in choices {
        if let Some(target) = gradable.iter_mut().find(|item| item.id() == choice.question_id) {
            target.choices.push(choice);
        }
    }

    gradable
}

/// Reads "True"/"False" choice text as a boolean.
pub(crate) fn boolean_choice_value(choice: &Choice) -> Option<bool> {
    let text = choice.text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
