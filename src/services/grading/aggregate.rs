use std::collections::HashMap;

use serde_json::Value;

use super::{normalize_answer, score_answer, GradableQuestion, NormalizedAnswer, Verdict};
use crate::db::models::percentage;
use crate::db::types::{AttemptStatus, QuestionType};

#[derive(Debug, Clone)]
pub(crate) struct GradedAnswer {
    pub(crate) question_id: i64,
    pub(crate) answer: NormalizedAnswer,
    pub(crate) verdict: Verdict,
}

impl GradedAnswer {
    pub(crate) fn selected_choice_ids(&self) -> Vec<i64> {
        match &self.answer {
            NormalizedAnswer::Single(choice_id) => vec![*choice_id],
            NormalizedAnswer::Multiple(selected) => selected.iter().copied().collect(),
            NormalizedAnswer::Boolean { choice_id, .. } => choice_id.iter().copied().collect(),
            NormalizedAnswer::NoAnswer | NormalizedAnswer::Text(_) => Vec::new(),
        }
    }

    pub(crate) fn text_answer(&self) -> Option<&str> {
        match &self.answer {
            NormalizedAnswer::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub(crate) fn boolean_answer(&self) -> Option<bool> {
        match &self.answer {
            NormalizedAnswer::Boolean { value, .. } => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AttemptGrade {
    pub(crate) answers: Vec<GradedAnswer>,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: f64,
    pub(crate) passed: bool,
    pub(crate) requires_manual_grading: bool,
}

impl AttemptGrade {
    /// Fully auto-gradable attempts skip straight to `graded`.
    pub(crate) fn status(&self) -> AttemptStatus {
        if self.requires_manual_grading {
            AttemptStatus::Submitted
        } else {
            AttemptStatus::Graded
        }
    }
}

/// Grades every question of the quiz, answered or not.
///
/// `raw_answers` is keyed by question id; entries for questions outside
/// `questions` are ignored.
pub(crate) fn grade_attempt(
    questions: &[GradableQuestion],
    raw_answers: &HashMap<i64, Value>,
    passing_score: f64,
) -> AttemptGrade {
    let mut answers = Vec::with_capacity(questions.len());
    let mut score = 0i32;
    let mut total_points = 0i32;
    let mut requires_manual_grading = false;

    for question in questions {
        let normalized = normalize_answer(question, raw_answers.get(&question.id()));
        for issue in &normalized.issues {
            tracing::warn!(question_id = question.id(), issue = %issue, "Answer normalized with issues");
        }

        let verdict = score_answer(question, &normalized.answer);

        total_points = total_points.saturating_add(question.question.points);
        score = score.saturating_add(verdict.points_earned);
        if question.question.question_type == QuestionType::Text {
            requires_manual_grading = true;
        }

        answers.push(GradedAnswer {
            question_id: question.id(),
            answer: normalized.answer,
            verdict,
        });
    }

    let percentage = percentage(score, total_points);

    AttemptGrade {
        total_questions: answers.len() as i32,
        answers,
        score,
        total_points,
        percentage,
        passed: percentage >= passing_score,
        requires_manual_grading,
    }
}
