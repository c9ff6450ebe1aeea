use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::time::format_primitive;
use crate::db::models::{QuizAnswer, QuizAttempt};
use crate::db::types::AttemptStatus;
use crate::services::attempt_start::StartedAttempt;
use crate::services::attempt_submit::SubmitOutcome;

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitAttemptRequest {
    #[serde(default)]
    pub(crate) answers: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartAttemptResponse {
    pub(crate) attempt_id: i64,
    pub(crate) quiz_id: i64,
    pub(crate) status: AttemptStatus,
    pub(crate) started_at: String,
    pub(crate) resumed: bool,
    pub(crate) duration_minutes: i32,
    pub(crate) time_remaining_seconds: i64,
}

impl From<StartedAttempt> for StartAttemptResponse {
    fn from(started: StartedAttempt) -> Self {
        Self {
            attempt_id: started.attempt.id,
            quiz_id: started.quiz.id,
            status: started.attempt.status,
            started_at: format_primitive(started.attempt.started_at),
            resumed: started.resumed,
            duration_minutes: started.quiz.duration_minutes,
            time_remaining_seconds: started.time_remaining_seconds,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitAttemptResponse {
    pub(crate) attempt_id: i64,
    pub(crate) status: AttemptStatus,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: f64,
    pub(crate) passed: bool,
    pub(crate) marks_synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) sync_warning: Option<String>,
}

impl From<SubmitOutcome> for SubmitAttemptResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        Self {
            attempt_id: outcome.attempt_id,
            status: outcome.status,
            score: outcome.score,
            total_points: outcome.total_points,
            total_questions: outcome.total_questions,
            percentage: round_percentage(outcome.percentage),
            passed: outcome.passed,
            marks_synced: outcome.marks_synced,
            sync_warning: outcome.sync_warning,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptAnswerResponse {
    pub(crate) question_id: i64,
    pub(crate) selected_choice_ids: Vec<i64>,
    pub(crate) text_answer: Option<String>,
    pub(crate) boolean_answer: Option<bool>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
    pub(crate) needs_review: bool,
}

impl AttemptAnswerResponse {
    pub(crate) fn new(answer: QuizAnswer, selected_choice_ids: Vec<i64>) -> Self {
        Self {
            question_id: answer.question_id,
            selected_choice_ids,
            text_answer: answer.text_answer,
            boolean_answer: answer.boolean_answer,
            is_correct: answer.is_correct,
            points_earned: answer.points_earned,
            needs_review: answer.needs_review,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResultResponse {
    pub(crate) attempt_id: i64,
    pub(crate) quiz_id: i64,
    pub(crate) user_id: String,
    pub(crate) status: AttemptStatus,
    pub(crate) started_at: String,
    pub(crate) completed_at: Option<String>,
    pub(crate) duration_seconds: Option<i64>,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: f64,
    pub(crate) passed: bool,
    pub(crate) feedback: Option<String>,
    pub(crate) marks_synced: bool,
    pub(crate) last_sync_at: Option<String>,
    /// Present only when the quiz shows results or allows review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) answers: Option<Vec<AttemptAnswerResponse>>,
}

impl AttemptResultResponse {
    pub(crate) fn new(
        attempt: QuizAttempt,
        passing_score: f64,
        answers: Option<Vec<AttemptAnswerResponse>>,
    ) -> Self {
        Self {
            attempt_id: attempt.id,
            quiz_id: attempt.quiz_id,
            status: attempt.status,
            started_at: format_primitive(attempt.started_at),
            completed_at: attempt.completed_at.map(format_primitive),
            duration_seconds: attempt.duration_seconds,
            score: attempt.score,
            total_points: attempt.total_points,
            total_questions: attempt.total_questions,
            percentage: round_percentage(attempt.percentage()),
            passed: attempt.passed(passing_score),
            feedback: attempt.feedback.clone(),
            marks_synced: attempt.marks_synced,
            last_sync_at: attempt.last_sync_at.map(format_primitive),
            user_id: attempt.user_id,
            answers,
        }
    }
}

fn round_percentage(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_rounded_for_display() {
        assert_eq!(round_percentage(100.0 / 3.0), 33.33);
        assert_eq!(round_percentage(25.0), 25.0);
    }

    #[test]
    fn sync_warning_is_omitted_when_absent() {
        let response = SubmitAttemptResponse::from(SubmitOutcome {
            attempt_id: 1,
            status: AttemptStatus::Graded,
            score: 5,
            total_points: 10,
            total_questions: 2,
            percentage: 50.0,
            passed: true,
            marks_synced: true,
            sync_warning: None,
        });

        let json = serde_json::to_value(response).expect("serialize");
        assert_eq!(json["status"], "graded");
        assert!(json.get("sync_warning").is_none());
    }
}
