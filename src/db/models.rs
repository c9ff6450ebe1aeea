use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AttemptStatus, QuestionType, QuizType, UserRole};

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: Option<String>,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) quiz_type: QuizType,
    pub(crate) course_id: Option<String>,
    pub(crate) tutorial_number: Option<i32>,
    pub(crate) created_by: Option<String>,
    pub(crate) start_date: Option<PrimitiveDateTime>,
    pub(crate) start_date_offset: Option<i32>,
    pub(crate) complete_by_date: Option<PrimitiveDateTime>,
    pub(crate) complete_by_date_offset: Option<i32>,
    pub(crate) duration_minutes: i32,
    pub(crate) passing_score: f64,
    pub(crate) allow_retake: bool,
    pub(crate) is_active: bool,
    pub(crate) is_ended: bool,
    pub(crate) show_results: bool,
    pub(crate) allow_review: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: i64,
    pub(crate) quiz_id: i64,
    pub(crate) text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
    pub(crate) correct_answer: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Choice {
    pub(crate) id: i64,
    pub(crate) question_id: i64,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct QuizAttempt {
    pub(crate) id: i64,
    pub(crate) user_id: String,
    pub(crate) quiz_id: i64,
    pub(crate) status: AttemptStatus,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) total_questions: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) duration_seconds: Option<i64>,
    pub(crate) feedback: Option<String>,
    pub(crate) graded_by: Option<String>,
    pub(crate) marks_synced: bool,
    pub(crate) last_sync_at: Option<PrimitiveDateTime>,
    pub(crate) last_sync_attempt_at: Option<PrimitiveDateTime>,
}

impl QuizAttempt {
    pub(crate) fn percentage(&self) -> f64 {
        percentage(self.score, self.total_points)
    }

    pub(crate) fn passed(&self, passing_score: f64) -> bool {
        self.percentage() >= passing_score
    }
}

pub(crate) fn percentage(score: i32, total_points: i32) -> f64 {
    if total_points <= 0 {
        return 0.0;
    }
    f64::from(score) / f64::from(total_points) * 100.0
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct QuizAnswer {
    pub(crate) id: i64,
    pub(crate) attempt_id: i64,
    pub(crate) question_id: i64,
    pub(crate) text_answer: Option<String>,
    pub(crate) boolean_answer: Option<bool>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
    pub(crate) needs_review: bool,
    pub(crate) created_at: PrimitiveDateTime,
}
