use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};

use crate::core::time::{format_offset, format_utc_offset};
use crate::db::models::Quiz;
use crate::services::availability::{Availability, AvailabilityReason, QuizWindow};

#[derive(Debug, Serialize)]
pub(crate) struct AvailabilityResponse {
    pub(crate) quiz_id: i64,
    pub(crate) available: bool,
    pub(crate) reason: AvailabilityReason,
    pub(crate) message: String,
    pub(crate) question_count: i64,
    pub(crate) window: AvailabilityWindowResponse,
}

/// Diagnostics for the resolved availability window.
#[derive(Debug, Serialize)]
pub(crate) struct AvailabilityWindowResponse {
    pub(crate) start_date: Option<String>,
    pub(crate) start_date_naive: bool,
    pub(crate) complete_by_date: Option<String>,
    pub(crate) complete_by_date_naive: bool,
    pub(crate) configured_offset: String,
    pub(crate) server_now: String,
    pub(crate) seconds_until_start: Option<i64>,
    pub(crate) seconds_until_deadline: Option<i64>,
}

impl AvailabilityResponse {
    pub(crate) fn build(
        quiz: &Quiz,
        availability: Availability,
        question_count: i64,
        now: OffsetDateTime,
        fallback: UtcOffset,
    ) -> Self {
        let window = QuizWindow::of(quiz, fallback);
        Self {
            quiz_id: quiz.id,
            available: availability.available,
            reason: availability.reason,
            message: availability.reason.message().to_string(),
            question_count,
            window: AvailabilityWindowResponse {
                start_date: window.start.map(format_offset),
                start_date_naive: window.start_is_naive,
                complete_by_date: window.deadline.map(format_offset),
                complete_by_date_naive: window.deadline_is_naive,
                configured_offset: format_utc_offset(fallback),
                server_now: format_offset(now),
                seconds_until_start: window.seconds_until_start(now),
                seconds_until_deadline: window.seconds_until_deadline(now),
            },
        }
    }
}
