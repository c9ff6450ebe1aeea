use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};

use crate::core::time::resolve_local;
use crate::db::models::Quiz;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AvailabilityReason {
    Available,
    Ended,
    Inactive,
    NotYetStarted,
    DeadlinePassed,
    NoQuestions,
}

impl AvailabilityReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            AvailabilityReason::Available => "available",
            AvailabilityReason::Ended => "ended",
            AvailabilityReason::Inactive => "inactive",
            AvailabilityReason::NotYetStarted => "not_yet_started",
            AvailabilityReason::DeadlinePassed => "deadline_passed",
            AvailabilityReason::NoQuestions => "no_questions",
        }
    }

    pub(crate) fn message(self) -> &'static str {
        match self {
            AvailabilityReason::Available => "Quiz is available",
            AvailabilityReason::Ended => "Quiz has been ended by the instructor",
            AvailabilityReason::Inactive => "Quiz is not active",
            AvailabilityReason::NotYetStarted => "Quiz has not started yet",
            AvailabilityReason::DeadlinePassed => "Quiz deadline has passed",
            AvailabilityReason::NoQuestions => "Quiz has no questions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Availability {
    pub(crate) available: bool,
    pub(crate) reason: AvailabilityReason,
}

impl Availability {
    fn blocked(reason: AvailabilityReason) -> Self {
        Self { available: false, reason }
    }
}

/// Availability window with both bounds resolved to absolute instants.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QuizWindow {
    pub(crate) start: Option<OffsetDateTime>,
    pub(crate) start_is_naive: bool,
    pub(crate) deadline: Option<OffsetDateTime>,
    pub(crate) deadline_is_naive: bool,
}

impl QuizWindow {
    pub(crate) fn of(quiz: &Quiz, fallback: UtcOffset) -> Self {
        Self {
            start: quiz
                .start_date
                .map(|value| resolve_local(value, quiz.start_date_offset, fallback)),
            start_is_naive: quiz.start_date.is_some() && quiz.start_date_offset.is_none(),
            deadline: quiz
                .complete_by_date
                .map(|value| resolve_local(value, quiz.complete_by_date_offset, fallback)),
            deadline_is_naive: quiz.complete_by_date.is_some()
                && quiz.complete_by_date_offset.is_none(),
        }
    }

    pub(crate) fn seconds_until_start(&self, now: OffsetDateTime) -> Option<i64> {
        self.start.map(|start| (start - now).whole_seconds().max(0))
    }

    pub(crate) fn seconds_until_deadline(&self, now: OffsetDateTime) -> Option<i64> {
        self.deadline.map(|deadline| (deadline - now).whole_seconds().max(0))
    }
}

/// Evaluates the gate in fixed order; the first failing check is reported.
pub(crate) fn check_availability(
    quiz: &Quiz,
    question_count: i64,
    now: OffsetDateTime,
    fallback: UtcOffset,
) -> Availability {
    if quiz.is_ended {
        return Availability::blocked(AvailabilityReason::Ended);
    }
    if !quiz.is_active {
        return Availability::blocked(AvailabilityReason::Inactive);
    }

    let window = QuizWindow::of(quiz, fallback);
    if window.start.is_some_and(|start| now < start) {
        return Availability::blocked(AvailabilityReason::NotYetStarted);
    }
    if window.deadline.is_some_and(|deadline| now > deadline) {
        return Availability::blocked(AvailabilityReason::DeadlinePassed);
    }

    if question_count <= 0 {
        return Availability::blocked(AvailabilityReason::NoQuestions);
    }

    Availability { available: true, reason: AvailabilityReason::Available }
}

#[cfg(test)]
mod tests {
    use time::macros::{datetime, offset};

    use super::*;
    use crate::db::types::QuizType;

    fn quiz() -> Quiz {
        Quiz {
            id: 1,
            title: "Tutorial 1".to_string(),
            description: None,
            quiz_type: QuizType::Tutorial,
            course_id: Some("CS101".to_string()),
            tutorial_number: Some(1),
            created_by: None,
            start_date: None,
            start_date_offset: None,
            complete_by_date: None,
            complete_by_date_offset: None,
            duration_minutes: 30,
            passing_score: 50.0,
            allow_retake: false,
            is_active: true,
            is_ended: false,
            show_results: true,
            allow_review: true,
            created_at: datetime!(2025-01-01 00:00),
            updated_at: datetime!(2025-01-01 00:00),
        }
    }

    const NOW: OffsetDateTime = datetime!(2025-03-01 10:00 UTC);

    #[test]
    fn open_quiz_with_questions_is_available() {
        let availability = check_availability(&quiz(), 3, NOW, UtcOffset::UTC);
        assert!(availability.available);
        assert_eq!(availability.reason, AvailabilityReason::Available);
    }

    #[test]
    fn checks_run_in_priority_order() {
        let mut quiz = quiz();
        quiz.is_ended = true;
        quiz.is_active = false;
        quiz.start_date = Some(datetime!(2025-04-01 00:00));
        quiz.complete_by_date = Some(datetime!(2025-02-01 00:00));

        let reasons = [
            AvailabilityReason::Ended,
            AvailabilityReason::Inactive,
            AvailabilityReason::NotYetStarted,
            AvailabilityReason::DeadlinePassed,
            AvailabilityReason::NoQuestions,
        ];

        for expected in reasons {
            let availability = check_availability(&quiz, 0, NOW, UtcOffset::UTC);
            assert!(!availability.available);
            assert_eq!(availability.reason, expected);

            match expected {
                AvailabilityReason::Ended => quiz.is_ended = false,
                AvailabilityReason::Inactive => quiz.is_active = true,
                AvailabilityReason::NotYetStarted => quiz.start_date = None,
                AvailabilityReason::DeadlinePassed => quiz.complete_by_date = None,
                _ => {}
            }
        }
    }

    #[test]
    fn naive_bounds_use_the_configured_offset() {
        let mut quiz = quiz();
        // 15:00 at +05:30 is 09:30 UTC, already past at 10:00 UTC.
        quiz.complete_by_date = Some(datetime!(2025-03-01 15:00));

        let in_india = check_availability(&quiz, 1, NOW, offset!(+5:30));
        assert_eq!(in_india.reason, AvailabilityReason::DeadlinePassed);

        let in_utc = check_availability(&quiz, 1, NOW, UtcOffset::UTC);
        assert!(in_utc.available);
    }

    #[test]
    fn stored_offsets_override_the_configured_one() {
        let mut quiz = quiz();
        quiz.start_date = Some(datetime!(2025-03-01 12:00));
        quiz.start_date_offset = Some(3 * 3600);

        let availability = check_availability(&quiz, 1, NOW, offset!(-8:00));
        assert!(availability.available);

        let window = QuizWindow::of(&quiz, offset!(-8:00));
        assert!(!window.start_is_naive);
        assert_eq!(window.seconds_until_start(NOW), Some(0));
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut quiz = quiz();
        quiz.start_date = Some(datetime!(2025-03-01 10:00));
        quiz.complete_by_date = Some(datetime!(2025-03-01 10:00));

        assert!(check_availability(&quiz, 1, NOW, UtcOffset::UTC).available);
    }

    #[test]
    fn window_reports_naive_bounds_and_countdowns() {
        let mut quiz = quiz();
        quiz.start_date = Some(datetime!(2025-03-01 11:00));
        quiz.complete_by_date = Some(datetime!(2025-03-01 12:00));
        quiz.complete_by_date_offset = Some(0);

        let window = QuizWindow::of(&quiz, UtcOffset::UTC);
        assert!(window.start_is_naive);
        assert!(!window.deadline_is_naive);
        assert_eq!(window.seconds_until_start(NOW), Some(3600));
        assert_eq!(window.seconds_until_deadline(NOW), Some(7200));
    }
}
