use super::{GradableQuestion, NormalizedAnswer};
use crate::db::types::QuestionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Verdict {
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
    pub(crate) needs_review: bool,
}

impl Verdict {
    fn decide(question: &GradableQuestion, is_correct: bool) -> Self {
        let points_earned = if is_correct { question.question.points } else { 0 };
        Self {
            is_correct,
            points_earned,
            needs_review: question.question.question_type == QuestionType::Text,
        }
    }
}

/// All-or-nothing scoring of one normalized answer.
pub(crate) fn score_answer(question: &GradableQuestion, answer: &NormalizedAnswer) -> Verdict {
    let is_correct = match question.question.question_type {
        QuestionType::SingleChoice => single_is_correct(question, answer),
        QuestionType::MultiChoice => multiple_is_correct(question, answer),
        QuestionType::Boolean => boolean_is_correct(question, answer),
        QuestionType::Text => text_is_correct(question, answer),
    };

    Verdict::decide(question, is_correct)
}

fn single_is_correct(question: &GradableQuestion, answer: &NormalizedAnswer) -> bool {
    match answer {
        NormalizedAnswer::Single(choice_id) => {
            question.choice(*choice_id).map(|choice| choice.is_correct).unwrap_or(false)
        }
        _ => false,
    }
}

fn multiple_is_correct(question: &GradableQuestion, answer: &NormalizedAnswer) -> bool {
    match answer {
        NormalizedAnswer::Multiple(selected) if !selected.is_empty() => {
            *selected == question.correct_choice_ids()
        }
        _ => false,
    }
}

fn boolean_is_correct(question: &GradableQuestion, answer: &NormalizedAnswer) -> bool {
    let NormalizedAnswer::Boolean { value, choice_id } = answer else {
        return false;
    };

    if let Some(choice) = choice_id.and_then(|id| question.choice(id)) {
        return choice.is_correct;
    }

    match question.question.correct_answer.as_deref() {
        Some(expected) => *value == answer_key_truth(expected),
        None => false,
    }
}

fn text_is_correct(question: &GradableQuestion, answer: &NormalizedAnswer) -> bool {
    let NormalizedAnswer::Text(text) = answer else {
        return false;
    };

    question
        .question
        .correct_answer
        .as_deref()
        .map(|expected| text.to_lowercase() == expected.to_lowercase())
        .unwrap_or(false)
}

fn answer_key_truth(expected: &str) -> bool {
    matches!(expected.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::services::grading::fixtures::{question, text_question, true_false};

    #[test]
    fn single_choice_awards_points_for_correct_choice() {
        let question =
            question(1, QuestionType::SingleChoice, 5, &[(11, "A", true), (12, "B", false)]);

        let right = score_answer(&question, &NormalizedAnswer::Single(11));
        assert_eq!(right, Verdict { is_correct: true, points_earned: 5, needs_review: false });

        let wrong = score_answer(&question, &NormalizedAnswer::Single(12));
        assert_eq!(wrong.points_earned, 0);
        assert!(!wrong.is_correct);

        assert_eq!(score_answer(&question, &NormalizedAnswer::NoAnswer).points_earned, 0);
    }

    #[test]
    fn multi_choice_requires_the_exact_set() {
        let question = question(
            2,
            QuestionType::MultiChoice,
            4,
            &[(21, "A", true), (22, "B", true), (23, "C", true), (24, "D", false)],
        );

        let subset = NormalizedAnswer::Multiple(BTreeSet::from([21, 22]));
        let exact = NormalizedAnswer::Multiple(BTreeSet::from([21, 22, 23]));
        let superset = NormalizedAnswer::Multiple(BTreeSet::from([21, 22, 23, 24]));

        assert_eq!(score_answer(&question, &subset).points_earned, 0);
        assert_eq!(score_answer(&question, &exact).points_earned, 4);
        assert_eq!(score_answer(&question, &superset).points_earned, 0);
        assert!(!score_answer(&question, &NormalizedAnswer::Multiple(BTreeSet::new())).is_correct);
    }

    #[test]
    fn multi_choice_without_correct_choices_is_never_correct() {
        let question = question(2, QuestionType::MultiChoice, 4, &[(21, "A", false)]);
        assert!(!score_answer(&question, &NormalizedAnswer::Multiple(BTreeSet::new())).is_correct);
        assert!(!score_answer(&question, &NormalizedAnswer::NoAnswer).is_correct);
    }

    #[test]
    fn choice_questions_without_choices_score_zero() {
        let single = question(1, QuestionType::SingleChoice, 5, &[]);
        let multiple = question(2, QuestionType::MultiChoice, 5, &[]);

        assert!(!score_answer(&single, &NormalizedAnswer::Single(1)).is_correct);
        assert!(
            !score_answer(&multiple, &NormalizedAnswer::Multiple(BTreeSet::from([1]))).is_correct
        );
    }

    #[test]
    fn boolean_uses_the_resolved_choice() {
        let question = true_false(3, 2, false);

        let picked_false = NormalizedAnswer::Boolean { value: false, choice_id: Some(32) };
        let picked_true = NormalizedAnswer::Boolean { value: true, choice_id: Some(31) };

        assert_eq!(score_answer(&question, &picked_false).points_earned, 2);
        assert_eq!(score_answer(&question, &picked_true).points_earned, 0);
    }

    #[test]
    fn boolean_falls_back_to_answer_key() {
        let mut question = question(5, QuestionType::Boolean, 1, &[]);
        question.question.correct_answer = Some("Yes".to_string());

        let yes = NormalizedAnswer::Boolean { value: true, choice_id: None };
        let no = NormalizedAnswer::Boolean { value: false, choice_id: None };
        assert!(score_answer(&question, &yes).is_correct);
        assert!(!score_answer(&question, &no).is_correct);

        question.question.correct_answer = Some("0".to_string());
        assert!(score_answer(&question, &no).is_correct);

        question.question.correct_answer = None;
        assert!(!score_answer(&question, &yes).is_correct);
        assert!(!score_answer(&question, &no).is_correct);
    }

    #[test]
    fn text_matches_case_insensitively_and_always_needs_review() {
        let question = text_question(4, 10, Some("paris"));

        let right = score_answer(&question, &NormalizedAnswer::Text("PARIS".to_string()));
        assert_eq!(right, Verdict { is_correct: true, points_earned: 10, needs_review: true });

        let padded = score_answer(&question, &NormalizedAnswer::Text(" paris".to_string()));
        assert!(!padded.is_correct);
        assert!(padded.needs_review);

        let missing = score_answer(&question, &NormalizedAnswer::NoAnswer);
        assert!(!missing.is_correct);
        assert!(missing.needs_review);
    }

    #[test]
    fn text_without_answer_key_is_incorrect() {
        let question = text_question(4, 10, None);
        assert!(!score_answer(&question, &NormalizedAnswer::Text("anything".to_string())).is_correct);
    }
}
