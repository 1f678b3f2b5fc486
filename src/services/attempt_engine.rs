//! The attempt state machine: the single authority over legal transitions
//! of a `TestAttempt` given a `Test` definition and `Question` facts.
//!
//! Everything here is pure — callers load state, apply one operation, and
//! persist the mutated attempt. Hearts live on the attempt record, never in
//! transient session state.

use chrono::Utc;
use rand::seq::SliceRandom;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Question, Test, TestAttempt},
};

/// Number of incorrect options a hint eliminates.
pub const HINT_ELIMINATED_OPTIONS: usize = 2;

/// Result of evaluating one submitted answer. The correct answer and the
/// explanation are revealed on every branch once an answer is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEvaluation {
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    pub transition: AnswerTransition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerTransition {
    /// Correct, but the level threshold is not reached yet.
    CorrectAnswer,
    /// Correct answer reached the level threshold; the attempt moved on.
    LevelCompleted { completed_level: i32, next_level: i32 },
    /// Correct answer cleared the final level.
    TestCompleted {
        score: i32,
        max_score: i32,
        percentage: i32,
    },
    /// Wrong answer, hearts remain.
    IncorrectAnswer { remaining_hearts: i32 },
    /// Wrong answer exhausted the hearts: the heart pool is restored, the
    /// attempt counter advances, level progress and score are kept.
    AttemptFailed {
        attempts: i32,
        hearts_restored: i32,
    },
}

/// Initialize a fresh attempt for a student on a test.
///
/// `authored_questions` are the test's existing questions across all
/// levels. A level contributes its questions' point values to `max_score`;
/// any slots below its threshold that have no authored question yet count
/// one point each.
pub fn new_attempt(student_id: &str, test: &Test, authored_questions: &[Question]) -> TestAttempt {
    let mut total_questions = 0;
    let mut max_score = 0;

    for level in &test.levels {
        total_questions += level.number_of_questions;

        let level_questions: Vec<&Question> = authored_questions
            .iter()
            .filter(|q| q.level == level.level_number)
            .collect();

        let authored_points: i32 = level_questions.iter().map(|q| q.points).sum();
        let unauthored_slots =
            (level.number_of_questions - level_questions.len() as i32).max(0);

        max_score += authored_points + unauthored_slots;
    }

    TestAttempt::new(
        student_id,
        &test.id,
        total_questions,
        max_score,
        test.hearts_per_attempt,
        test.class_label(),
    )
}

/// Evaluate a submitted answer and advance the attempt accordingly.
///
/// Comparison is an exact, case-sensitive string match against the
/// question's correct answer.
pub fn answer_question(
    attempt: &mut TestAttempt,
    test: &Test,
    question: &Question,
    submitted_answer: &str,
) -> AppResult<AnswerEvaluation> {
    guard_question_access(attempt, test, question)?;

    let level = test.level(attempt.current_level).ok_or_else(|| {
        AppError::NotFound(format!(
            "Level {} not found in test '{}'",
            attempt.current_level, test.id
        ))
    })?;

    let is_correct = submitted_answer == question.correct_answer;

    let transition = if is_correct {
        attempt.score += question.points;
        attempt.correct_answers_in_level += 1;

        if attempt.correct_answers_in_level >= level.number_of_questions {
            if attempt.current_level == test.total_levels {
                attempt.completed = true;
                AnswerTransition::TestCompleted {
                    score: attempt.score,
                    max_score: attempt.max_score,
                    percentage: attempt.percentage(),
                }
            } else {
                let completed_level = attempt.current_level;
                attempt.current_level += 1;
                attempt.correct_answers_in_level = 0;
                AnswerTransition::LevelCompleted {
                    completed_level,
                    next_level: attempt.current_level,
                }
            }
        } else {
            AnswerTransition::CorrectAnswer
        }
    } else {
        attempt.remaining_hearts -= 1;

        if attempt.remaining_hearts <= 0 {
            attempt.remaining_hearts = test.hearts_per_attempt;
            attempt.attempts += 1;
            attempt.last_attempt_date = Utc::now();
            AnswerTransition::AttemptFailed {
                attempts: attempt.attempts,
                hearts_restored: attempt.remaining_hearts,
            }
        } else {
            AnswerTransition::IncorrectAnswer {
                remaining_hearts: attempt.remaining_hearts,
            }
        }
    };

    Ok(AnswerEvaluation {
        is_correct,
        correct_answer: question.correct_answer.clone(),
        explanation: question.explanation.clone(),
        transition,
    })
}

/// Consume one hint: marks two of the question's incorrect options as
/// eliminated, chosen uniformly at random without replacement. The correct
/// answer is never among them.
pub fn use_hint(
    attempt: &mut TestAttempt,
    test: &Test,
    question: &Question,
) -> AppResult<Vec<String>> {
    guard_question_access(attempt, test, question)?;

    if attempt.hints_used >= test.hints_per_attempt {
        return Err(AppError::LimitExceeded(
            "All available hints have been used".to_string(),
        ));
    }

    attempt.hints_used += 1;

    let incorrect = question.incorrect_options();
    let mut rng = rand::thread_rng();
    let eliminated = incorrect
        .choose_multiple(&mut rng, HINT_ELIMINATED_OPTIONS)
        .map(|option| option.to_string())
        .collect();

    Ok(eliminated)
}

fn guard_question_access(
    attempt: &TestAttempt,
    test: &Test,
    question: &Question,
) -> AppResult<()> {
    if attempt.completed {
        return Err(AppError::Forbidden(
            "Test is already completed".to_string(),
        ));
    }

    if question.test_id != test.id || question.level != attempt.current_level {
        return Err(AppError::Forbidden(
            "Question does not belong to the current level of this test".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::test::Level;

    fn make_test(levels: Vec<(i32, i32)>, hearts: i32, hints: i32) -> Test {
        Test::new(
            "Fractions",
            None,
            "admin-1",
            None,
            Some("Grade 5".to_string()),
            levels
                .into_iter()
                .map(|(level_number, number_of_questions)| Level {
                    level_number,
                    number_of_questions,
                    question_ids: vec![],
                })
                .collect(),
            Some(hearts),
            Some(hints),
        )
    }

    fn make_question(test: &Test, level: i32, points: i32) -> Question {
        Question::new(
            "What is 2 + 2?",
            vec![
                "3".to_string(),
                "4".to_string(),
                "5".to_string(),
                "22".to_string(),
            ],
            "4",
            "Two plus two is four.",
            level,
            &test.id,
            Some(points),
            vec![],
        )
    }

    fn start(test: &Test, questions: &[Question]) -> TestAttempt {
        new_attempt("student-1", test, questions)
    }

    #[test]
    fn max_score_sums_points_and_counts_unauthored_slots() {
        let test = make_test(vec![(1, 3), (2, 2)], 6, 4);
        // Level 1 has one authored 5-point question, two unauthored slots;
        // level 2 has nothing authored.
        let questions = vec![make_question(&test, 1, 5)];

        let attempt = start(&test, &questions);

        assert_eq!(attempt.total_questions, 5);
        assert_eq!(attempt.max_score, 5 + 2 + 2);
    }

    #[test]
    fn answer_comparison_is_case_sensitive_exact_match() {
        let test = make_test(vec![(1, 2)], 6, 4);
        let mut question = make_question(&test, 1, 1);
        question.options = vec!["Paris".to_string(), "paris".to_string()];
        question.correct_answer = "Paris".to_string();
        let mut attempt = start(&test, &[question.clone()]);

        let evaluation = answer_question(&mut attempt, &test, &question, "paris").unwrap();
        assert!(!evaluation.is_correct);

        let evaluation = answer_question(&mut attempt, &test, &question, "Paris").unwrap();
        assert!(evaluation.is_correct);
        assert_eq!(evaluation.correct_answer, "Paris");
    }

    #[test]
    fn exactly_the_kth_correct_answer_advances_the_level() {
        let test = make_test(vec![(1, 3), (2, 1)], 6, 4);
        let question = make_question(&test, 1, 1);
        let mut attempt = start(&test, &[]);

        for expected_count in 1..=2 {
            let evaluation =
                answer_question(&mut attempt, &test, &question, "4").unwrap();
            assert_eq!(evaluation.transition, AnswerTransition::CorrectAnswer);
            assert_eq!(attempt.correct_answers_in_level, expected_count);
            assert_eq!(attempt.current_level, 1);
        }

        let evaluation = answer_question(&mut attempt, &test, &question, "4").unwrap();
        assert_eq!(
            evaluation.transition,
            AnswerTransition::LevelCompleted {
                completed_level: 1,
                next_level: 2,
            }
        );
        assert_eq!(attempt.current_level, 2);
        assert_eq!(attempt.correct_answers_in_level, 0);
    }

    #[test]
    fn completing_the_final_level_completes_the_test() {
        let test = make_test(vec![(1, 1), (2, 1)], 6, 4);
        let level1_question = make_question(&test, 1, 1);
        let level2_question = make_question(&test, 2, 1);
        let mut attempt = start(
            &test,
            &[level1_question.clone(), level2_question.clone()],
        );

        let evaluation =
            answer_question(&mut attempt, &test, &level1_question, "4").unwrap();
        assert_eq!(
            evaluation.transition,
            AnswerTransition::LevelCompleted {
                completed_level: 1,
                next_level: 2,
            }
        );

        let evaluation =
            answer_question(&mut attempt, &test, &level2_question, "4").unwrap();
        assert_eq!(
            evaluation.transition,
            AnswerTransition::TestCompleted {
                score: 2,
                max_score: 2,
                percentage: 100,
            }
        );
        assert!(attempt.completed);
        assert_eq!(attempt.score, attempt.max_score);
    }

    #[test]
    fn score_is_monotonic_and_bounded_by_max_score() {
        let test = make_test(vec![(1, 2), (2, 1)], 6, 4);
        let mut attempt = start(&test, &[]);

        let mut last_score = attempt.score;
        for answer in ["4", "wrong", "4", "wrong", "4"] {
            let question = make_question(&test, attempt.current_level, 1);
            answer_question(&mut attempt, &test, &question, answer).unwrap();
            assert!(attempt.score >= last_score);
            assert!(attempt.score <= attempt.max_score);
            last_score = attempt.score;
        }
    }

    #[test]
    fn heart_exhaustion_resets_hearts_without_losing_progress() {
        let test = make_test(vec![(1, 2), (2, 1)], 3, 4);
        let question = make_question(&test, 1, 1);
        let mut attempt = start(&test, &[]);

        // Bank one correct answer first so there is progress to keep.
        answer_question(&mut attempt, &test, &question, "4").unwrap();
        let score_before = attempt.score;
        let level_before = attempt.current_level;

        let evaluation = answer_question(&mut attempt, &test, &question, "x").unwrap();
        assert_eq!(
            evaluation.transition,
            AnswerTransition::IncorrectAnswer {
                remaining_hearts: 2
            }
        );

        let evaluation = answer_question(&mut attempt, &test, &question, "x").unwrap();
        assert_eq!(
            evaluation.transition,
            AnswerTransition::IncorrectAnswer {
                remaining_hearts: 1
            }
        );

        let evaluation = answer_question(&mut attempt, &test, &question, "x").unwrap();
        assert_eq!(
            evaluation.transition,
            AnswerTransition::AttemptFailed {
                attempts: 2,
                hearts_restored: 3,
            }
        );

        assert_eq!(attempt.remaining_hearts, 3);
        assert_eq!(attempt.attempts, 2);
        assert_eq!(attempt.score, score_before);
        assert_eq!(attempt.current_level, level_before);
    }

    #[test]
    fn answer_rejects_question_from_another_level_or_test() {
        let test = make_test(vec![(1, 1), (2, 1)], 6, 4);
        let mut attempt = start(&test, &[]);

        let level2_question = make_question(&test, 2, 1);
        let result = answer_question(&mut attempt, &test, &level2_question, "4");
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let mut foreign_question = make_question(&test, 1, 1);
        foreign_question.test_id = "other-test".to_string();
        let result = answer_question(&mut attempt, &test, &foreign_question, "4");
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        // Guard failures leave the attempt untouched.
        assert_eq!(attempt.score, 0);
        assert_eq!(attempt.remaining_hearts, 6);
    }

    #[test]
    fn answer_rejects_completed_attempt() {
        let test = make_test(vec![(1, 1)], 6, 4);
        let question = make_question(&test, 1, 1);
        let mut attempt = start(&test, &[question.clone()]);

        answer_question(&mut attempt, &test, &question, "4").unwrap();
        assert!(attempt.completed);

        let result = answer_question(&mut attempt, &test, &question, "4");
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(attempt.score, attempt.max_score);
    }

    #[test]
    fn answer_fails_when_current_level_is_missing_from_definition() {
        let test = make_test(vec![(1, 1), (3, 1)], 6, 4);
        let question = make_question(&test, 2, 1);
        let mut attempt = start(&test, &[]);
        attempt.current_level = 2;

        let result = answer_question(&mut attempt, &test, &question, "4");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn hint_cap_is_enforced() {
        let test = make_test(vec![(1, 2)], 6, 4);
        let question = make_question(&test, 1, 1);
        let mut attempt = start(&test, &[]);

        for used in 1..=4 {
            let eliminated = use_hint(&mut attempt, &test, &question).unwrap();
            assert_eq!(eliminated.len(), 2);
            assert_eq!(attempt.hints_used, used);
        }

        let result = use_hint(&mut attempt, &test, &question);
        assert!(matches!(result, Err(AppError::LimitExceeded(_))));
        assert_eq!(attempt.hints_used, 4);
    }

    #[test]
    fn hint_never_reveals_the_correct_answer() {
        let test = make_test(vec![(1, 2)], 6, 1000);
        let question = make_question(&test, 1, 1);
        let mut attempt = start(&test, &[]);

        for _ in 0..100 {
            let eliminated = use_hint(&mut attempt, &test, &question).unwrap();
            assert_eq!(eliminated.len(), 2);
            assert!(!eliminated.contains(&question.correct_answer));
            for option in &eliminated {
                assert!(question.options.contains(option));
            }
        }
    }

    #[test]
    fn hint_eliminates_what_exists_when_few_incorrect_options() {
        let test = make_test(vec![(1, 2)], 6, 4);
        let mut question = make_question(&test, 1, 1);
        question.options = vec!["yes".to_string(), "no".to_string()];
        question.correct_answer = "yes".to_string();
        let mut attempt = start(&test, &[]);

        let eliminated = use_hint(&mut attempt, &test, &question).unwrap();
        assert_eq!(eliminated, vec!["no".to_string()]);
    }

    #[test]
    fn hint_rejects_question_outside_current_level() {
        let test = make_test(vec![(1, 1), (2, 1)], 6, 4);
        let question = make_question(&test, 2, 1);
        let mut attempt = start(&test, &[]);

        let result = use_hint(&mut attempt, &test, &question);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(attempt.hints_used, 0);
    }
}
