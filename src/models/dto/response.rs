use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{Question, Test, TestAttempt};

/// Question as shown to a student mid-attempt: the correct answer and the
/// explanation are stripped until the answer is submitted.
#[derive(Debug, Clone, Serialize)]
pub struct StudentQuestionDto {
    pub id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub options_images: Vec<String>,
}

impl From<&Question> for StudentQuestionDto {
    fn from(question: &Question) -> Self {
        StudentQuestionDto {
            id: question.id.clone(),
            question_text: question.question_text.clone(),
            options: question.options.clone(),
            options_images: question.options_images.clone(),
        }
    }
}

/// Progress projection of an attempt against its test definition.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressDto {
    pub current_level: i32,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub attempts: i32,
    pub hints_remaining: i32,
    pub hearts_remaining: i32,
}

impl ProgressDto {
    pub fn project(attempt: &TestAttempt, test: &Test) -> Self {
        ProgressDto {
            current_level: attempt.current_level,
            score: attempt.score,
            max_score: attempt.max_score,
            percentage: attempt.percentage(),
            correct_answers: attempt.correct_answers_in_level,
            total_questions: attempt.total_questions,
            attempts: attempt.attempts,
            hints_remaining: (test.hints_per_attempt - attempt.hints_used).max(0),
            hearts_remaining: attempt.remaining_hearts,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartTestResponse {
    pub test_id: String,
    pub title: String,
    pub current_level: i32,
    pub total_levels: i32,
    pub hearts_per_attempt: i32,
    pub hints_per_attempt: i32,
    pub progress: ProgressDto,
    pub questions: Vec<StudentQuestionDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelCompletionDto {
    pub completed_level: i32,
    pub next_level: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalScoreDto {
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptFailureDto {
    pub attempts: i32,
    pub hearts_restored: i32,
}

/// Post-submission view. The correct answer and explanation are always
/// revealed once an answer has been submitted.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hearts_remaining: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_completed: Option<LevelCompletionDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_completed: Option<FinalScoreDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_failed: Option<AttemptFailureDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HintResponse {
    pub eliminated_options: Vec<String>,
    pub remaining_hints: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    New,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetDto {
    pub total: i32,
    pub remaining: i32,
}

/// Entry in the public test catalogue, with the caller's progress merged in
/// when the request carries a valid identity.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableTestDto {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub class_name: String,
    pub total_levels: i32,
    pub hearts: BudgetDto,
    pub hints: BudgetDto,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressDto>,
}

impl AvailableTestDto {
    pub fn project(test: &Test, attempt: Option<&TestAttempt>) -> Self {
        let status = match attempt {
            None => AttemptStatus::New,
            Some(a) if a.completed => AttemptStatus::Completed,
            Some(_) => AttemptStatus::InProgress,
        };

        AvailableTestDto {
            id: test.id.clone(),
            title: test.title.clone(),
            description: test.description.clone(),
            class_name: test.class_label(),
            total_levels: test.total_levels,
            hearts: BudgetDto {
                total: test.hearts_per_attempt,
                remaining: attempt
                    .map(|a| a.remaining_hearts)
                    .unwrap_or(test.hearts_per_attempt),
            },
            hints: BudgetDto {
                total: test.hints_per_attempt,
                remaining: attempt
                    .map(|a| (test.hints_per_attempt - a.hints_used).max(0))
                    .unwrap_or(test.hints_per_attempt),
            },
            status,
            progress: attempt.map(|a| ProgressDto::project(a, test)),
        }
    }
}

/// Row in the caller's own results listing.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSummaryDto {
    pub test_id: String,
    pub test_title: String,
    pub class_name: String,
    pub completed: bool,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub current_level: i32,
    pub total_levels: i32,
    pub attempts: i32,
    pub last_attempt_date: DateTime<Utc>,
}

impl ResultSummaryDto {
    pub fn project(attempt: &TestAttempt, test: &Test) -> Self {
        ResultSummaryDto {
            test_id: test.id.clone(),
            test_title: test.title.clone(),
            class_name: attempt.class_name.clone(),
            completed: attempt.completed,
            score: attempt.score,
            max_score: attempt.max_score,
            percentage: attempt.percentage(),
            current_level: attempt.current_level,
            total_levels: test.total_levels,
            attempts: attempt.attempts,
            last_attempt_date: attempt.last_attempt_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Excellent,
    VeryGood,
    Good,
    NeedsImprovement,
}

impl PerformanceRating {
    pub fn from_percentage(percentage: i32) -> Self {
        if percentage >= 90 {
            PerformanceRating::Excellent
        } else if percentage >= 75 {
            PerformanceRating::VeryGood
        } else if percentage >= 60 {
            PerformanceRating::Good
        } else {
            PerformanceRating::NeedsImprovement
        }
    }
}

pub const CERTIFICATE_PERCENTAGE_THRESHOLD: i32 = 60;

#[derive(Debug, Clone, Serialize)]
pub struct LevelPerformanceDto {
    pub level_number: i32,
    pub required_correct_answers: i32,
    pub max_score: i32,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificateDto {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedResultResponse {
    pub test_id: String,
    pub test_title: String,
    pub class_name: String,
    pub total_levels: i32,
    pub hearts_per_attempt: i32,
    pub hints_per_attempt: i32,
    pub completed: bool,
    pub hints_used: i32,
    pub progress: ProgressDto,
    pub level_performance: Vec<LevelPerformanceDto>,
    pub rating: PerformanceRating,
    pub certificate: CertificateDto,
}

impl DetailedResultResponse {
    pub fn project(attempt: &TestAttempt, test: &Test, questions: &[Question]) -> Self {
        let level_performance = test
            .levels
            .iter()
            .map(|level| {
                let level_max_score: i32 = questions
                    .iter()
                    .filter(|q| q.level == level.level_number)
                    .map(|q| q.points)
                    .sum();

                LevelPerformanceDto {
                    level_number: level.level_number,
                    required_correct_answers: level.number_of_questions,
                    max_score: level_max_score,
                    completed: attempt.current_level > level.level_number || attempt.completed,
                }
            })
            .collect();

        let percentage = attempt.percentage();
        let eligible = attempt.completed && percentage >= CERTIFICATE_PERCENTAGE_THRESHOLD;
        let certificate_id = eligible.then(|| certificate_id(&test.id, &attempt.student_id));

        DetailedResultResponse {
            test_id: test.id.clone(),
            test_title: test.title.clone(),
            class_name: attempt.class_name.clone(),
            total_levels: test.total_levels,
            hearts_per_attempt: test.hearts_per_attempt,
            hints_per_attempt: test.hints_per_attempt,
            completed: attempt.completed,
            hints_used: attempt.hints_used,
            progress: ProgressDto::project(attempt, test),
            level_performance,
            rating: PerformanceRating::from_percentage(percentage),
            certificate: CertificateDto {
                eligible,
                certificate_id,
            },
        }
    }
}

fn certificate_id(test_id: &str, student_id: &str) -> String {
    fn tail(id: &str) -> &str {
        let start = id.len().saturating_sub(8);
        &id[start..]
    }
    format!("CERT-{}-{}", tail(test_id), tail(student_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::test::Level;

    fn make_test() -> Test {
        Test::new(
            "Fractions",
            None,
            "admin-1",
            None,
            Some("Grade 5".to_string()),
            vec![
                Level {
                    level_number: 1,
                    number_of_questions: 1,
                    question_ids: vec!["q1".to_string()],
                },
                Level {
                    level_number: 2,
                    number_of_questions: 1,
                    question_ids: vec!["q2".to_string()],
                },
            ],
            Some(6),
            Some(4),
        )
    }

    fn make_question(id: &str, level: i32, test_id: &str) -> Question {
        let mut question = Question::new(
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
            test_id,
            None,
            vec![],
        );
        question.id = id.to_string();
        question
    }

    #[test]
    fn student_projection_strips_answer_and_explanation() {
        let question = make_question("q1", 1, "test-1");
        let dto = StudentQuestionDto::from(&question);

        let json = serde_json::to_string(&dto).expect("dto should serialize");
        assert!(!json.contains("correct_answer"));
        assert!(!json.contains("explanation"));
        assert!(json.contains("What is 2 + 2?"));
    }

    #[test]
    fn progress_projection_computes_remaining_budgets() {
        let test = make_test();
        let mut attempt = TestAttempt::new("student-1", &test.id, 2, 2, 6, test.class_label());
        attempt.hints_used = 3;
        attempt.remaining_hearts = 2;
        attempt.score = 1;

        let progress = ProgressDto::project(&attempt, &test);

        assert_eq!(progress.hints_remaining, 1);
        assert_eq!(progress.hearts_remaining, 2);
        assert_eq!(progress.percentage, 50);
    }

    #[test]
    fn progress_percentage_is_zero_when_no_score_attainable() {
        let test = make_test();
        let attempt = TestAttempt::new("student-1", &test.id, 0, 0, 6, test.class_label());

        let progress = ProgressDto::project(&attempt, &test);
        assert_eq!(progress.percentage, 0);
    }

    #[test]
    fn rating_thresholds() {
        assert_eq!(
            PerformanceRating::from_percentage(90),
            PerformanceRating::Excellent
        );
        assert_eq!(
            PerformanceRating::from_percentage(89),
            PerformanceRating::VeryGood
        );
        assert_eq!(PerformanceRating::from_percentage(60), PerformanceRating::Good);
        assert_eq!(
            PerformanceRating::from_percentage(59),
            PerformanceRating::NeedsImprovement
        );
    }

    #[test]
    fn detailed_result_marks_passed_levels_and_certificate() {
        let test = make_test();
        let questions = vec![
            make_question("q1", 1, &test.id),
            make_question("q2", 2, &test.id),
        ];
        let mut attempt = TestAttempt::new("student-abcdefgh", &test.id, 2, 2, 6, test.class_label());
        attempt.current_level = 2;
        attempt.completed = true;
        attempt.score = 2;

        let detailed = DetailedResultResponse::project(&attempt, &test, &questions);

        assert!(detailed.level_performance[0].completed);
        assert!(detailed.level_performance[1].completed);
        assert_eq!(detailed.rating, PerformanceRating::Excellent);
        assert!(detailed.certificate.eligible);
        let id = detailed.certificate.certificate_id.expect("certificate id");
        assert!(id.starts_with("CERT-"));
        assert!(id.ends_with("abcdefgh"));
    }

    #[test]
    fn detailed_result_withholds_certificate_below_threshold() {
        let test = make_test();
        let questions = vec![
            make_question("q1", 1, &test.id),
            make_question("q2", 2, &test.id),
        ];
        let mut attempt = TestAttempt::new("student-1", &test.id, 2, 10, 6, test.class_label());
        attempt.completed = true;
        attempt.score = 5; // 50%

        let detailed = DetailedResultResponse::project(&attempt, &test, &questions);

        assert!(!detailed.certificate.eligible);
        assert!(detailed.certificate.certificate_id.is_none());
        assert_eq!(detailed.rating, PerformanceRating::NeedsImprovement);
    }

    #[test]
    fn available_test_projection_without_attempt_shows_full_budgets() {
        let test = make_test();
        let dto = AvailableTestDto::project(&test, None);

        assert!(matches!(dto.status, AttemptStatus::New));
        assert_eq!(dto.hearts.remaining, 6);
        assert_eq!(dto.hints.remaining, 4);
        assert!(dto.progress.is_none());
    }

    #[test]
    fn available_test_projection_merges_attempt_state() {
        let test = make_test();
        let mut attempt = TestAttempt::new("student-1", &test.id, 2, 2, 6, test.class_label());
        attempt.remaining_hearts = 4;
        attempt.hints_used = 1;

        let dto = AvailableTestDto::project(&test, Some(&attempt));

        assert!(matches!(dto.status, AttemptStatus::InProgress));
        assert_eq!(dto.hearts.remaining, 4);
        assert_eq!(dto.hints.remaining, 3);
        assert!(dto.progress.is_some());
    }
}
