use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Test, TestAttempt},
    repositories::{AttemptRepository, TestRepository},
};

/// Read-only reporting over persisted attempt records. This never mutates
/// attempts; it only folds what the attempt flow has written.
pub struct ReportService {
    tests: Arc<dyn TestRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAttemptRow {
    pub student_id: String,
    pub class_name: String,
    pub completed: bool,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub current_level: i32,
    pub attempts: i32,
    pub hints_used: i32,
    pub last_attempt_date: DateTime<Utc>,
}

impl From<&TestAttempt> for StudentAttemptRow {
    fn from(attempt: &TestAttempt) -> Self {
        StudentAttemptRow {
            student_id: attempt.student_id.clone(),
            class_name: attempt.class_name.clone(),
            completed: attempt.completed,
            score: attempt.score,
            max_score: attempt.max_score,
            percentage: attempt.percentage(),
            current_level: attempt.current_level,
            attempts: attempt.attempts,
            hints_used: attempt.hints_used,
            last_attempt_date: attempt.last_attempt_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestReportStatistics {
    pub total_students: usize,
    pub completed_count: usize,
    pub average_score: i32,
    pub average_percentage: i32,
    pub average_attempts: f64,
    pub highest_score: i32,
    pub lowest_score: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub test_id: String,
    pub test_title: String,
    pub total_levels: i32,
    pub hearts_per_attempt: i32,
    pub hints_per_attempt: i32,
    pub statistics: TestReportStatistics,
    pub results: Vec<StudentAttemptRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentTestRow {
    pub test_id: String,
    pub test_title: String,
    pub total_levels: i32,
    pub completed: bool,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub current_level: i32,
    pub attempts: i32,
    pub hints_used: i32,
    pub last_attempt_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentReportStatistics {
    pub total_tests: usize,
    pub completed_tests: usize,
    pub average_percentage: i32,
    pub total_attempts: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentReport {
    pub student_id: String,
    pub statistics: StudentReportStatistics,
    pub results: Vec<StudentTestRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerTestStatistics {
    pub test_id: String,
    pub title: String,
    pub students_count: usize,
    pub completed_count: usize,
    pub completion_rate: i32,
    pub average_percentage: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneralStatistics {
    pub total_tests: usize,
    pub active_tests: usize,
    pub unique_students: usize,
    pub total_attempts: i32,
    pub completed_attempts: usize,
    pub completion_rate: i32,
    pub average_percentage: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewReport {
    pub general: GeneralStatistics,
    pub tests: Vec<PerTestStatistics>,
}

impl ReportService {
    pub fn new(tests: Arc<dyn TestRepository>, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { tests, attempts }
    }

    /// Every student's standing on one test, plus aggregate statistics.
    pub async fn test_report(&self, admin_id: &str, test_id: &str) -> AppResult<TestReport> {
        let test = self.owned_test(admin_id, test_id).await?;
        let attempts = self.attempts.find_by_test(test_id).await?;

        let results: Vec<StudentAttemptRow> =
            attempts.iter().map(StudentAttemptRow::from).collect();

        Ok(TestReport {
            test_id: test.id,
            test_title: test.title,
            total_levels: test.total_levels,
            hearts_per_attempt: test.hearts_per_attempt,
            hints_per_attempt: test.hints_per_attempt,
            statistics: test_statistics(&attempts),
            results,
        })
    }

    /// One student's standing across all of the admin's tests.
    pub async fn student_report(
        &self,
        admin_id: &str,
        student_id: &str,
    ) -> AppResult<StudentReport> {
        let admin_tests = self.tests.find_by_admin(admin_id).await?;
        let attempts = self.attempts.find_by_student(student_id).await?;

        let mut results = Vec::new();
        for test in &admin_tests {
            if let Some(attempt) = attempts.iter().find(|a| a.test_id == test.id) {
                results.push(StudentTestRow {
                    test_id: test.id.clone(),
                    test_title: test.title.clone(),
                    total_levels: test.total_levels,
                    completed: attempt.completed,
                    score: attempt.score,
                    max_score: attempt.max_score,
                    percentage: attempt.percentage(),
                    current_level: attempt.current_level,
                    attempts: attempt.attempts,
                    hints_used: attempt.hints_used,
                    last_attempt_date: attempt.last_attempt_date,
                });
            }
        }

        let completed_tests = results.iter().filter(|r| r.completed).count();
        let average_percentage = average(results.iter().map(|r| r.percentage));
        let total_attempts = results.iter().map(|r| r.attempts).sum();

        Ok(StudentReport {
            student_id: student_id.to_string(),
            statistics: StudentReportStatistics {
                total_tests: results.len(),
                completed_tests,
                average_percentage,
                total_attempts,
            },
            results,
        })
    }

    /// Aggregate statistics across all of the admin's tests.
    pub async fn overview(&self, admin_id: &str) -> AppResult<OverviewReport> {
        let tests = self.tests.find_by_admin(admin_id).await?;
        let test_ids: Vec<String> = tests.iter().map(|t| t.id.clone()).collect();
        let attempts = self.attempts.find_by_tests(&test_ids).await?;

        let per_test: Vec<PerTestStatistics> = tests
            .iter()
            .map(|test| {
                let test_attempts: Vec<&TestAttempt> =
                    attempts.iter().filter(|a| a.test_id == test.id).collect();
                let completed_count =
                    test_attempts.iter().filter(|a| a.completed).count();

                PerTestStatistics {
                    test_id: test.id.clone(),
                    title: test.title.clone(),
                    students_count: test_attempts.len(),
                    completed_count,
                    completion_rate: rate(completed_count, test_attempts.len()),
                    average_percentage: average(
                        test_attempts.iter().map(|a| a.percentage()),
                    ),
                }
            })
            .collect();

        let unique_students: HashSet<&str> =
            attempts.iter().map(|a| a.student_id.as_str()).collect();
        let completed_attempts = attempts.iter().filter(|a| a.completed).count();

        Ok(OverviewReport {
            general: GeneralStatistics {
                total_tests: tests.len(),
                active_tests: tests.iter().filter(|t| t.is_active).count(),
                unique_students: unique_students.len(),
                total_attempts: attempts.iter().map(|a| a.attempts).sum(),
                completed_attempts,
                completion_rate: rate(completed_attempts, attempts.len()),
                average_percentage: average(attempts.iter().map(|a| a.percentage())),
            },
            tests: per_test,
        })
    }

    async fn owned_test(&self, admin_id: &str, test_id: &str) -> AppResult<Test> {
        self.tests
            .find_by_id(test_id)
            .await?
            .filter(|test| test.admin_id == admin_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Test '{}' not found or not owned by you",
                    test_id
                ))
            })
    }
}

fn test_statistics(attempts: &[TestAttempt]) -> TestReportStatistics {
    TestReportStatistics {
        total_students: attempts.len(),
        completed_count: attempts.iter().filter(|a| a.completed).count(),
        average_score: average(attempts.iter().map(|a| a.score)),
        average_percentage: average(attempts.iter().map(|a| a.percentage())),
        average_attempts: if attempts.is_empty() {
            0.0
        } else {
            let total: i32 = attempts.iter().map(|a| a.attempts).sum();
            (total as f64 / attempts.len() as f64 * 10.0).round() / 10.0
        },
        highest_score: attempts.iter().map(|a| a.score).max().unwrap_or(0),
        lowest_score: attempts.iter().map(|a| a.score).min().unwrap_or(0),
    }
}

fn average(values: impl Iterator<Item = i32>) -> i32 {
    let collected: Vec<i32> = values.collect();
    if collected.is_empty() {
        return 0;
    }
    let sum: i64 = collected.iter().map(|v| *v as i64).sum();
    (sum as f64 / collected.len() as f64).round() as i32
}

fn rate(part: usize, whole: usize) -> i32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::test::Level;
    use crate::repositories::{
        attempt_repository::MockAttemptRepository, test_repository::MockTestRepository,
    };

    fn make_test(id: &str, admin_id: &str) -> Test {
        let mut test = Test::new(
            "Fractions",
            None,
            admin_id,
            None,
            None,
            vec![Level {
                level_number: 1,
                number_of_questions: 2,
                question_ids: vec![],
            }],
            None,
            None,
        );
        test.id = id.to_string();
        test
    }

    fn make_attempt(student_id: &str, test_id: &str, score: i32, completed: bool) -> TestAttempt {
        let mut attempt = TestAttempt::new(student_id, test_id, 2, 10, 6, "general".to_string());
        attempt.score = score;
        attempt.completed = completed;
        attempt
    }

    #[tokio::test]
    async fn test_report_aggregates_scores() {
        let mut tests = MockTestRepository::new();
        tests
            .expect_find_by_id()
            .returning(|_| Ok(Some(make_test("test-1", "admin-1"))));

        let mut attempts = MockAttemptRepository::new();
        attempts.expect_find_by_test().returning(|_| {
            Ok(vec![
                make_attempt("s1", "test-1", 10, true),
                make_attempt("s2", "test-1", 5, false),
            ])
        });

        let service = ReportService::new(Arc::new(tests), Arc::new(attempts));

        let report = service.test_report("admin-1", "test-1").await.unwrap();

        assert_eq!(report.statistics.total_students, 2);
        assert_eq!(report.statistics.completed_count, 1);
        assert_eq!(report.statistics.highest_score, 10);
        assert_eq!(report.statistics.lowest_score, 5);
        assert_eq!(report.statistics.average_score, 8); // (10 + 5) / 2 rounded
        assert_eq!(report.statistics.average_percentage, 75);
        assert_eq!(report.results.len(), 2);
    }

    #[tokio::test]
    async fn test_report_requires_ownership() {
        let mut tests = MockTestRepository::new();
        tests
            .expect_find_by_id()
            .returning(|_| Ok(Some(make_test("test-1", "someone-else"))));

        let service = ReportService::new(Arc::new(tests), Arc::new(MockAttemptRepository::new()));

        let result = service.test_report("admin-1", "test-1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn student_report_covers_only_admin_tests() {
        let mut tests = MockTestRepository::new();
        tests
            .expect_find_by_admin()
            .returning(|_| Ok(vec![make_test("test-1", "admin-1")]));

        let mut attempts = MockAttemptRepository::new();
        attempts.expect_find_by_student().returning(|_| {
            Ok(vec![
                make_attempt("s1", "test-1", 10, true),
                make_attempt("s1", "other-admins-test", 3, false),
            ])
        });

        let service = ReportService::new(Arc::new(tests), Arc::new(attempts));

        let report = service.student_report("admin-1", "s1").await.unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.statistics.total_tests, 1);
        assert_eq!(report.statistics.completed_tests, 1);
        assert_eq!(report.statistics.average_percentage, 100);
    }

    #[tokio::test]
    async fn overview_counts_unique_students_and_rates() {
        let mut tests = MockTestRepository::new();
        tests.expect_find_by_admin().returning(|_| {
            Ok(vec![
                make_test("test-1", "admin-1"),
                make_test("test-2", "admin-1"),
            ])
        });

        let mut attempts = MockAttemptRepository::new();
        attempts.expect_find_by_tests().returning(|_| {
            Ok(vec![
                make_attempt("s1", "test-1", 10, true),
                make_attempt("s2", "test-1", 4, false),
                make_attempt("s1", "test-2", 6, false),
            ])
        });

        let service = ReportService::new(Arc::new(tests), Arc::new(attempts));

        let report = service.overview("admin-1").await.unwrap();

        assert_eq!(report.general.total_tests, 2);
        assert_eq!(report.general.unique_students, 2);
        assert_eq!(report.general.completed_attempts, 1);
        assert_eq!(report.general.completion_rate, 33);
        assert_eq!(report.tests.len(), 2);
        assert_eq!(report.tests[0].students_count, 2);
        assert_eq!(report.tests[0].completion_rate, 50);
    }
}
