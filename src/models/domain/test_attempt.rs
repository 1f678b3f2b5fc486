use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The per-(student, test) progress record, the single source of truth for
/// level progress, score, hearts and hints. At most one record exists per
/// (student_id, test_id); a unique compound index enforces this.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestAttempt {
    pub student_id: String,
    pub test_id: String,
    pub current_level: i32,
    pub correct_answers_in_level: i32,
    pub completed: bool,
    pub score: i32,
    pub max_score: i32,
    pub total_questions: i32,
    pub hints_used: i32,
    pub remaining_hearts: i32,
    pub attempts: i32,
    pub last_attempt_date: DateTime<Utc>,
    pub class_name: String,
    /// Bumped on every save; saves are rejected when the stored version
    /// differs, so concurrent read-modify-write cycles cannot lose updates.
    pub version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl TestAttempt {
    pub fn new(
        student_id: &str,
        test_id: &str,
        total_questions: i32,
        max_score: i32,
        hearts_per_attempt: i32,
        class_name: String,
    ) -> Self {
        TestAttempt {
            student_id: student_id.to_string(),
            test_id: test_id.to_string(),
            current_level: 1,
            correct_answers_in_level: 0,
            completed: false,
            score: 0,
            max_score,
            total_questions,
            hints_used: 0,
            remaining_hearts: hearts_per_attempt,
            attempts: 1,
            last_attempt_date: Utc::now(),
            class_name,
            version: 1,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    /// Score as a whole percentage of `max_score`; 0 when no score is
    /// attainable.
    pub fn percentage(&self) -> i32 {
        if self.max_score == 0 {
            return 0;
        }
        ((self.score as f64 / self.max_score as f64) * 100.0).round() as i32
    }
}
