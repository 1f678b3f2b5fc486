use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_QUESTION_POINTS: i32 = 1;

/// A single quiz item. Owned by exactly one test via `test_id` and pinned to
/// one of its levels; read-only once students answer against it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub level: i32,
    pub test_id: String,
    pub points: i32,
    /// Blob-storage keys for per-option images; upload and serving live
    /// outside this service.
    pub options_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Question {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        question_text: &str,
        options: Vec<String>,
        correct_answer: &str,
        explanation: &str,
        level: i32,
        test_id: &str,
        points: Option<i32>,
        options_images: Vec<String>,
    ) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            question_text: question_text.to_string(),
            options,
            correct_answer: correct_answer.to_string(),
            explanation: explanation.to_string(),
            level,
            test_id: test_id.to_string(),
            points: points.unwrap_or(DEFAULT_QUESTION_POINTS),
            options_images,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    /// All options except the correct answer.
    pub fn incorrect_options(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|option| *option != &self.correct_answer)
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
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
            1,
            "test-1",
            None,
            vec![],
        )
    }

    #[test]
    fn new_question_defaults_to_one_point() {
        let question = sample_question();
        assert_eq!(question.points, DEFAULT_QUESTION_POINTS);
        assert_eq!(question.level, 1);
    }

    #[test]
    fn incorrect_options_excludes_correct_answer() {
        let question = sample_question();
        let incorrect = question.incorrect_options();

        assert_eq!(incorrect.len(), 3);
        assert!(!incorrect.contains(&"4"));
    }

    #[test]
    fn question_round_trip_serialization() {
        let question = sample_question();

        let json = serde_json::to_string(&question).expect("question should serialize");
        let parsed: Question =
            serde_json::from_str(&json).expect("question should deserialize");

        assert_eq!(parsed.correct_answer, "4");
        assert_eq!(parsed.options.len(), 4);
        assert_eq!(parsed.test_id, "test-1");
    }
}
