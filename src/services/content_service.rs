use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Question, Test},
    repositories::{QuestionRepository, TestRepository},
};

/// Read-only resolution of test and question content for the attempt flow.
pub struct ContentService {
    tests: Arc<dyn TestRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl ContentService {
    pub fn new(tests: Arc<dyn TestRepository>, questions: Arc<dyn QuestionRepository>) -> Self {
        Self { tests, questions }
    }

    /// Resolve a test that is active, and public when `require_public` is
    /// set. Missing, inactive and non-public tests are indistinguishable to
    /// the caller.
    pub async fn get_active_test(&self, test_id: &str, require_public: bool) -> AppResult<Test> {
        self.tests
            .find_active(test_id, require_public)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Test '{}' not found or not active", test_id))
            })
    }

    pub async fn get_test(&self, test_id: &str) -> AppResult<Option<Test>> {
        self.tests.find_by_id(test_id).await
    }

    pub async fn list_available_tests(&self) -> AppResult<Vec<Test>> {
        self.tests.find_public_active().await
    }

    pub async fn get_question(&self, question_id: &str) -> AppResult<Question> {
        self.questions
            .find_by_id(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", question_id)))
    }

    pub async fn get_questions_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        self.questions.find_by_ids(ids).await
    }

    /// All authored questions of a test, gathered through the levels'
    /// question id references.
    pub async fn get_authored_questions(&self, test: &Test) -> AppResult<Vec<Question>> {
        let ids: Vec<String> = test
            .levels
            .iter()
            .flat_map(|level| level.question_ids.iter().cloned())
            .collect();
        self.questions.find_by_ids(&ids).await
    }

    /// The questions of one level of a test. Fails with `NotFound` when the
    /// level number has no matching level definition.
    pub async fn get_level_questions(
        &self,
        test: &Test,
        level_number: i32,
    ) -> AppResult<Vec<Question>> {
        let level = test.level(level_number).ok_or_else(|| {
            AppError::NotFound(format!(
                "Level {} not found in test '{}'",
                level_number, test.id
            ))
        })?;

        self.questions.find_by_ids(&level.question_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::test::Level;
    use crate::repositories::{
        question_repository::MockQuestionRepository, test_repository::MockTestRepository,
    };

    fn make_test_with_level_questions() -> Test {
        Test::new(
            "Fractions",
            None,
            "admin-1",
            None,
            None,
            vec![Level {
                level_number: 1,
                number_of_questions: 2,
                question_ids: vec!["q1".to_string(), "q2".to_string()],
            }],
            None,
            None,
        )
    }

    #[tokio::test]
    async fn get_active_test_maps_missing_to_not_found() {
        let mut tests = MockTestRepository::new();
        tests
            .expect_find_active()
            .returning(|_, _| Ok(None));

        let service = ContentService::new(Arc::new(tests), Arc::new(MockQuestionRepository::new()));

        let result = service.get_active_test("missing", true).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn get_level_questions_rejects_unknown_level() {
        let service = ContentService::new(
            Arc::new(MockTestRepository::new()),
            Arc::new(MockQuestionRepository::new()),
        );
        let test = make_test_with_level_questions();

        let result = service.get_level_questions(&test, 7).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn get_authored_questions_collects_ids_across_levels() {
        let mut questions = MockQuestionRepository::new();
        questions
            .expect_find_by_ids()
            .withf(|ids| ids.len() == 2 && ids[0] == "q1" && ids[1] == "q2")
            .returning(|_| Ok(vec![]));

        let service = ContentService::new(Arc::new(MockTestRepository::new()), Arc::new(questions));
        let test = make_test_with_level_questions();

        let result = service.get_authored_questions(&test).await;
        assert!(result.is_ok());
    }
}
