use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{test::Level, Question, Test},
        dto::request::{AddQuestionsRequest, CreateTestRequest, UpdateTestSettingsRequest},
    },
    repositories::{AttemptRepository, ClassRepository, QuestionRepository, TestRepository},
};

#[derive(Debug, Clone, Serialize)]
pub struct TestDeletionSummary {
    pub test_id: String,
    pub questions_deleted: u64,
    pub attempts_deleted: u64,
}

/// Admin-side content management: tests, their levels and questions.
/// Deletion cascades over dependent records as an explicit saga.
pub struct TestService {
    tests: Arc<dyn TestRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
    classes: Arc<dyn ClassRepository>,
}

impl TestService {
    pub fn new(
        tests: Arc<dyn TestRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
        classes: Arc<dyn ClassRepository>,
    ) -> Self {
        Self {
            tests,
            questions,
            attempts,
            classes,
        }
    }

    pub async fn create_test(&self, admin_id: &str, request: CreateTestRequest) -> AppResult<Test> {
        request.validate()?;

        let mut seen = HashSet::new();
        for level in &request.levels {
            if !seen.insert(level.level_number) {
                return Err(AppError::ValidationError(format!(
                    "Duplicate level number {}",
                    level.level_number
                )));
            }
        }

        let (class_id, class_name) = match &request.class_id {
            Some(class_id) => {
                let class = self
                    .classes
                    .find_by_id_and_admin(class_id, admin_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "Class '{}' not found or not owned by you",
                            class_id
                        ))
                    })?;
                (Some(class.id), Some(class.name))
            }
            None => (None, None),
        };

        let levels = request
            .levels
            .iter()
            .map(|level| Level {
                level_number: level.level_number,
                number_of_questions: level.number_of_questions,
                question_ids: vec![],
            })
            .collect();

        let test = Test::new(
            &request.title,
            request.description.clone(),
            admin_id,
            class_id,
            class_name,
            levels,
            request.hearts_per_attempt,
            request.hints_per_attempt,
        );

        let created = self.tests.create(test).await?;
        log::info!("Admin '{}' created test '{}'", admin_id, created.id);

        Ok(created)
    }

    /// Author questions into one level of a test. The level's threshold
    /// caps how many questions it can hold in total.
    pub async fn add_questions(
        &self,
        admin_id: &str,
        test_id: &str,
        level_number: i32,
        request: AddQuestionsRequest,
    ) -> AppResult<Vec<Question>> {
        request.validate()?;

        let mut test = self.owned_test(admin_id, test_id).await?;

        let level = test.level(level_number).ok_or_else(|| {
            AppError::NotFound(format!(
                "Level {} not found in test '{}'",
                level_number, test_id
            ))
        })?;

        let capacity = level.number_of_questions as usize;
        if level.question_ids.len() + request.questions.len() > capacity {
            return Err(AppError::ValidationError(format!(
                "Level {} holds at most {} questions ({} already present)",
                level_number,
                capacity,
                level.question_ids.len()
            )));
        }

        let mut questions = Vec::with_capacity(request.questions.len());
        for input in &request.questions {
            if !input.options.contains(&input.correct_answer) {
                return Err(AppError::ValidationError(format!(
                    "Correct answer '{}' is not among the options",
                    input.correct_answer
                )));
            }

            questions.push(Question::new(
                &input.question_text,
                input.options.clone(),
                &input.correct_answer,
                input.explanation.as_deref().unwrap_or(""),
                level_number,
                test_id,
                input.points,
                input.options_images.clone().unwrap_or_default(),
            ));
        }

        let created = self.questions.create_many(questions).await?;

        let level = test
            .level_mut(level_number)
            .expect("level existed above");
        level
            .question_ids
            .extend(created.iter().map(|q| q.id.clone()));
        test.modified_at = Some(Utc::now());
        self.tests.update(test).await?;

        log::info!(
            "Admin '{}' added {} questions to level {} of test '{}'",
            admin_id,
            created.len(),
            level_number,
            test_id
        );

        Ok(created)
    }

    pub async fn list_admin_tests(&self, admin_id: &str) -> AppResult<Vec<Test>> {
        self.tests.find_by_admin(admin_id).await
    }

    pub async fn get_admin_test(
        &self,
        admin_id: &str,
        test_id: &str,
    ) -> AppResult<(Test, Vec<Question>)> {
        let test = self.owned_test(admin_id, test_id).await?;
        let questions = self.questions.find_by_test(test_id).await?;
        Ok((test, questions))
    }

    pub async fn list_class_tests(&self, admin_id: &str, class_id: &str) -> AppResult<Vec<Test>> {
        self.tests.find_by_class(class_id, admin_id).await
    }

    /// Apply a settings update; every field is an independent optional.
    pub async fn update_settings(
        &self,
        admin_id: &str,
        test_id: &str,
        request: UpdateTestSettingsRequest,
    ) -> AppResult<Test> {
        request.validate()?;

        let mut test = self.owned_test(admin_id, test_id).await?;

        if let Some(title) = request.title {
            test.title = title;
        }
        if let Some(description) = request.description {
            test.description = Some(description);
        }
        if let Some(is_active) = request.is_active {
            test.is_active = is_active;
        }
        if let Some(is_public) = request.is_public {
            test.is_public = is_public;
        }
        if let Some(hearts) = request.hearts_per_attempt {
            test.hearts_per_attempt = hearts;
        }
        if let Some(hints) = request.hints_per_attempt {
            test.hints_per_attempt = hints;
        }
        test.modified_at = Some(Utc::now());

        self.tests.update(test).await
    }

    /// Delete a test and everything hanging off it, as a saga:
    /// deactivate first (no new attempts while deleting), then questions,
    /// then attempts, then the test itself. A failure mid-way reactivates
    /// the test so it is never left half-deleted but unreachable.
    pub async fn delete_test(
        &self,
        admin_id: &str,
        test_id: &str,
    ) -> AppResult<TestDeletionSummary> {
        let test = self.owned_test(admin_id, test_id).await?;

        let was_active = test.is_active;
        if was_active {
            let mut deactivated = test.clone();
            deactivated.is_active = false;
            deactivated.modified_at = Some(Utc::now());
            self.tests.update(deactivated).await?;
        }

        let result = self.delete_dependents_and_test(test_id).await;

        match result {
            Ok(summary) => {
                log::info!(
                    "Admin '{}' deleted test '{}' ({} questions, {} attempts)",
                    admin_id,
                    test_id,
                    summary.questions_deleted,
                    summary.attempts_deleted
                );
                Ok(summary)
            }
            Err(err) => {
                log::error!(
                    "Deletion of test '{}' failed mid-saga, reactivating: {}",
                    test_id,
                    err
                );
                if was_active {
                    let mut restored = test;
                    restored.is_active = true;
                    restored.modified_at = Some(Utc::now());
                    if let Err(compensation_err) = self.tests.update(restored).await {
                        log::error!(
                            "Compensation failed for test '{}': {}",
                            test_id,
                            compensation_err
                        );
                    }
                }
                Err(err)
            }
        }
    }

    async fn delete_dependents_and_test(&self, test_id: &str) -> AppResult<TestDeletionSummary> {
        let questions_deleted = self.questions.delete_by_test(test_id).await?;
        let attempts_deleted = self.attempts.delete_by_test(test_id).await?;
        self.tests.delete(test_id).await?;

        Ok(TestDeletionSummary {
            test_id: test_id.to_string(),
            questions_deleted,
            attempts_deleted,
        })
    }

    async fn owned_test(&self, admin_id: &str, test_id: &str) -> AppResult<Test> {
        let test = self
            .tests
            .find_by_id(test_id)
            .await?
            .filter(|test| test.admin_id == admin_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Test '{}' not found or not owned by you",
                    test_id
                ))
            })?;
        Ok(test)
    }
}
