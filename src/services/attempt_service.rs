use std::collections::HashMap;
use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::TestAttempt,
        dto::{
            request::AnswerRequest,
            response::{
                AnswerResponse, AttemptFailureDto, AvailableTestDto, DetailedResultResponse,
                FinalScoreDto, HintResponse, LevelCompletionDto, ProgressDto, ResultSummaryDto,
                StartTestResponse, StudentQuestionDto,
            },
        },
    },
    repositories::AttemptRepository,
    services::{
        attempt_engine,
        attempt_engine::{AnswerEvaluation, AnswerTransition},
        content_service::ContentService,
    },
};

/// How many times a conflicting save is retried with freshly loaded state
/// before the conflict is surfaced to the caller.
const SAVE_RETRY_LIMIT: u32 = 3;

/// Orchestrates the attempt flow: resolve content, load the attempt, run
/// one engine operation, persist, project. Each operation is a single
/// read-modify-write cycle; version conflicts on save restart the cycle.
pub struct AttemptService {
    attempts: Arc<dyn AttemptRepository>,
    content: Arc<ContentService>,
}

impl AttemptService {
    pub fn new(attempts: Arc<dyn AttemptRepository>, content: Arc<ContentService>) -> Self {
        Self { attempts, content }
    }

    /// Start a test, or resume the existing attempt unchanged. Creation is
    /// idempotent under races: a concurrent insert is resolved by
    /// re-fetching the winner.
    pub async fn start_or_resume(
        &self,
        student_id: &str,
        test_id: &str,
    ) -> AppResult<StartTestResponse> {
        let test = self.content.get_active_test(test_id, true).await?;

        let attempt = match self
            .attempts
            .find_by_student_and_test(student_id, &test.id)
            .await?
        {
            Some(existing) => existing,
            None => {
                let authored = self.content.get_authored_questions(&test).await?;
                let fresh = attempt_engine::new_attempt(student_id, &test, &authored);

                match self.attempts.create(fresh).await {
                    Ok(created) => created,
                    Err(AppError::AlreadyExists(_)) => self
                        .attempts
                        .find_by_student_and_test(student_id, &test.id)
                        .await?
                        .ok_or_else(|| {
                            AppError::InternalError(
                                "Attempt vanished after duplicate create".to_string(),
                            )
                        })?,
                    Err(err) => return Err(err),
                }
            }
        };

        let questions = self
            .content
            .get_level_questions(&test, attempt.current_level)
            .await?;

        Ok(StartTestResponse {
            test_id: test.id.clone(),
            title: test.title.clone(),
            current_level: attempt.current_level,
            total_levels: test.total_levels,
            hearts_per_attempt: test.hearts_per_attempt,
            hints_per_attempt: test.hints_per_attempt,
            progress: ProgressDto::project(&attempt, &test),
            questions: questions.iter().map(StudentQuestionDto::from).collect(),
        })
    }

    /// Evaluate a submitted answer for the caller's attempt.
    pub async fn answer_question(
        &self,
        student_id: &str,
        test_id: &str,
        question_id: &str,
        request: AnswerRequest,
    ) -> AppResult<AnswerResponse> {
        request.validate()?;

        let test = self.content.get_active_test(test_id, false).await?;
        let question = self.content.get_question(question_id).await?;

        let mut retries = 0;
        loop {
            let mut attempt = self.require_attempt(student_id, &test.id).await?;

            let evaluation =
                attempt_engine::answer_question(&mut attempt, &test, &question, &request.answer)?;

            match self.attempts.save(attempt).await {
                Ok(_) => return Ok(answer_response(evaluation)),
                Err(AppError::AlreadyExists(message)) if retries < SAVE_RETRY_LIMIT => {
                    retries += 1;
                    log::debug!(
                        "Retrying answer for student '{}' on test '{}' after save conflict ({}): {}",
                        student_id,
                        test.id,
                        retries,
                        message
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Consume one hint for the caller's attempt and return the eliminated
    /// options.
    pub async fn use_hint(
        &self,
        student_id: &str,
        test_id: &str,
        question_id: &str,
    ) -> AppResult<HintResponse> {
        let test = self.content.get_active_test(test_id, false).await?;
        let question = self.content.get_question(question_id).await?;

        let mut retries = 0;
        loop {
            let mut attempt = self.require_attempt(student_id, &test.id).await?;

            let eliminated = attempt_engine::use_hint(&mut attempt, &test, &question)?;
            let remaining_hints = (test.hints_per_attempt - attempt.hints_used).max(0);

            match self.attempts.save(attempt).await {
                Ok(_) => {
                    return Ok(HintResponse {
                        eliminated_options: eliminated,
                        remaining_hints,
                    })
                }
                Err(AppError::AlreadyExists(message)) if retries < SAVE_RETRY_LIMIT => {
                    retries += 1;
                    log::debug!(
                        "Retrying hint for student '{}' on test '{}' after save conflict ({}): {}",
                        student_id,
                        test.id,
                        retries,
                        message
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Public test catalogue, with the caller's progress merged in when an
    /// identity is present.
    pub async fn available_tests(
        &self,
        student_id: Option<&str>,
    ) -> AppResult<Vec<AvailableTestDto>> {
        let tests = self.content.list_available_tests().await?;

        let attempts_by_test: HashMap<String, TestAttempt> = match student_id {
            Some(student_id) => self
                .attempts
                .find_by_student(student_id)
                .await?
                .into_iter()
                .map(|attempt| (attempt.test_id.clone(), attempt))
                .collect(),
            None => HashMap::new(),
        };

        Ok(tests
            .iter()
            .map(|test| AvailableTestDto::project(test, attempts_by_test.get(&test.id)))
            .collect())
    }

    /// All of the caller's attempts, newest first, as result summaries.
    pub async fn my_results(&self, student_id: &str) -> AppResult<Vec<ResultSummaryDto>> {
        let attempts = self.attempts.find_by_student(student_id).await?;

        let mut results = Vec::with_capacity(attempts.len());
        for attempt in &attempts {
            // Attempts of a deleted test disappear with the cascade; skip
            // any record caught mid-deletion.
            if let Some(test) = self.content.get_test(&attempt.test_id).await? {
                results.push(ResultSummaryDto::project(attempt, &test));
            }
        }

        Ok(results)
    }

    pub async fn detailed_result(
        &self,
        student_id: &str,
        test_id: &str,
    ) -> AppResult<DetailedResultResponse> {
        let attempt = self
            .attempts
            .find_by_student_and_test(student_id, test_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No results found for test '{}'", test_id))
            })?;

        let test = self
            .content
            .get_test(test_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test '{}' not found", test_id)))?;

        let questions = self.content.get_authored_questions(&test).await?;

        Ok(DetailedResultResponse::project(&attempt, &test, &questions))
    }

    async fn require_attempt(&self, student_id: &str, test_id: &str) -> AppResult<TestAttempt> {
        self.attempts
            .find_by_student_and_test(student_id, test_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Test has not been started by this student".to_string())
            })
    }
}

fn answer_response(evaluation: AnswerEvaluation) -> AnswerResponse {
    let mut response = AnswerResponse {
        is_correct: evaluation.is_correct,
        correct_answer: evaluation.correct_answer,
        explanation: evaluation.explanation,
        hearts_remaining: None,
        level_completed: None,
        test_completed: None,
        attempt_failed: None,
    };

    match evaluation.transition {
        AnswerTransition::CorrectAnswer => {}
        AnswerTransition::LevelCompleted {
            completed_level,
            next_level,
        } => {
            response.level_completed = Some(LevelCompletionDto {
                completed_level,
                next_level,
            });
        }
        AnswerTransition::TestCompleted {
            score,
            max_score,
            percentage,
        } => {
            response.test_completed = Some(FinalScoreDto {
                score,
                max_score,
                percentage,
            });
        }
        AnswerTransition::IncorrectAnswer { remaining_hearts } => {
            response.hearts_remaining = Some(remaining_hearts);
        }
        AnswerTransition::AttemptFailed {
            attempts,
            hearts_restored,
        } => {
            response.hearts_remaining = Some(0);
            response.attempt_failed = Some(AttemptFailureDto {
                attempts,
                hearts_restored,
            });
        }
    }

    response
}
