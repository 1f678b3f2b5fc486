use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::TestAttempt,
    repositories::is_duplicate_key_error,
};

/// Persistence for attempt records. One record per (student, test); writes
/// go through `create` (insert, unique index) or `save` (version-guarded
/// replace), so concurrent read-modify-write cycles surface as conflicts
/// instead of lost updates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn find_by_student_and_test(
        &self,
        student_id: &str,
        test_id: &str,
    ) -> AppResult<Option<TestAttempt>>;
    async fn find_by_student(&self, student_id: &str) -> AppResult<Vec<TestAttempt>>;
    async fn find_by_test(&self, test_id: &str) -> AppResult<Vec<TestAttempt>>;
    async fn find_by_tests(&self, test_ids: &[String]) -> AppResult<Vec<TestAttempt>>;
    /// Insert a fresh attempt; a concurrent insert for the same
    /// (student, test) fails with `AlreadyExists` and the caller re-fetches.
    async fn create(&self, attempt: TestAttempt) -> AppResult<TestAttempt>;
    /// Replace the stored record, guarded by `attempt.version`. Fails with
    /// `AlreadyExists` when the stored version has moved on; the caller
    /// must re-read and re-apply.
    async fn save(&self, attempt: TestAttempt) -> AppResult<TestAttempt>;
    async fn delete_by_test(&self, test_id: &str) -> AppResult<u64>;
}

pub struct MongoAttemptRepository {
    collection: Collection<TestAttempt>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("test_attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for test_attempts collection");

        let student_test_index = IndexModel::builder()
            .keys(doc! { "student_id": 1, "test_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("student_test_unique".to_string())
                    .build(),
            )
            .build();

        let test_index = IndexModel::builder()
            .keys(doc! { "test_id": 1 })
            .options(IndexOptions::builder().name("test_id".to_string()).build())
            .build();

        self.collection.create_index(student_test_index).await?;
        self.collection.create_index(test_index).await?;

        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn find_by_student_and_test(
        &self,
        student_id: &str,
        test_id: &str,
    ) -> AppResult<Option<TestAttempt>> {
        let attempt = self
            .collection
            .find_one(doc! { "student_id": student_id, "test_id": test_id })
            .await?;
        Ok(attempt)
    }

    async fn find_by_student(&self, student_id: &str) -> AppResult<Vec<TestAttempt>> {
        let attempts = self
            .collection
            .find(doc! { "student_id": student_id })
            .sort(doc! { "modified_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn find_by_test(&self, test_id: &str) -> AppResult<Vec<TestAttempt>> {
        let attempts = self
            .collection
            .find(doc! { "test_id": test_id })
            .sort(doc! { "score": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn find_by_tests(&self, test_ids: &[String]) -> AppResult<Vec<TestAttempt>> {
        if test_ids.is_empty() {
            return Ok(vec![]);
        }

        let attempts = self
            .collection
            .find(doc! { "test_id": { "$in": test_ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn create(&self, attempt: TestAttempt) -> AppResult<TestAttempt> {
        match self.collection.insert_one(&attempt).await {
            Ok(_) => Ok(attempt),
            Err(err) if is_duplicate_key_error(&err) => Err(AppError::AlreadyExists(format!(
                "Attempt for student '{}' on test '{}' already exists",
                attempt.student_id, attempt.test_id
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, mut attempt: TestAttempt) -> AppResult<TestAttempt> {
        let expected_version = attempt.version;
        attempt.version += 1;
        attempt.modified_at = Some(chrono::Utc::now());

        let result = self
            .collection
            .replace_one(
                doc! {
                    "student_id": &attempt.student_id,
                    "test_id": &attempt.test_id,
                    "version": expected_version,
                },
                &attempt,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::AlreadyExists(format!(
                "Attempt for student '{}' on test '{}' was modified concurrently",
                attempt.student_id, attempt.test_id
            )));
        }

        Ok(attempt)
    }

    async fn delete_by_test(&self, test_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "test_id": test_id })
            .await?;
        Ok(result.deleted_count)
    }
}
