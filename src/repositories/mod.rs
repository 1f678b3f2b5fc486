pub mod attempt_repository;
pub mod class_repository;
pub mod question_repository;
pub mod test_repository;

pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};
pub use class_repository::{ClassRepository, MongoClassRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use test_repository::{MongoTestRepository, TestRepository};

/// MongoDB duplicate-key write error (unique index violation).
pub(crate) fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}
