use std::sync::Arc;

use serde::Serialize;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::ClassGroup,
        dto::request::{CreateClassRequest, EnrollStudentRequest},
    },
    repositories::ClassRepository,
    services::test_service::{TestDeletionSummary, TestService},
};

#[derive(Debug, Clone, Serialize)]
pub struct ClassDeletionSummary {
    pub class_id: String,
    pub tests_deleted: Vec<TestDeletionSummary>,
}

/// Class administration: creation, enrollment and the deletion saga that
/// cascades over the class's tests.
pub struct ClassService {
    classes: Arc<dyn ClassRepository>,
    test_service: Arc<TestService>,
}

impl ClassService {
    pub fn new(classes: Arc<dyn ClassRepository>, test_service: Arc<TestService>) -> Self {
        Self {
            classes,
            test_service,
        }
    }

    pub async fn create_class(
        &self,
        admin_id: &str,
        request: CreateClassRequest,
    ) -> AppResult<ClassGroup> {
        request.validate()?;

        let class = ClassGroup::new(&request.name, request.description.clone(), admin_id);
        let created = self.classes.create(class).await?;

        log::info!("Admin '{}' created class '{}'", admin_id, created.id);
        Ok(created)
    }

    pub async fn list_classes(&self, admin_id: &str) -> AppResult<Vec<ClassGroup>> {
        self.classes.find_by_admin(admin_id).await
    }

    /// Enroll a student into a class. Enrollment is unique per
    /// (student, class); a repeat enrollment is a conflict.
    pub async fn enroll_student(
        &self,
        admin_id: &str,
        class_id: &str,
        request: EnrollStudentRequest,
    ) -> AppResult<ClassGroup> {
        request.validate()?;

        let mut class = self.owned_class(admin_id, class_id).await?;

        if class.is_enrolled(&request.student_id) {
            return Err(AppError::AlreadyExists(format!(
                "Student '{}' is already enrolled in class '{}'",
                request.student_id, class_id
            )));
        }

        class.enroll(&request.student_id);
        self.classes.update(class).await
    }

    pub async fn get_class(&self, admin_id: &str, class_id: &str) -> AppResult<ClassGroup> {
        self.owned_class(admin_id, class_id).await
    }

    /// Delete a class and cascade over its tests (each test deletion is
    /// itself a saga over questions and attempts). Tests deleted before a
    /// failure stay deleted; the class is only removed once every test is
    /// gone, so a partial failure leaves a consistent, retryable state.
    pub async fn delete_class(
        &self,
        admin_id: &str,
        class_id: &str,
    ) -> AppResult<ClassDeletionSummary> {
        let class = self.owned_class(admin_id, class_id).await?;

        let tests = self
            .test_service
            .list_class_tests(admin_id, &class.id)
            .await?;

        let mut tests_deleted = Vec::with_capacity(tests.len());
        for test in &tests {
            match self.test_service.delete_test(admin_id, &test.id).await {
                Ok(summary) => tests_deleted.push(summary),
                Err(err) => {
                    log::error!(
                        "Class '{}' deletion stopped at test '{}' ({} of {} tests removed): {}",
                        class_id,
                        test.id,
                        tests_deleted.len(),
                        tests.len(),
                        err
                    );
                    return Err(err);
                }
            }
        }

        self.classes.delete(&class.id).await?;
        log::info!(
            "Admin '{}' deleted class '{}' and {} tests",
            admin_id,
            class_id,
            tests_deleted.len()
        );

        Ok(ClassDeletionSummary {
            class_id: class.id,
            tests_deleted,
        })
    }

    async fn owned_class(&self, admin_id: &str, class_id: &str) -> AppResult<ClassGroup> {
        self.classes
            .find_by_id_and_admin(class_id, admin_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Class '{}' not found or not owned by you",
                    class_id
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{
        attempt_repository::MockAttemptRepository, class_repository::MockClassRepository,
        question_repository::MockQuestionRepository, test_repository::MockTestRepository,
    };

    fn owned_class() -> ClassGroup {
        let mut class = ClassGroup::new("Grade 5", None, "admin-1");
        class.id = "class-1".to_string();
        class
    }

    fn service_with(classes: MockClassRepository) -> ClassService {
        let test_service = Arc::new(TestService::new(
            Arc::new(MockTestRepository::new()),
            Arc::new(MockQuestionRepository::new()),
            Arc::new(MockAttemptRepository::new()),
            Arc::new(MockClassRepository::new()),
        ));
        ClassService::new(Arc::new(classes), test_service)
    }

    #[tokio::test]
    async fn enroll_student_rejects_duplicate_enrollment() {
        let mut classes = MockClassRepository::new();
        classes.expect_find_by_id_and_admin().returning(|_, _| {
            let mut class = owned_class();
            class.enroll("student-1");
            Ok(Some(class))
        });

        let service = service_with(classes);

        let result = service
            .enroll_student(
                "admin-1",
                "class-1",
                EnrollStudentRequest {
                    student_id: "student-1".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn enroll_student_records_membership() {
        let mut classes = MockClassRepository::new();
        classes
            .expect_find_by_id_and_admin()
            .returning(|_, _| Ok(Some(owned_class())));
        classes.expect_update().returning(Ok);

        let service = service_with(classes);

        let class = service
            .enroll_student(
                "admin-1",
                "class-1",
                EnrollStudentRequest {
                    student_id: "student-1".to_string(),
                },
            )
            .await
            .expect("enrollment should succeed");

        assert!(class.is_enrolled("student-1"));
    }

    #[tokio::test]
    async fn class_operations_require_ownership() {
        let mut classes = MockClassRepository::new();
        classes
            .expect_find_by_id_and_admin()
            .returning(|_, _| Ok(None));

        let service = service_with(classes);

        let result = service.get_class("admin-2", "class-1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
