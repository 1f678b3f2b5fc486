use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        MongoAttemptRepository, MongoClassRepository, MongoQuestionRepository,
        MongoTestRepository,
    },
    services::{AttemptService, ClassService, ContentService, ReportService, TestService},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub attempt_service: Arc<AttemptService>,
    pub test_service: Arc<TestService>,
    pub class_service: Arc<ClassService>,
    pub report_service: Arc<ReportService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let test_repository = Arc::new(MongoTestRepository::new(&db));
        test_repository.ensure_indexes().await?;

        let question_repository = Arc::new(MongoQuestionRepository::new(&db));
        question_repository.ensure_indexes().await?;

        let attempt_repository = Arc::new(MongoAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;

        let class_repository = Arc::new(MongoClassRepository::new(&db));
        class_repository.ensure_indexes().await?;

        let content_service = Arc::new(ContentService::new(
            test_repository.clone(),
            question_repository.clone(),
        ));
        let attempt_service = Arc::new(AttemptService::new(
            attempt_repository.clone(),
            content_service,
        ));
        let test_service = Arc::new(TestService::new(
            test_repository.clone(),
            question_repository,
            attempt_repository.clone(),
            class_repository.clone(),
        ));
        let class_service = Arc::new(ClassService::new(class_repository, test_service.clone()));
        let report_service = Arc::new(ReportService::new(test_repository, attempt_repository));

        Ok(Self {
            db,
            attempt_service,
            test_service,
            class_service,
            report_service,
            config: Arc::new(config),
        })
    }
}
