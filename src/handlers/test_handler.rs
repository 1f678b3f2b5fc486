use std::sync::Arc;

use actix_web::{delete, get, patch, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::request::{AddQuestionsRequest, CreateTestRequest, UpdateTestSettingsRequest},
};

#[post("/api/tests")]
pub async fn create_test(
    state: web::Data<Arc<AppState>>,
    request: web::Json<CreateTestRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let test = state
        .test_service
        .create_test(&auth.0.sub, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(test))
}

#[post("/api/tests/{test_id}/levels/{level_number}/questions")]
pub async fn add_questions(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, i32)>,
    request: web::Json<AddQuestionsRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let (test_id, level_number) = path.into_inner();
    let questions = state
        .test_service
        .add_questions(&auth.0.sub, &test_id, level_number, request.into_inner())
        .await?;

    let count = questions.len();
    Ok(HttpResponse::Created().json(serde_json::json!({
        "questions": questions,
        "count": count,
        "level_number": level_number,
    })))
}

#[get("/api/tests/admin")]
pub async fn list_admin_tests(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let tests = state.test_service.list_admin_tests(&auth.0.sub).await?;

    let count = tests.len();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "tests": tests,
        "count": count,
    })))
}

#[get("/api/tests/{test_id}")]
pub async fn get_test(
    state: web::Data<Arc<AppState>>,
    test_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let (test, questions) = state
        .test_service
        .get_admin_test(&auth.0.sub, &test_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "test": test,
        "questions": questions,
    })))
}

#[get("/api/tests/class/{class_id}")]
pub async fn list_class_tests(
    state: web::Data<Arc<AppState>>,
    class_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let tests = state
        .test_service
        .list_class_tests(&auth.0.sub, &class_id)
        .await?;

    let count = tests.len();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "tests": tests,
        "count": count,
    })))
}

#[patch("/api/tests/{test_id}/settings")]
pub async fn update_test_settings(
    state: web::Data<Arc<AppState>>,
    test_id: web::Path<String>,
    request: web::Json<UpdateTestSettingsRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let test = state
        .test_service
        .update_settings(&auth.0.sub, &test_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(test))
}

#[delete("/api/tests/{test_id}")]
pub async fn delete_test(
    state: web::Data<Arc<AppState>>,
    test_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let summary = state
        .test_service
        .delete_test(&auth.0.sub, &test_id)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}
