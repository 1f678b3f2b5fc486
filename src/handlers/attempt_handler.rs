use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::AnswerRequest,
};

/// Public catalogue of active tests. With a valid bearer token the caller's
/// own progress is merged into each entry.
#[get("/api/tests/available")]
pub async fn available_tests(
    state: web::Data<Arc<AppState>>,
    auth: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    let student_id = auth.as_ref().map(|user| user.0.sub.as_str());
    let tests = state.attempt_service.available_tests(student_id).await?;

    let count = tests.len();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "tests": tests,
        "count": count,
    })))
}

#[post("/api/start/{test_id}")]
pub async fn start_test(
    state: web::Data<Arc<AppState>>,
    test_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .attempt_service
        .start_or_resume(&auth.0.sub, &test_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/answer/{test_id}/{question_id}")]
pub async fn answer_question(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    request: web::Json<AnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (test_id, question_id) = path.into_inner();
    let response = state
        .attempt_service
        .answer_question(&auth.0.sub, &test_id, &question_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/hint/{test_id}/{question_id}")]
pub async fn use_hint(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (test_id, question_id) = path.into_inner();
    let response = state
        .attempt_service
        .use_hint(&auth.0.sub, &test_id, &question_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/api/results")]
pub async fn my_results(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let results = state.attempt_service.my_results(&auth.0.sub).await?;

    let count = results.len();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "results": results,
        "count": count,
    })))
}

#[get("/api/results/{test_id}/detailed")]
pub async fn detailed_result(
    state: web::Data<Arc<AppState>>,
    test_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .attempt_service
        .detailed_result(&auth.0.sub, &test_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}
