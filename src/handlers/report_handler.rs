use std::sync::Arc;

use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
};

#[get("/api/reports/test/{test_id}")]
pub async fn test_report(
    state: web::Data<Arc<AppState>>,
    test_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let report = state
        .report_service
        .test_report(&auth.0.sub, &test_id)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

#[get("/api/reports/student/{student_id}")]
pub async fn student_report(
    state: web::Data<Arc<AppState>>,
    student_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let report = state
        .report_service
        .student_report(&auth.0.sub, &student_id)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

#[get("/api/reports/statistics")]
pub async fn overview_statistics(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let report = state.report_service.overview(&auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(report))
}
