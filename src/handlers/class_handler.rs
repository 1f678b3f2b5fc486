use std::sync::Arc;

use actix_web::{delete, get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::request::{CreateClassRequest, EnrollStudentRequest},
};

#[post("/api/classes")]
pub async fn create_class(
    state: web::Data<Arc<AppState>>,
    request: web::Json<CreateClassRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let class = state
        .class_service
        .create_class(&auth.0.sub, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(class))
}

#[get("/api/classes/admin")]
pub async fn list_classes(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let classes = state.class_service.list_classes(&auth.0.sub).await?;

    let count = classes.len();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "classes": classes,
        "count": count,
    })))
}

#[post("/api/classes/{class_id}/students")]
pub async fn enroll_student(
    state: web::Data<Arc<AppState>>,
    class_id: web::Path<String>,
    request: web::Json<EnrollStudentRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let class = state
        .class_service
        .enroll_student(&auth.0.sub, &class_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(class))
}

#[get("/api/classes/{class_id}/students")]
pub async fn list_students(
    state: web::Data<Arc<AppState>>,
    class_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let class = state.class_service.get_class(&auth.0.sub, &class_id).await?;

    let count = class.students.len();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "class": class.name,
        "students": class.students,
        "count": count,
    })))
}

#[delete("/api/classes/{class_id}")]
pub async fn delete_class(
    state: web::Data<Arc<AppState>>,
    class_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let summary = state
        .class_service
        .delete_class(&auth.0.sub, &class_id)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}
