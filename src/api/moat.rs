use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::middleware::auth::AuthUser;
use crate::models::{ReadinessRequest, UpdateStepRequest};
use crate::services::readiness_service;

/// Análise de prontidão (autenticação opcional)
pub async fn analyze(
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthUser>>,
    request: web::Json<ReadinessRequest>,
) -> HttpResponse {
    let uid = user.as_ref().map(|u| u.uid.clone());

    match readiness_service::analyze(&db, request.into_inner(), uid.as_deref()).await {
        Ok(report) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": report
        })),
        Err(e) => {
            log::warn!("⚠️  Readiness analysis failed: {}", e);
            e.error_response()
        }
    }
}

pub async fn get_roadmap(
    db: web::Data<MongoDB>,
    user: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> HttpResponse {
    match readiness_service::get_roadmap(&db, &user.uid, &path.into_inner()).await {
        Ok(roadmap) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "roadmap": roadmap
        })),
        Err(e) => e.error_response(),
    }
}

pub async fn update_step(
    db: web::Data<MongoDB>,
    user: web::ReqData<AuthUser>,
    path: web::Path<(String, i64)>,
    request: web::Json<UpdateStepRequest>,
) -> HttpResponse {
    let (job_id, step_id) = path.into_inner();

    match readiness_service::update_step(&db, &user.uid, &job_id, step_id, request.status).await {
        Ok(roadmap) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Step updated successfully",
            "roadmap": roadmap
        })),
        Err(e) => e.error_response(),
    }
}
