use actix_web::{web, HttpResponse, ResponseError};

use crate::models::{EnhanceResumeRequest, MatchResumeRequest};
use crate::services::resume_service;

/// Proxy para o serviço de matching currículo x vagas
pub async fn match_resume(request: web::Json<MatchResumeRequest>) -> HttpResponse {
    match resume_service::match_resume(&request).await {
        Ok(results) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "results": results
        })),
        Err(e) => e.error_response(),
    }
}

pub async fn enhance_resume(request: web::Json<EnhanceResumeRequest>) -> HttpResponse {
    match resume_service::enhance(request.into_inner().resume).await {
        Ok(resume) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "resume": resume
        })),
        Err(e) => e.error_response(),
    }
}
