use actix_web::{web, HttpResponse, ResponseError};

use crate::models::ColdEmailRequest;
use crate::services::outreach_service;

pub async fn cold_email(request: web::Json<ColdEmailRequest>) -> HttpResponse {
    match outreach_service::generate(&request).await {
        Ok(analysis) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "result": analysis
        })),
        Err(e) => e.error_response(),
    }
}
