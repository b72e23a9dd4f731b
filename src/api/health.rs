use actix_web::{web, HttpRequest, HttpResponse, Responder};
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::database::MongoDB;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub database: String,
    pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(db: web::Data<MongoDB>) -> impl Responder {
    let timestamp = chrono::Utc::now().to_rfc3339();

    match db.database().run_command(doc! { "ping": 1 }).await {
        Ok(_) => HttpResponse::Ok().json(HealthResponse {
            status: "OK".to_string(),
            message: "Server is running".to_string(),
            database: "Connected".to_string(),
            timestamp,
        }),
        Err(e) => {
            log::error!("❌ Health check: MongoDB ping failed: {}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "ERROR".to_string(),
                message: "Database unreachable".to_string(),
                database: "Disconnected".to_string(),
                timestamp,
            })
        }
    }
}

/// Fallback para rotas inexistentes
pub async fn not_found(req: HttpRequest) -> impl Responder {
    HttpResponse::NotFound().json(serde_json::json!({
        "message": "Route not found",
        "path": req.path(),
        "method": req.method().as_str()
    }))
}
