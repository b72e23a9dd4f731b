use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::middleware::auth::AuthUser;
use crate::services::achievement_service;

/// Avalia e devolve as conquistas do usuário autenticado
pub async fn get_achievements(db: web::Data<MongoDB>, user: web::ReqData<AuthUser>) -> HttpResponse {
    match achievement_service::get_achievements(&db, &user.uid).await {
        Ok(report) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "achievements": report.achievements,
            "stats": report.stats,
            "summary": report.summary
        })),
        Err(e) => {
            log::error!("❌ Failed to evaluate achievements for {}: {}", user.uid, e);
            e.error_response()
        }
    }
}
