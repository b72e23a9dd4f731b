use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::middleware::auth::AuthUser;
use crate::models::{CompleteProfileRequest, UserResponse};
use crate::services::{resume_export_service, user_service};

pub async fn get_full_profile(db: web::Data<MongoDB>, user: web::ReqData<AuthUser>) -> HttpResponse {
    match user_service::find_by_uid(&db, &user.uid).await {
        Ok(found) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": UserResponse::from(found)
        })),
        Err(e) => e.error_response(),
    }
}

/// Merge raso de `profile` e `resume` com normalização de datas
pub async fn complete_profile(
    db: web::Data<MongoDB>,
    user: web::ReqData<AuthUser>,
    request: web::Json<CompleteProfileRequest>,
) -> HttpResponse {
    log::info!("📝 POST /profile/profile-completion - uid: {}", user.uid);

    match user_service::complete_profile(&db, &user.uid, request.into_inner()).await {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Profile updated successfully",
            "user": UserResponse::from(updated)
        })),
        Err(e) => {
            log::warn!("❌ Profile completion failed for {}: {}", user.uid, e);
            e.error_response()
        }
    }
}

pub async fn analytics(db: web::Data<MongoDB>, user: web::ReqData<AuthUser>) -> HttpResponse {
    match user_service::find_by_uid(&db, &user.uid).await {
        Ok(found) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "analytics": user_service::profile_analytics(&found)
        })),
        Err(e) => e.error_response(),
    }
}

pub async fn get_resume(db: web::Data<MongoDB>, user: web::ReqData<AuthUser>) -> HttpResponse {
    match user_service::get_resume(&db, &user.uid).await {
        Ok(resume) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "resume": resume
        })),
        Err(e) => e.error_response(),
    }
}

/// Currículo salvo exportado como fonte LaTeX (`resume.tex`)
pub async fn export_resume_latex(db: web::Data<MongoDB>, user: web::ReqData<AuthUser>) -> HttpResponse {
    let rendered = user_service::find_by_uid(&db, &user.uid)
        .await
        .and_then(|found| resume_export_service::render_latex(&found));

    match rendered {
        Ok(tex) => {
            log::info!("📄 Resume exported as LaTeX for {}", user.uid);
            HttpResponse::Ok()
                .content_type("application/x-tex; charset=utf-8")
                .insert_header(("Content-Disposition", "attachment; filename=\"resume.tex\""))
                .body(tex)
        }
        Err(e) => e.error_response(),
    }
}
