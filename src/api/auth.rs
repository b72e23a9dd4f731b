use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::middleware::auth::AuthUser;
use crate::models::{UpdateProfileRequest, UserResponse, UserSummary};
use crate::services::user_service::{self, UserListItem};

#[utoipa::path(
    post,
    path = "/api/auth/verify",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User created or updated from the Firebase token", body = UserSummary),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn verify(db: web::Data<MongoDB>, user: web::ReqData<AuthUser>) -> HttpResponse {
    log::info!("🔐 POST /auth/verify - uid: {}", user.uid);

    match user_service::upsert_from_firebase(&db, &user).await {
        Ok(saved) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": UserSummary::from(&saved)
        })),
        Err(e) => {
            log::warn!("❌ Verify failed for {}: {}", user.uid, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Stored user profile"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_profile(db: web::Data<MongoDB>, user: web::ReqData<AuthUser>) -> HttpResponse {
    match user_service::find_by_uid(&db, &user.uid).await {
        Ok(found) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": UserResponse::from(found)
        })),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "Auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_profile(
    db: web::Data<MongoDB>,
    user: web::ReqData<AuthUser>,
    request: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    log::info!("📝 PUT /auth/profile - uid: {}", user.uid);

    match user_service::update_profile(&db, &user.uid, request.into_inner()).await {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Profile updated successfully",
            "user": UserResponse::from(updated)
        })),
        Err(e) => {
            log::warn!("❌ Profile update failed for {}: {}", user.uid, e);
            e.error_response()
        }
    }
}

/// Só administradores
pub async fn list_users(db: web::Data<MongoDB>, user: web::ReqData<AuthUser>) -> HttpResponse {
    match user_service::list_active_users(&db, &user.uid).await {
        Ok(users) => {
            let users: Vec<UserListItem> = users.iter().map(UserListItem::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "count": users.len(),
                "users": users
            }))
        }
        Err(e) => e.error_response(),
    }
}

pub async fn delete_account(db: web::Data<MongoDB>, user: web::ReqData<AuthUser>) -> HttpResponse {
    log::info!("🗑️  DELETE /auth/account - uid: {}", user.uid);

    match user_service::deactivate(&db, &user.uid).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Account deactivated successfully"
        })),
        Err(e) => e.error_response(),
    }
}

/// Claims do token atual, sem consultar o banco
pub async fn current_user(user: web::ReqData<AuthUser>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user.into_inner()
    }))
}
