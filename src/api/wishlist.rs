use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::middleware::auth::AuthUser;
use crate::models::JobResponse;
use crate::services::wishlist_service;

pub async fn get_wishlist(db: web::Data<MongoDB>, user: web::ReqData<AuthUser>) -> HttpResponse {
    match wishlist_service::list(&db, &user.uid).await {
        Ok(jobs) => {
            let jobs: Vec<JobResponse> = jobs.into_iter().map(JobResponse::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "count": jobs.len(),
                "wishlist": jobs
            }))
        }
        Err(e) => e.error_response(),
    }
}

pub async fn add_to_wishlist(
    db: web::Data<MongoDB>,
    user: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> HttpResponse {
    let job_id = path.into_inner();

    match wishlist_service::add(&db, &user.uid, &job_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Job added to wishlist",
            "jobId": job_id
        })),
        Err(e) => {
            log::warn!("⚠️  Wishlist add failed ({} / {}): {}", user.uid, job_id, e);
            e.error_response()
        }
    }
}

pub async fn remove_from_wishlist(
    db: web::Data<MongoDB>,
    user: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> HttpResponse {
    let job_id = path.into_inner();

    match wishlist_service::remove(&db, &user.uid, &job_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Job removed from wishlist",
            "jobId": job_id
        })),
        Err(e) => e.error_response(),
    }
}
