use actix_web::{web, HttpResponse, ResponseError};
use serde::Deserialize;

use crate::database::MongoDB;
use crate::models::{CreateJobRequest, JobResponse, JobSearchQuery, PaginationQuery};
use crate::services::job_fetcher_service::{self, CycleOutcome, FetcherConfig};
use crate::services::job_service::{self, PostedJob};
use crate::utils::error::AppError;

#[utoipa::path(
    post,
    path = "/api/jobs/postjd",
    tag = "Jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job posted", body = JobResponse),
        (status = 200, description = "Same company, title and location already posted; updated in place", body = JobResponse),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn post_job(db: web::Data<MongoDB>, request: web::Json<CreateJobRequest>) -> HttpResponse {
    let job = match request.into_inner().into_job() {
        Ok(job) => job,
        Err(e) => return AppError::InvalidRequest(e).error_response(),
    };

    match job_service::create_job(&db, job).await {
        Ok(posted) => posted_response(posted),
        Err(e) => {
            log::error!("❌ Failed to post job: {}", e);
            e.error_response()
        }
    }
}

/// 201 para vaga nova, 200 quando a mesma vaga já estava cadastrada
fn posted_response(posted: PostedJob) -> HttpResponse {
    let (mut builder, message) = if posted.is_new() {
        (HttpResponse::Created(), "Job posted successfully")
    } else {
        (HttpResponse::Ok(), "Job already posted, details updated")
    };
    builder.json(serde_json::json!({
        "success": true,
        "message": message,
        "job": JobResponse::from(posted.into_job())
    }))
}

#[utoipa::path(
    get,
    path = "/api/jobs/all",
    tag = "Jobs",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (default 10, max 100)")
    ),
    responses((status = 200, description = "Jobs, newest first"))
)]
pub async fn list_jobs(db: web::Data<MongoDB>, query: web::Query<PaginationQuery>) -> HttpResponse {
    match job_service::list_jobs(&db, query.page, query.limit).await {
        Ok(page) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "count": page.count,
            "totalJobs": page.total_jobs,
            "totalPages": page.total_pages,
            "currentPage": page.current_page,
            "jobs": page.jobs
        })),
        Err(e) => {
            log::error!("❌ Failed to list jobs: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/jobs/search",
    tag = "Jobs",
    params(
        ("experience_level" = Option<String>, Query, description = "Case-insensitive match"),
        ("job_type" = Option<String>, Query, description = "Case-insensitive match"),
        ("location" = Option<String>, Query, description = "Case-insensitive match"),
        ("company_name" = Option<String>, Query, description = "Case-insensitive match"),
        ("skills" = Option<String>, Query, description = "Comma-separated list"),
        ("salary_min" = Option<String>, Query, description = "Matched against the salary text"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses((status = 200, description = "Matching jobs"))
)]
pub async fn search_jobs(db: web::Data<MongoDB>, query: web::Query<JobSearchQuery>) -> HttpResponse {
    match job_service::search_jobs(&db, &query).await {
        Ok(page) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "count": page.count,
            "totalJobs": page.total_jobs,
            "totalPages": page.total_pages,
            "currentPage": page.current_page,
            "filters": &*query,
            "jobs": page.jobs
        })),
        Err(e) => {
            log::error!("❌ Job search failed: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job ObjectId")),
    responses(
        (status = 200, description = "Job found", body = JobResponse),
        (status = 400, description = "Invalid job ID"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_job(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    match job_service::get_job(&db, &path.into_inner()).await {
        Ok(job) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "job": JobResponse::from(job)
        })),
        Err(e) => e.error_response(),
    }
}

pub async fn job_stats(db: web::Data<MongoDB>) -> HttpResponse {
    match job_service::job_stats(&db).await {
        Ok(stats) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "stats": stats
        })),
        Err(e) => {
            log::error!("❌ Failed to compute job stats: {}", e);
            e.error_response()
        }
    }
}

/// Status do banco + estado em memória do poller
pub async fn service_status(db: web::Data<MongoDB>) -> HttpResponse {
    match job_service::service_status(&db).await {
        Ok(status) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "serviceStatus": status,
            "fetcher": {
                "running": job_fetcher_service::is_running(),
                "lastCycle": job_fetcher_service::last_cycle()
            }
        })),
        Err(e) => e.error_response(),
    }
}

/// Dispara um ciclo de ingestão manualmente
pub async fn trigger_fetch(db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("📥 POST /jobs/fetch - manual trigger");

    match job_fetcher_service::run_cycle(&db, &FetcherConfig::from_env()).await {
        Ok(CycleOutcome::Completed(summary)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": format!("Successfully fetched and stored {} jobs", summary.fetched),
            "count": summary.fetched,
            "summary": summary
        })),
        Ok(CycleOutcome::Skipped) => HttpResponse::Conflict().json(serde_json::json!({
            "success": false,
            "message": "A fetch cycle is already running"
        })),
        Err(e) => {
            log::error!("❌ Manual fetch failed: {}", e);
            e.error_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteOldQuery {
    pub days: Option<i64>,
}

pub async fn delete_old_jobs(db: web::Data<MongoDB>, query: web::Query<DeleteOldQuery>) -> HttpResponse {
    let days = query
        .days
        .filter(|d| *d > 0)
        .unwrap_or_else(|| FetcherConfig::from_env().retention_days);

    match job_service::delete_older_than(&db, days).await {
        Ok(deleted) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": format!("Removed {} old jobs", deleted),
            "deletedCount": deleted
        })),
        Err(e) => {
            log::error!("❌ Failed to remove old jobs: {}", e);
            e.error_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, http::StatusCode, test, App};
    use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

    fn stored_job() -> crate::models::Job {
        crate::models::Job {
            id: Some(ObjectId::new()),
            company_name: "Acme".into(),
            job_title: "Backend Engineer".into(),
            job_description: "Rust services".into(),
            required_skills: vec!["Rust".into()],
            experience_level: "Senior".into(),
            education_requirements: "Bachelor's degree preferred".into(),
            stipend: None,
            salary: "Competitive salary".into(),
            location: "Austin, TX".into(),
            job_type: "FULLTIME".into(),
            benefits: vec![],
            application_deadline: BsonDateTime::now(),
            created_at: Some(BsonDateTime::now()),
            updated_at: Some(BsonDateTime::now()),
        }
    }

    #[actix_web::test]
    async fn test_repeated_post_is_not_created_again() {
        let job = stored_job();
        let id = job.id.unwrap().to_hex();

        let created = posted_response(PostedJob::from_upsert(true, job.clone()));
        assert_eq!(created.status(), StatusCode::CREATED);

        let repeated = posted_response(PostedJob::from_upsert(false, job));
        assert_eq!(repeated.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&to_bytes(repeated.into_body()).await.unwrap()).unwrap();
        assert_eq!(body["job"]["_id"], id.as_str());
        assert_eq!(body["message"], "Job already posted, details updated");
    }

    #[actix_web::test]
    #[ignore] // Requer MongoDB rodando
    async fn test_job_lookup_errors() {
        let db = MongoDB::new("mongodb://localhost:27017/career_service_test").await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .route("/api/jobs/{id}", web::get().to(get_job)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/jobs/not-an-id").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let missing = mongodb::bson::oid::ObjectId::new().to_hex();
        let req = test::TestRequest::get().uri(&format!("/api/jobs/{}", missing)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    #[ignore] // Requer MongoDB rodando
    async fn test_post_job_validation() {
        let db = MongoDB::new("mongodb://localhost:27017/career_service_test").await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .route("/api/jobs/postjd", web::post().to(post_job)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/jobs/postjd")
            .set_json(serde_json::json!({ "company_name": "Acme" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
