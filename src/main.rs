mod api;
mod database;
mod jobs;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use middleware::AuthMiddleware;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Limite de corpo JSON (submissões de entrevista trazem transcrições longas)
const JSON_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let frontend_url = env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
    let database_url = env::var("DATABASE_URL").map_err(|_| {
        log::error!("❌ DATABASE_URL must be set");
        std::io::Error::new(std::io::ErrorKind::NotFound, "DATABASE_URL must be set")
    })?;

    log::info!("🚀 Starting Career Service...");

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url).await.map_err(|e| {
        log::error!("❌ Failed to connect to MongoDB: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
    })?;

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    // 🌱 Seed achievement catalog
    seeds::achievements_seed::seed_default_achievements(&db).await;

    // 📥 Start background jobs
    log::info!("📅 Starting background jobs...");
    jobs::job_ingestion::start_job_ingestion(db.clone()).await;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("🔓 CORS origin: {}", frontend_url);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(web::JsonConfig::default().limit(JSON_LIMIT_BYTES))
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))

            // ==================== USERS ====================

            .service(
                web::scope("/api/auth")
                    .wrap(AuthMiddleware::required())
                    .route("/verify", web::post().to(api::auth::verify))
                    .route("/profile", web::get().to(api::auth::get_profile))
                    .route("/profile", web::put().to(api::auth::update_profile))
                    .route("/users", web::get().to(api::auth::list_users))
                    .route("/account", web::delete().to(api::auth::delete_account))
                    .route("/current", web::get().to(api::auth::current_user))
            )
            .service(
                web::scope("/api/profile")
                    .wrap(AuthMiddleware::required())
                    .route("/profile", web::get().to(api::profile::get_full_profile))
                    .route("/profile-completion", web::post().to(api::profile::complete_profile))
                    .route("/analytics", web::get().to(api::profile::analytics))
                    .route("/resume", web::get().to(api::profile::get_resume))
                    .route("/resume/latex", web::get().to(api::profile::export_resume_latex))
            )

            // ==================== JOBS ====================

            .service(
                web::scope("/api/jobs")
                    .route("/postjd", web::post().to(api::jobs::post_job))
                    .route("/all", web::get().to(api::jobs::list_jobs))
                    .route("/search", web::get().to(api::jobs::search_jobs))
                    .route("/stats", web::get().to(api::jobs::job_stats))
                    .route("/service-status", web::get().to(api::jobs::service_status))
                    // Operações administrativas exigem login
                    .service(
                        web::resource("/fetch")
                            .wrap(AuthMiddleware::required())
                            .route(web::post().to(api::jobs::trigger_fetch))
                    )
                    .service(
                        web::resource("/old")
                            .wrap(AuthMiddleware::required())
                            .route(web::delete().to(api::jobs::delete_old_jobs))
                    )
                    .route("/{id}", web::get().to(api::jobs::get_job))  // DEVE FICAR POR ÚLTIMO (catch-all)
            )
            .service(
                web::scope("/api/wishlist")
                    .wrap(AuthMiddleware::required())
                    .route("", web::get().to(api::wishlist::get_wishlist))
                    .route("/{job_id}", web::post().to(api::wishlist::add_to_wishlist))
                    .route("/{job_id}", web::delete().to(api::wishlist::remove_from_wishlist))
            )

            // ==================== AI FEATURES ====================

            .service(
                web::scope("/api/resume")
                    .route("/match-resume", web::post().to(api::resume::match_resume))
                    .service(
                        web::resource("/enhance")
                            .wrap(AuthMiddleware::required())
                            .route(web::post().to(api::resume::enhance_resume))
                    )
            )
            .service(
                web::scope("/api/interview")
                    .route("/questions", web::post().to(api::interview::generate_questions))
                    .service(
                        web::resource("/submit")
                            .wrap(AuthMiddleware::optional())
                            .route(web::post().to(api::interview::submit_interview))
                    )
            )
            .service(
                web::scope("/soft-skills")
                    .route("/question", web::get().to(api::soft_skills::get_questions))
                    .service(
                        web::resource("/analyze")
                            .wrap(AuthMiddleware::required())
                            .route(web::post().to(api::soft_skills::analyze))
                    )
            )
            .service(
                web::scope("/api/achievements")
                    .wrap(AuthMiddleware::required())
                    .route("", web::get().to(api::achievements::get_achievements))
            )
            .service(
                web::scope("/api/moat")
                    .service(
                        web::resource("/analyze")
                            .wrap(AuthMiddleware::optional())
                            .route(web::post().to(api::moat::analyze))
                    )
                    .service(
                        web::resource("/roadmap/{job_id}")
                            .wrap(AuthMiddleware::required())
                            .route(web::get().to(api::moat::get_roadmap))
                    )
                    .service(
                        web::resource("/roadmap/{job_id}/steps/{step_id}")
                            .wrap(AuthMiddleware::required())
                            .route(web::put().to(api::moat::update_step))
                    )
            )
            .service(
                web::scope("/api/outreach")
                    .wrap(AuthMiddleware::required())
                    .route("/cold-email", web::post().to(api::outreach::cold_email))
            )

            // ==================== NOTIFICATIONS ====================

            .service(
                web::scope("/api/email")
                    .wrap(AuthMiddleware::required())
                    .route("/sendEmail", web::post().to(api::email::send_email))
                    .route("/testEmail", web::get().to(api::email::test_email))
            )
            .default_service(web::to(api::health::not_found))
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
