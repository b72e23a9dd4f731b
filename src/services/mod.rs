pub mod achievement_service;
pub mod email_service;
pub mod firebase_service;
pub mod interview_service;
pub mod job_fetcher_service;
pub mod job_service;
pub mod llm_service;
pub mod outreach_service;
pub mod readiness_service;
pub mod resume_export_service;
pub mod resume_service;
pub mod soft_skills_service;
pub mod user_service;
pub mod wishlist_service;
