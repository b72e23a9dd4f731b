use actix_web::{web, HttpResponse, ResponseError};

use crate::database::MongoDB;
use crate::middleware::auth::AuthUser;
use crate::models::{SoftSkillsAnalyzeRequest, SoftSkillsQuestionQuery};
use crate::services::soft_skills_service;

pub async fn get_questions(query: web::Query<SoftSkillsQuestionQuery>) -> HttpResponse {
    let questions = soft_skills_service::generate_questions(query.count).await;
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "questions": questions
    }))
}

pub async fn analyze(
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthUser>>,
    request: web::Json<SoftSkillsAnalyzeRequest>,
) -> HttpResponse {
    let uid = user.as_ref().map(|u| u.uid.as_str());

    match soft_skills_service::analyze_responses(&db, uid, &request.responses).await {
        Ok(skills) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "combinedSkills": skills
        })),
        Err(e) => {
            log::warn!("⚠️  Soft-skills analysis failed: {}", e);
            e.error_response()
        }
    }
}
