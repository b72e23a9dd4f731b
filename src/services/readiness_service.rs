use mongodb::bson::{doc, to_bson, DateTime as BsonDateTime};
use mongodb::options::ReturnDocument;

use crate::{
    database::MongoDB,
    models::{
        BlogSuggestion, JobContext, ProjectSuggestion, ReadinessReport, ReadinessRequest, Resume, Roadmap,
        RoadmapResponse, RoadmapStep, RoadmapStepView, SkillComparison, StepPriority, StepStatus,
    },
    services::{
        job_service,
        llm_service::{self, ChatOptions, GroqModel},
        user_service,
    },
    utils::{error::AppError, json_extract::extract_json},
};

pub const COLLECTION: &str = "roadmaps";

const ROADMAP_SYSTEM: &str =
    "You are a career counselor expert. Always return valid JSON arrays only, no additional text or explanations.";
const PROJECTS_SYSTEM: &str =
    "You are a technical project advisor. Always return valid JSON arrays only, no additional text or explanations.";
const BLOGS_SYSTEM: &str =
    "You are a technical content curator. Always return valid JSON arrays only, no additional text or explanations.";

// ==================== SKILLS ====================

/// Compara skills da vaga com as do currículo, sem diferenciar maiúsculas
///
/// `total` é o número de skills exigidas pela vaga.
pub fn skill_comparison(job_skills: &[String], resume_skills: &[String]) -> SkillComparison {
    let resume: Vec<String> = resume_skills.iter().map(|s| s.trim().to_lowercase()).collect();
    let (matching, missing): (Vec<String>, Vec<String>) = job_skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .partition(|skill| resume.contains(skill));

    SkillComparison {
        total: matching.len() + missing.len(),
        matching,
        missing,
    }
}

pub fn readiness_score(comparison: &SkillComparison) -> u32 {
    if comparison.total == 0 {
        return 0;
    }
    ((comparison.matching.len() as f64 / comparison.total as f64) * 100.0).round() as u32
}

// ==================== FALLBACKS ====================

pub fn fallback_roadmap() -> Vec<RoadmapStep> {
    let step = |id, title: &str, description: &str, duration: &str, priority, status| RoadmapStep {
        id,
        title: title.to_string(),
        description: description.to_string(),
        duration: duration.to_string(),
        priority,
        status,
        skills: vec![],
        resources: vec![],
        created_at: None,
        updated_at: None,
    };
    vec![
        step(
            1,
            "Master REST APIs",
            "Build comprehensive knowledge of REST API design and implementation",
            "2-3 weeks",
            StepPriority::High,
            StepStatus::Pending,
        ),
        step(
            2,
            "Advanced React Patterns",
            "Learn advanced React patterns and state management",
            "3-4 weeks",
            StepPriority::Medium,
            StepStatus::InProgress,
        ),
    ]
}

pub fn fallback_projects() -> Vec<ProjectSuggestion> {
    vec![ProjectSuggestion {
        id: 1,
        title: "Full-Stack Task Manager".to_string(),
        description: "Build a comprehensive task management application".to_string(),
        technologies: vec!["React".into(), "Node.js".into(), "MongoDB".into()],
        features: vec![
            "User authentication".into(),
            "Task CRUD operations".into(),
            "Real-time updates".into(),
        ],
        approach: "Start with backend API, then build React frontend with state management".to_string(),
        difficulty: "Intermediate".to_string(),
        duration: "3-4 weeks".to_string(),
    }]
}

pub fn fallback_blogs() -> Vec<BlogSuggestion> {
    vec![BlogSuggestion {
        id: 1,
        title: "Building Scalable REST APIs with Node.js".to_string(),
        description: "Learn best practices for API design and implementation".to_string(),
        category: "Technical".to_string(),
        read_time: "8-12 minutes".to_string(),
        url: "https://medium.com/nodejs-rest-api-best-practices".to_string(),
    }]
}

// ==================== PROMPTS ====================

fn context_json(job: &JobContext, resume: &Resume) -> (String, String) {
    (
        serde_json::to_string(job).unwrap_or_else(|_| "{}".to_string()),
        serde_json::to_string(resume).unwrap_or_else(|_| "{}".to_string()),
    )
}

fn roadmap_prompt(job: &str, resume: &str) -> String {
    format!(
        r#"Based on this job description and candidate resume, create a personalized roadmap for the candidate to become job-ready.

Job: {job}
Resume: {resume}

Return ONLY a valid JSON array of roadmap steps with the following structure:
[
  {{ "id": 1, "title": "Master REST APIs", "description": "Build comprehensive knowledge of REST API design and implementation", "duration": "2-3 weeks", "priority": "high", "status": "pending", "skills": ["REST"], "resources": ["https://restfulapi.net"] }}
]

Make it practical and actionable. Focus on skill gaps and experience enhancement. Return only the JSON array, no additional text."#
    )
}

fn projects_prompt(job: &str, resume: &str) -> String {
    format!(
        r#"Based on this job description and resume, suggest 3 project ideas that would help the candidate become job-ready.

Job: {job}
Resume: {resume}

Return ONLY a valid JSON array with this structure:
[
  {{ "id": 1, "title": "Full-Stack Task Manager", "description": "Build a comprehensive task management application", "technologies": ["React", "Node.js", "MongoDB"], "features": ["User authentication", "Task CRUD operations"], "approach": "Start with backend API, then build the frontend", "difficulty": "Intermediate", "duration": "3-4 weeks" }}
]

Return only the JSON array, no additional text."#
    )
}

fn blogs_prompt(job: &str, resume: &str) -> String {
    format!(
        r#"Based on this job description and resume, recommend 5 blog topics/articles that would help the candidate prepare for this role.

Job: {job}
Resume: {resume}

Return ONLY a valid JSON array with this structure:
[
  {{ "id": 1, "title": "Building Scalable REST APIs with Node.js", "description": "Learn best practices for API design and implementation", "category": "Technical", "readTime": "8-12 minutes", "url": "https://medium.com/nodejs-rest-api-best-practices" }}
]

Return only the JSON array, no additional text."#
    )
}

/// Chama o modelo rápido e extrai um array de `T`; vazio ou falha usa o fallback
async fn suggest<T, F>(label: &str, system: &str, prompt: String, fallback: F) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
    F: FnOnce() -> Vec<T>,
{
    match llm_service::groq_chat(GroqModel::Fast, system, &prompt, ChatOptions::creative(1000)).await {
        Ok(text) => match extract_json::<Vec<T>>(&text) {
            Some(items) if !items.is_empty() => items,
            _ => {
                log::warn!("⚠️  Could not parse {} from model response, using fallback", label);
                fallback()
            }
        },
        Err(e) => {
            log::warn!("⚠️  {} generation failed ({}), using fallback", label, e);
            fallback()
        }
    }
}

/// Ids sequenciais a partir de 1 e timestamps de criação
pub fn stamp_steps(steps: Vec<RoadmapStep>, now: BsonDateTime) -> Vec<RoadmapStep> {
    steps
        .into_iter()
        .enumerate()
        .map(|(i, mut step)| {
            step.id = i as i64 + 1;
            step.created_at = Some(now);
            step.updated_at = Some(now);
            step
        })
        .collect()
}

// ==================== ANÁLISE ====================

async fn resolve_job(db: &MongoDB, request: &ReadinessRequest) -> Result<JobContext, AppError> {
    if let Some(job_id) = request.job_id.as_deref().filter(|id| !id.is_empty()) {
        let job = job_service::get_job(db, job_id).await?;
        return Ok(JobContext::from(&job));
    }
    request
        .job
        .clone()
        .ok_or_else(|| AppError::InvalidRequest("Job information is required (jobId or job)".to_string()))
}

async fn resolve_resume(db: &MongoDB, request: &ReadinessRequest, uid: Option<&str>) -> Result<Resume, AppError> {
    if let Some(resume) = &request.resume {
        return Ok(resume.clone());
    }
    match uid {
        Some(uid) => user_service::get_resume(db, uid).await,
        None => Err(AppError::InvalidRequest("Resume is required".to_string())),
    }
}

/// Análise de prontidão para uma vaga
///
/// Roadmap, projetos e blogs são gerados em paralelo, cada um com seu
/// fallback. Com usuário autenticado e `jobId`, o roadmap é salvo.
pub async fn analyze(db: &MongoDB, request: ReadinessRequest, uid: Option<&str>) -> Result<ReadinessReport, AppError> {
    let job = resolve_job(db, &request).await?;
    let resume = resolve_resume(db, &request, uid).await?;

    log::info!(
        "🎯 Readiness analysis for '{}' ({})",
        job.job_title.as_deref().unwrap_or("?"),
        uid.unwrap_or("anonymous")
    );

    let (job_json, resume_json) = context_json(&job, &resume);
    let (roadmap, projects, blogs) = tokio::join!(
        suggest("roadmap", ROADMAP_SYSTEM, roadmap_prompt(&job_json, &resume_json), fallback_roadmap),
        suggest("projects", PROJECTS_SYSTEM, projects_prompt(&job_json, &resume_json), fallback_projects),
        suggest("blogs", BLOGS_SYSTEM, blogs_prompt(&job_json, &resume_json), fallback_blogs),
    );
    let roadmap = stamp_steps(roadmap, BsonDateTime::now());

    let skill_comparison = skill_comparison(&job.required_skills, &resume.skills);
    let readiness_score = readiness_score(&skill_comparison);

    let stored_job = request
        .job_id
        .as_deref()
        .and_then(|id| job_service::parse_job_id(id).ok());

    let roadmap_id = match (uid, stored_job) {
        (Some(uid), Some(job_oid)) => match save_roadmap(db, uid, job_oid, &roadmap).await {
            Ok(saved) => saved.id.map(|id| id.to_hex()),
            Err(e) => {
                log::error!("❌ Failed to save roadmap for {}: {}", uid, e);
                None
            }
        },
        _ => None,
    };

    Ok(ReadinessReport {
        readiness_score,
        skill_comparison,
        roadmap: roadmap.into_iter().map(RoadmapStepView::from).collect(),
        projects,
        blogs,
        job_info: job,
        roadmap_id,
    })
}

// ==================== ROADMAP ====================

async fn save_roadmap(
    db: &MongoDB,
    uid: &str,
    job_oid: mongodb::bson::oid::ObjectId,
    steps: &[RoadmapStep],
) -> Result<Roadmap, AppError> {
    let saved = db
        .collection::<Roadmap>(COLLECTION)
        .find_one_and_update(
            doc! { "userId": uid, "jobId": job_oid },
            doc! {
                "$set": { "steps": to_bson(steps)?, "lastUpdated": BsonDateTime::now(), "isActive": true },
                "$setOnInsert": { "userId": uid, "jobId": job_oid },
            },
        )
        .upsert(true)
        .return_document(ReturnDocument::After)
        .await?;

    saved.ok_or_else(|| AppError::DatabaseError("Roadmap upsert returned no document".to_string()))
}

pub async fn get_roadmap(db: &MongoDB, uid: &str, job_id: &str) -> Result<RoadmapResponse, AppError> {
    let job_oid = job_service::parse_job_id(job_id)?;

    db.collection::<Roadmap>(COLLECTION)
        .find_one(doc! { "userId": uid, "jobId": job_oid, "isActive": true })
        .await?
        .map(RoadmapResponse::from)
        .ok_or_else(|| AppError::NotFound("Roadmap not found".to_string()))
}

/// Atualiza o status de um passo pelo operador posicional `steps.$`
pub async fn update_step(
    db: &MongoDB,
    uid: &str,
    job_id: &str,
    step_id: i64,
    status: StepStatus,
) -> Result<RoadmapResponse, AppError> {
    let job_oid = job_service::parse_job_id(job_id)?;

    let updated = db
        .collection::<Roadmap>(COLLECTION)
        .find_one_and_update(
            doc! { "userId": uid, "jobId": job_oid, "steps.id": step_id },
            doc! { "$set": {
                "steps.$.status": to_bson(&status)?,
                "steps.$.updatedAt": BsonDateTime::now(),
                "lastUpdated": BsonDateTime::now(),
            } },
        )
        .return_document(ReturnDocument::After)
        .await?;

    updated
        .map(RoadmapResponse::from)
        .ok_or_else(|| AppError::NotFound("Roadmap or step not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_skill_comparison_is_case_insensitive() {
        let cmp = skill_comparison(
            &skills(&["JavaScript", "React", "Node.js", "MongoDB", "REST APIs"]),
            &skills(&["javascript", "NODE.JS", "MongoDB", "React"]),
        );
        assert_eq!(cmp.matching, skills(&["javascript", "react", "node.js", "mongodb"]));
        assert_eq!(cmp.missing, skills(&["rest apis"]));
        assert_eq!(cmp.total, 5);
        assert_eq!(readiness_score(&cmp), 80);
    }

    #[test]
    fn test_readiness_score_rounds_and_handles_empty() {
        let cmp = skill_comparison(&skills(&["a", "b", "c"]), &skills(&["a"]));
        assert_eq!(readiness_score(&cmp), 33);
        let cmp = skill_comparison(&skills(&["a", "b", "c"]), &skills(&["a", "b"]));
        assert_eq!(readiness_score(&cmp), 67);
        let empty = skill_comparison(&[], &skills(&["a"]));
        assert_eq!(empty.total, 0);
        assert_eq!(readiness_score(&empty), 0);
    }

    #[test]
    fn test_fallbacks() {
        let roadmap = fallback_roadmap();
        assert_eq!(roadmap[0].title, "Master REST APIs");
        assert_eq!(roadmap[1].status, StepStatus::InProgress);
        assert_eq!(fallback_projects()[0].title, "Full-Stack Task Manager");
        assert_eq!(fallback_blogs()[0].read_time, "8-12 minutes");
    }

    #[test]
    fn test_stamp_steps_assigns_sequential_ids() {
        let mut steps = fallback_roadmap();
        steps[0].id = 7;
        steps[1].id = 7;
        let now = BsonDateTime::from_millis(1_700_000_000_000);
        let stamped = stamp_steps(steps, now);
        assert_eq!(stamped.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(stamped.iter().all(|s| s.created_at == Some(now) && s.updated_at == Some(now)));
    }

    #[test]
    fn test_llm_suggestions_parse() {
        let text = r#"```json
[{"title": "Ship a CLI", "technologies": ["Rust"]}]
```"#;
        let projects = extract_json::<Vec<ProjectSuggestion>>(text).unwrap();
        assert_eq!(projects[0].title, "Ship a CLI");
        assert_eq!(projects[0].difficulty, "");
    }
}
