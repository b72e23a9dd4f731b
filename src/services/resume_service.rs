use std::env;

use serde::Deserialize;

use crate::{
    models::{MatchResumeRequest, Resume},
    services::llm_service::{self, ChatOptions, GroqModel},
    utils::{error::AppError, http_client::http_client, json_extract::extract_json},
};

const DEFAULT_MATCHER_URL: &str = "http://localhost:8000/match";
const ENHANCE_SYSTEM: &str = "You are a resume improvement assistant.";

// ==================== ENHANCE ====================

fn enhance_prompt(resume: &Resume) -> String {
    let json = serde_json::to_string_pretty(resume).unwrap_or_else(|_| "{}".to_string());
    format!(
        "You are a world-class resume writer. Given the following JSON resume, improve the summary, skills, \
experience bullet points, and project descriptions to make them more professional, concise, and impactful. \
Return the improved JSON in the same structure, and nothing else.\n\n{}",
        json
    )
}

/// Reescreve o currículo via LLM mantendo a mesma estrutura
pub async fn enhance(resume: Option<Resume>) -> Result<Resume, AppError> {
    let resume = resume.ok_or_else(|| AppError::InvalidRequest("Resume is required".to_string()))?;

    let reply = llm_service::groq_chat(
        GroqModel::Default,
        ENHANCE_SYSTEM,
        &enhance_prompt(&resume),
        ChatOptions { temperature: None, max_tokens: Some(2048) },
    )
    .await
    .map_err(|e| {
        log::error!("❌ Resume enhancement failed: {}", e);
        AppError::ExternalError("AI enhancement failed".to_string())
    })?;

    extract_json::<Resume>(&reply)
        .map(Resume::normalize_dates)
        .ok_or_else(|| {
            log::warn!("⚠️  Enhanced resume could not be parsed");
            AppError::ExternalError("AI could not improve the resume".to_string())
        })
}

// ==================== MATCH ====================

#[derive(Debug, Deserialize)]
struct MatcherResponse {
    #[serde(default)]
    results: serde_json::Value,
}

fn matcher_url() -> String {
    env::var("MATCHER_URL").unwrap_or_else(|_| DEFAULT_MATCHER_URL.to_string())
}

pub fn validate_match_request(request: &MatchResumeRequest) -> Result<(), AppError> {
    if request.resume.trim().is_empty() || request.job_descriptions.is_empty() {
        return Err(AppError::InvalidRequest("Missing resume or jobDescriptions".to_string()));
    }
    Ok(())
}

/// Encaminha currículo + descrições ao serviço de matching e devolve `results`
pub async fn match_resume(request: &MatchResumeRequest) -> Result<serde_json::Value, AppError> {
    validate_match_request(request)?;

    let url = matcher_url();
    let body = serde_json::json!({
        "resume": request.resume,
        "job_descriptions": request.job_descriptions,
    });

    let response = http_client()
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            log::error!("❌ Matcher request to {} failed: {}", url, e);
            AppError::ExternalError("Resume matching failed".to_string())
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        log::error!("❌ Matcher returned {}: {}", status, text);
        return Err(AppError::ExternalError("Resume matching failed".to_string()));
    }

    let parsed: MatcherResponse = response.json().await.map_err(|e| {
        log::error!("❌ Matcher response is not valid JSON: {}", e);
        AppError::ExternalError("Resume matching failed".to_string())
    })?;

    Ok(parsed.results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_match_request() {
        let ok = MatchResumeRequest { resume: "Rust dev".into(), job_descriptions: vec!["Backend".into()] };
        assert!(validate_match_request(&ok).is_ok());

        let no_resume = MatchResumeRequest { resume: " ".into(), job_descriptions: vec!["Backend".into()] };
        assert!(matches!(validate_match_request(&no_resume), Err(AppError::InvalidRequest(_))));

        let no_jobs = MatchResumeRequest { resume: "Rust dev".into(), job_descriptions: vec![] };
        assert!(matches!(validate_match_request(&no_jobs), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_enhance_prompt_embeds_resume() {
        let resume = Resume { skills: vec!["Rust".into()], ..Default::default() };
        let prompt = enhance_prompt(&resume);
        assert!(prompt.contains("\"skills\""));
        assert!(prompt.contains("Rust"));
    }

    #[tokio::test]
    async fn test_enhance_without_resume_is_bad_request() {
        assert!(matches!(enhance(None).await, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_enhanced_resume_from_fenced_reply() {
        let reply = "```json\n{\"summary\": \"Seasoned engineer\", \"skills\": [\"Rust\", \"Go\"]}\n```";
        let resume = extract_json::<Resume>(reply).unwrap();
        assert_eq!(resume.summary.as_deref(), Some("Seasoned engineer"));
        assert_eq!(resume.skills.len(), 2);
    }
}
