use serde_json::Value;

use crate::{
    models::{ColdEmailRequest, StartupAnalysis, StartupPhase},
    services::llm_service,
    utils::{error::AppError, json_extract::extract_json_object},
};

fn cold_email_prompt(request: &ColdEmailRequest) -> String {
    let founder = request.founder_name.as_deref().unwrap_or("[Founder Name]");
    let role = request.target_role.as_deref().unwrap_or("Software Engineer");
    let industry = request.industry.as_deref().unwrap_or("Tech");
    let extra = request.additional_info.as_deref().unwrap_or("");

    format!(
        r#"You are an expert product strategist and business analyst. Analyze the startup "{name}" at {website} and provide a JSON response with the following structure:

{{
  "roadmap": [
    {{ "name": "Phase 1: Market Research & Analysis", "duration": "2-3 weeks", "objectives": "Understand market landscape and user needs", "requirements": "Research tools, competitor analysis framework", "deliverables": "Market analysis report, user persona documentation" }}
  ],
  "extraFeatures": ["AI-powered feature suggestion", "Advanced analytics dashboard"],
  "techStack": ["React/Next.js", "Node.js/Express", "PostgreSQL"],
  "timeline": "6-8 months",
  "marketAnalysis": "Brief market opportunity analysis...",
  "mermaidChart": "graph TB\nA[Market Research] --> B[MVP Design]",
  "coldEmail": "Subject: ...\n\nHi {founder}, ... (max 120 words, as a {role} interested in {name})"
}}

Industry: {industry}
Target Role: {role}
Additional Context: {extra}

Create 8-10 roadmap phases. Ensure all arrays contain multiple items. Provide only valid JSON - no markdown formatting."#,
        name = request.startup_name,
        website = request.website,
        founder = founder,
        role = role,
        industry = industry,
        extra = extra,
    )
}

/// Lista de strings a partir de array, texto separado por vírgulas ou objeto
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, v)| match v {
                Value::String(s) => format!("{}: {}", key, s),
                other => format!("{}: {}", key, string_list(Some(other)).join(", ")),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn phases(value: Option<&Value>) -> Vec<StartupPhase> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(StartupPhase { name: name.clone(), ..Default::default() }),
                Value::Object(_) => serde_json::from_value(item.clone()).ok(),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Normaliza a resposta do modelo (campos ausentes viram vazios)
pub fn normalize_analysis(raw: &serde_json::Map<String, Value>) -> StartupAnalysis {
    StartupAnalysis {
        roadmap: phases(raw.get("roadmap")),
        extra_features: string_list(raw.get("extraFeatures")),
        tech_stack: string_list(raw.get("techStack")),
        timeline: text(raw.get("timeline")),
        market_analysis: text(raw.get("marketAnalysis")),
        mermaid_chart: text(raw.get("mermaidChart")),
        cold_email: text(raw.get("coldEmail")),
    }
}

/// Estratégia de produto + cold email para uma startup (Gemini)
pub async fn generate(request: &ColdEmailRequest) -> Result<StartupAnalysis, AppError> {
    if request.startup_name.trim().is_empty() || request.website.trim().is_empty() {
        return Err(AppError::InvalidRequest("startupName and website are required".to_string()));
    }

    log::info!("✉️  Generating outreach strategy for {}", request.startup_name);

    let reply = llm_service::gemini_generate(&cold_email_prompt(request))
        .await
        .map_err(|e| {
            log::error!("❌ Gemini request failed: {}", e);
            AppError::ExternalError("Failed to generate content".to_string())
        })?;

    extract_json_object(&reply)
        .map(|raw| normalize_analysis(&raw))
        .ok_or_else(|| {
            log::warn!("⚠️  Gemini reply could not be parsed as JSON");
            AppError::ExternalError("Failed to parse AI response as JSON".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, website: &str) -> ColdEmailRequest {
        ColdEmailRequest {
            startup_name: name.into(),
            website: website.into(),
            founder_name: None,
            target_role: Some("Backend Engineer".into()),
            industry: None,
            additional_info: None,
        }
    }

    #[test]
    fn test_prompt_uses_defaults() {
        let prompt = cold_email_prompt(&request("Acme", "https://acme.dev"));
        assert!(prompt.contains("\"Acme\" at https://acme.dev"));
        assert!(prompt.contains("Industry: Tech"));
        assert!(prompt.contains("Target Role: Backend Engineer"));
        assert!(prompt.contains("[Founder Name]"));
    }

    #[test]
    fn test_normalize_analysis_coerces_shapes() {
        let raw = serde_json::json!({
            "roadmap": [
                { "name": "Phase 1", "duration": "2 weeks", "objectives": "Research" },
                "Phase 2"
            ],
            "extraFeatures": "Dark mode, Offline sync",
            "techStack": { "frontend": "React", "backend": ["Rust", "Actix"] },
            "timeline": "6 months",
            "coldEmail": "Hi there"
        });
        let analysis = normalize_analysis(raw.as_object().unwrap());

        assert_eq!(analysis.roadmap.len(), 2);
        assert_eq!(analysis.roadmap[0].duration, "2 weeks");
        assert_eq!(analysis.roadmap[1].name, "Phase 2");
        assert_eq!(analysis.extra_features, vec!["Dark mode", "Offline sync"]);
        assert_eq!(analysis.tech_stack.len(), 2);
        assert!(analysis.tech_stack.contains(&"backend: Rust, Actix".to_string()));
        assert!(analysis.tech_stack.contains(&"frontend: React".to_string()));
        assert_eq!(analysis.timeline, "6 months");
        assert_eq!(analysis.market_analysis, "");
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected() {
        assert!(matches!(
            generate(&request("", "https://acme.dev")).await,
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(generate(&request("Acme", " ")).await, Err(AppError::InvalidRequest(_))));
    }
}
