use serde::{Deserialize, Serialize};

use super::interview::JobContext;
use super::resume::Resume;
use super::roadmap::RoadmapStepView;

/// Request de POST /moat/analyze
///
/// A vaga pode vir por id (`jobId`) ou inline (`job`). O currículo inline
/// tem prioridade; sem ele usa-se o currículo salvo do usuário autenticado.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessRequest {
    pub job_id: Option<String>,
    pub job: Option<JobContext>,
    pub resume: Option<Resume>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkillComparison {
    pub matching: Vec<String>,
    pub missing: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSuggestion {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub approach: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogSuggestion {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub read_time: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub readiness_score: u32,
    pub skill_comparison: SkillComparison,
    pub roadmap: Vec<RoadmapStepView>,
    pub projects: Vec<ProjectSuggestion>,
    pub blogs: Vec<BlogSuggestion>,
    pub job_info: JobContext,
    /// Id do roadmap persistido (quando usuário autenticado + jobId)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadmap_id: Option<String>,
}

/// Request de POST /resume/enhance
#[derive(Debug, Deserialize)]
pub struct EnhanceResumeRequest {
    pub resume: Option<Resume>,
}

/// Request de POST /resume/match-resume (proxy para o matcher)
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResumeRequest {
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub job_descriptions: Vec<String>,
}

/// Request de POST /outreach/cold-email
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdEmailRequest {
    #[serde(default)]
    pub startup_name: String,
    #[serde(default)]
    pub website: String,
    pub founder_name: Option<String>,
    pub target_role: Option<String>,
    pub industry: Option<String>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupPhase {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub objectives: String,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub deliverables: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupAnalysis {
    #[serde(default)]
    pub roadmap: Vec<StartupPhase>,
    #[serde(default)]
    pub extra_features: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub timeline: String,
    #[serde(default)]
    pub market_analysis: String,
    #[serde(default)]
    pub mermaid_chart: String,
    #[serde(default)]
    pub cold_email: String,
}
