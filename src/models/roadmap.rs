use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::dates::{deserialize_flexible_date, to_iso_opt};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// Passo do roadmap (gerado pelo LLM ou pelo fallback)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapStep {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub priority: StepPriority,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<BsonDateTime>,
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<BsonDateTime>,
}

/// Passo como exposto na API (datas em ISO 8601)
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapStepView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub priority: StepPriority,
    pub status: StepStatus,
    pub skills: Vec<String>,
    pub resources: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<RoadmapStep> for RoadmapStepView {
    fn from(step: RoadmapStep) -> Self {
        Self {
            created_at: to_iso_opt(&step.created_at),
            updated_at: to_iso_opt(&step.updated_at),
            id: step.id,
            title: step.title,
            description: step.description,
            duration: step.duration,
            priority: step.priority,
            status: step.status,
            skills: step.skills,
            resources: step.resources,
        }
    }
}

/// Roadmap persistido por (usuário, vaga), collection `roadmaps`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub job_id: ObjectId,
    #[serde(default)]
    pub steps: Vec<RoadmapStep>,
    pub last_updated: Option<BsonDateTime>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapResponse {
    pub id: String,
    pub user_id: String,
    pub job_id: String,
    pub steps: Vec<RoadmapStepView>,
    pub last_updated: Option<String>,
    pub progress: u32,
}

impl From<Roadmap> for RoadmapResponse {
    fn from(roadmap: Roadmap) -> Self {
        let progress = progress_percent(&roadmap.steps);
        Self {
            id: roadmap.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: roadmap.user_id,
            job_id: roadmap.job_id.to_hex(),
            steps: roadmap.steps.into_iter().map(RoadmapStepView::from).collect(),
            last_updated: to_iso_opt(&roadmap.last_updated),
            progress,
        }
    }
}

/// Percentual de passos concluídos
pub fn progress_percent(steps: &[RoadmapStep]) -> u32 {
    if steps.is_empty() {
        return 0;
    }
    let done = steps.iter().filter(|s| s.status == StepStatus::Completed).count();
    ((done as f64 / steps.len() as f64) * 100.0).round() as u32
}

#[derive(Debug, Deserialize)]
pub struct UpdateStepRequest {
    pub status: StepStatus,
}
