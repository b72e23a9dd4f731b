use serde::{Deserialize, Serialize};

use super::job::Job;
use super::resume::Resume;

/// Contexto de vaga enviado pelo frontend (subset tolerante de `Job`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl From<&Job> for JobContext {
    fn from(job: &Job) -> Self {
        let mut extra = serde_json::Map::new();
        if let Some(id) = job.id {
            extra.insert("_id".into(), serde_json::Value::String(id.to_hex()));
        }
        extra.insert("location".into(), job.location.clone().into());
        extra.insert("job_type".into(), job.job_type.clone().into());
        extra.insert("salary".into(), job.salary.clone().into());

        Self {
            job_title: Some(job.job_title.clone()),
            company_name: Some(job.company_name.clone()),
            required_skills: job.required_skills.clone(),
            job_description: Some(job.job_description.clone()),
            experience_level: Some(job.experience_level.clone()),
            extra,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InterviewQuestionsRequest {
    #[serde(default)]
    pub job: JobContext,
    #[serde(default)]
    pub resume: Resume,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewAnswer {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub text_answer: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub time_taken: f64,
}

impl InterviewAnswer {
    pub fn has_response(&self) -> bool {
        let filled = |s: &Option<String>| s.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false);
        filled(&self.text_answer) || filled(&self.transcript)
    }
}

/// Dados de uma entrevista simulada finalizada
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSubmission {
    #[serde(default)]
    pub job: JobContext,
    #[serde(default)]
    pub resume: Resume,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub answers: Vec<InterviewAnswer>,
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSection {
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub weaknesses: String,
    #[serde(default)]
    pub tips_for_improvement: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuestionFeedback {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub feedback: FeedbackSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InterviewScore {
    #[serde(default)]
    pub overall: f64,
    #[serde(default)]
    pub communication: f64,
    #[serde(default)]
    pub technical: f64,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterviewFeedback {
    #[serde(default)]
    pub overall_feedback: FeedbackSection,
    #[serde(default)]
    pub per_question: Vec<QuestionFeedback>,
    #[serde(default)]
    pub score: InterviewScore,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Placeholder de análise de vídeo (não implementada)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAnalysis {
    pub mock: bool,
    pub message: String,
    pub videos_processed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSummary {
    pub session_id: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub questions_answered: usize,
    pub total_time_minutes: i64,
    pub completed_at: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewReport {
    pub feedback: InterviewFeedback,
    pub analysis: MediaAnalysis,
    pub interview_summary: InterviewSummary,
}

#[derive(Debug, Deserialize)]
pub struct SoftSkillsQuestionQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoftSkillResponse {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct SoftSkillsAnalyzeRequest {
    #[serde(default)]
    pub responses: Vec<SoftSkillResponse>,
}
