use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::dates::{bson_from_chrono, parse_date_field, to_iso, to_iso_opt};

/// Vaga de emprego (collection `jobs`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub required_skills: Vec<String>,
    pub experience_level: String,
    pub education_requirements: String,
    #[serde(default)]
    pub stipend: Option<String>,
    pub salary: String,
    pub location: String,
    pub job_type: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub application_deadline: BsonDateTime,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
}

/// Request de criação manual (POST /jobs/postjd)
///
/// Todos os campos são opcionais na desserialização para que a validação
/// devolva 400 com a lista de campos faltantes em vez de um erro de parse.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CreateJobRequest {
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub job_description: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub experience_level: Option<String>,
    pub education_requirements: Option<String>,
    pub stipend: Option<String>,
    pub salary: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub benefits: Option<Vec<String>>,
    /// RFC 3339 ou YYYY-MM-DD
    pub application_deadline: Option<String>,
}

fn required(value: &Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

impl CreateJobRequest {
    /// Valida e converte para o documento; erro lista os campos faltantes/ inválidos
    pub fn into_job(self) -> Result<Job, String> {
        let mut missing: Vec<&'static str> = Vec::new();

        let company_name = required(&self.company_name, "company_name", &mut missing);
        let job_title = required(&self.job_title, "job_title", &mut missing);
        let job_description = required(&self.job_description, "job_description", &mut missing);
        let experience_level = required(&self.experience_level, "experience_level", &mut missing);
        let education_requirements =
            required(&self.education_requirements, "education_requirements", &mut missing);
        let salary = required(&self.salary, "salary", &mut missing);
        let location = required(&self.location, "location", &mut missing);
        let job_type = required(&self.job_type, "job_type", &mut missing);

        let required_skills = match self.required_skills {
            Some(skills) => skills,
            None => {
                missing.push("required_skills");
                Vec::new()
            }
        };

        let deadline = match self.application_deadline.as_deref() {
            Some(raw) => match parse_date_field(raw) {
                Some(dt) => Some(bson_from_chrono(dt)),
                None => return Err(format!("Invalid application_deadline: {}", raw)),
            },
            None => {
                missing.push("application_deadline");
                None
            }
        };

        if !missing.is_empty() {
            return Err(format!("Missing required fields: {}", missing.join(", ")));
        }

        let now = BsonDateTime::now();
        Ok(Job {
            id: None,
            company_name,
            job_title,
            job_description,
            required_skills,
            experience_level,
            education_requirements,
            stipend: self.stipend.filter(|s| !s.trim().is_empty()),
            salary,
            location,
            job_type,
            benefits: self.benefits.unwrap_or_default(),
            application_deadline: deadline.unwrap_or(now),
            created_at: Some(now),
            updated_at: Some(now),
        })
    }
}

/// Resposta JSON de uma vaga (ids e datas como string)
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct JobResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub required_skills: Vec<String>,
    pub experience_level: String,
    pub education_requirements: String,
    pub stipend: Option<String>,
    pub salary: String,
    pub location: String,
    pub job_type: String,
    pub benefits: Vec<String>,
    pub application_deadline: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        JobResponse {
            id: job.id.map(|id| id.to_hex()).unwrap_or_default(),
            company_name: job.company_name,
            job_title: job.job_title,
            job_description: job.job_description,
            required_skills: job.required_skills,
            experience_level: job.experience_level,
            education_requirements: job.education_requirements,
            stipend: job.stipend,
            salary: job.salary,
            location: job.location,
            job_type: job.job_type,
            benefits: job.benefits,
            application_deadline: to_iso(&job.application_deadline),
            created_at: to_iso_opt(&job.created_at),
            updated_at: to_iso_opt(&job.updated_at),
        }
    }
}

/// Filtros de GET /jobs/search
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct JobSearchQuery {
    pub experience_level: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub skills: Option<String>,
    pub company_name: Option<String>,
    pub salary_min: Option<String>,
    pub salary_max: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

/// Query de paginação
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_request() -> CreateJobRequest {
        CreateJobRequest {
            company_name: Some("TechNova Solutions".into()),
            job_title: Some("Software Engineer".into()),
            job_description: Some("Build things".into()),
            required_skills: Some(vec!["JavaScript".into(), "React".into()]),
            experience_level: Some("Entry Level".into()),
            education_requirements: Some("Bachelor's".into()),
            stipend: Some("".into()),
            salary: Some("$85,000 - $100,000".into()),
            location: Some("San Francisco, CA".into()),
            job_type: Some("Full-time".into()),
            benefits: None,
            application_deadline: Some("2023-12-15".into()),
        }
    }

    #[test]
    fn test_into_job_ok() {
        let job = complete_request().into_job().unwrap();
        assert_eq!(job.company_name, "TechNova Solutions");
        assert_eq!(job.stipend, None);
        assert!(job.benefits.is_empty());
        assert!(job.created_at.is_some());
    }

    #[test]
    fn test_into_job_reports_missing_fields() {
        let mut req = complete_request();
        req.salary = None;
        req.location = Some("   ".into());
        req.required_skills = None;
        let err = req.into_job().unwrap_err();
        assert!(err.contains("salary"));
        assert!(err.contains("location"));
        assert!(err.contains("required_skills"));
    }

    #[test]
    fn test_into_job_rejects_bad_deadline() {
        let mut req = complete_request();
        req.application_deadline = Some("someday".into());
        assert!(req.into_job().unwrap_err().contains("application_deadline"));
    }

    #[test]
    fn test_response_uses_hex_id() {
        let mut job = complete_request().into_job().unwrap();
        let oid = ObjectId::new();
        job.id = Some(oid);
        let resp = JobResponse::from(job);
        assert_eq!(resp.id, oid.to_hex());
        assert!(resp.application_deadline.starts_with("2023-12-15"));
    }
}
