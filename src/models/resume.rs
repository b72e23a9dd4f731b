use serde::{Deserialize, Serialize};

use crate::utils::dates::normalize_date_string;

/// Currículo embutido no documento do usuário
///
/// Datas ficam como strings RFC 3339 normalizadas (ver `normalize_dates`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub softskills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub co_curricular: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub profile_links: Vec<ProfileLink>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileLink {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub url: String,
}

impl Resume {
    /// Normaliza datas de experiência e certificações; valores inválidos viram `None`
    pub fn normalize_dates(mut self) -> Self {
        for exp in &mut self.experience {
            exp.start_date = normalize_date_string(exp.start_date.as_deref());
            exp.end_date = normalize_date_string(exp.end_date.as_deref());
        }
        for cert in &mut self.certifications {
            cert.date = normalize_date_string(cert.date.as_deref());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_resume() {
        let json = serde_json::json!({
            "skills": ["Rust", "MongoDB"],
            "experience": [{ "company": "Acme", "startDate": "01/2020" }]
        });
        let resume: Resume = serde_json::from_value(json).unwrap();
        assert_eq!(resume.skills.len(), 2);
        assert!(resume.certifications.is_empty());
        assert_eq!(resume.experience[0].company.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_normalize_dates() {
        let resume = Resume {
            experience: vec![Experience {
                start_date: Some("2021-04".into()),
                end_date: Some("not a date".into()),
                ..Default::default()
            }],
            certifications: vec![Certification {
                date: Some("12/2022".into()),
                ..Default::default()
            }],
            ..Default::default()
        }
        .normalize_dates();

        assert_eq!(
            resume.experience[0].start_date.as_deref(),
            Some("2021-04-01T00:00:00.000Z")
        );
        assert_eq!(resume.experience[0].end_date, None);
        assert_eq!(
            resume.certifications[0].date.as_deref(),
            Some("2022-12-01T00:00:00.000Z")
        );
    }
}
