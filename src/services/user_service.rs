use futures::stream::TryStreamExt;
use mongodb::bson::{doc, to_bson, DateTime as BsonDateTime, Document};
use mongodb::options::ReturnDocument;
use serde::Serialize;

use crate::{
    database::MongoDB,
    middleware::auth::AuthUser,
    models::{CompleteProfileRequest, Preferences, Profile, Resume, UpdateProfileRequest, User},
    utils::{dates::to_iso_opt, error::AppError},
};

pub const COLLECTION: &str = "users";

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// Cria ou atualiza o usuário a partir das claims do Firebase (POST /auth/verify)
///
/// Email e `lastLogin` são sempre atualizados; nome e telefone só quando vierem
/// no token. Os defaults do documento são gravados apenas na inserção.
pub async fn upsert_from_firebase(db: &MongoDB, auth: &AuthUser) -> Result<User, AppError> {
    let email = auth
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Token has no email".to_string()))?;

    let now = BsonDateTime::now();
    let mut set = doc! { "email": &email, "lastLogin": now, "updatedAt": now };
    let mut set_on_insert = doc! {
        "role": "user",
        "isActive": true,
        "profile": to_bson(&Profile::default())?,
        "preferences": to_bson(&Preferences::default())?,
        "wishlist": [],
        "jobsApplied": [],
        "learningPaths": [],
        "interviewPrepCount": 0_i64,
        "interviewsCount": 0_i64,
        "offersCount": 0_i64,
        "placed": false,
        "createdAt": now,
    };

    match auth.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => set.insert("displayName", name),
        None => set_on_insert.insert("displayName", ""),
    };
    match auth.phone_number.as_deref().filter(|p| !p.is_empty()) {
        Some(phone) => set.insert("phoneNumber", phone),
        None => set_on_insert.insert("phoneNumber", ""),
    };

    let user = db
        .collection::<User>(COLLECTION)
        .find_one_and_update(
            doc! { "firebaseUid": &auth.uid },
            doc! { "$set": set, "$setOnInsert": set_on_insert },
        )
        .upsert(true)
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(user_not_found)?;

    log::info!("🔐 User verified: {} ({})", user.email, user.firebase_uid);
    Ok(user)
}

pub async fn find_by_uid(db: &MongoDB, uid: &str) -> Result<User, AppError> {
    db.collection::<User>(COLLECTION)
        .find_one(doc! { "firebaseUid": uid })
        .await?
        .ok_or_else(user_not_found)
}

async fn set_and_return(db: &MongoDB, uid: &str, mut set: Document) -> Result<User, AppError> {
    set.insert("updatedAt", BsonDateTime::now());
    db.collection::<User>(COLLECTION)
        .find_one_and_update(doc! { "firebaseUid": uid }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(user_not_found)
}

/// PUT /auth/profile: só os campos enviados são alterados
pub async fn update_profile(db: &MongoDB, uid: &str, request: UpdateProfileRequest) -> Result<User, AppError> {
    let mut set = doc! { "lastLogin": BsonDateTime::now() };
    if let Some(display_name) = request.display_name {
        set.insert("displayName", display_name);
    }
    if let Some(phone_number) = request.phone_number {
        set.insert("phoneNumber", phone_number);
    }
    if let Some(profile) = request.profile {
        set.insert("profile", to_bson(&profile)?);
    }
    if let Some(preferences) = request.preferences {
        set.insert("preferences", to_bson(&preferences)?);
    }

    set_and_return(db, uid, set).await
}

/// Lista usuários ativos; exige papel admin de quem chama
pub async fn list_active_users(db: &MongoDB, requester_uid: &str) -> Result<Vec<User>, AppError> {
    let requester = db
        .collection::<User>(COLLECTION)
        .find_one(doc! { "firebaseUid": requester_uid })
        .await?;

    if !requester.map(|u| u.is_admin()).unwrap_or(false) {
        return Err(AppError::Forbidden("Access denied. Admin role required.".to_string()));
    }

    let users = db
        .collection::<User>(COLLECTION)
        .find(doc! { "isActive": true })
        .sort(doc! { "createdAt": -1 })
        .await?
        .try_collect()
        .await?;
    Ok(users)
}

/// Soft delete (`isActive = false`)
pub async fn deactivate(db: &MongoDB, uid: &str) -> Result<(), AppError> {
    set_and_return(db, uid, doc! { "isActive": false }).await?;
    log::info!("🗑️  Account deactivated: {}", uid);
    Ok(())
}

/// Sobrepõe as chaves de `patch` em `base` (merge raso) e desserializa em `T`
fn shallow_merge<T>(base: &T, patch: serde_json::Map<String, serde_json::Value>, what: &str) -> Result<T, AppError>
where
    T: Serialize + serde::de::DeserializeOwned,
{
    let mut merged = match serde_json::to_value(base) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    merged.extend(patch);
    serde_json::from_value(serde_json::Value::Object(merged))
        .map_err(|e| AppError::InvalidRequest(format!("Invalid {} data: {}", what, e)))
}

/// Aplica o merge de `profile` e `resume` sobre o usuário atual
///
/// Datas de experiência e certificações do currículo são normalizadas.
pub fn merge_profile_completion(user: &User, request: CompleteProfileRequest) -> Result<(Option<Profile>, Option<Resume>), AppError> {
    let profile = match request.profile {
        Some(patch) => Some(shallow_merge(&user.profile, patch, "profile")?),
        None => None,
    };
    let resume = match request.resume {
        Some(patch) => {
            let base = user.resume.clone().unwrap_or_default();
            Some(shallow_merge(&base, patch, "resume")?.normalize_dates())
        }
        None => None,
    };
    Ok((profile, resume))
}

/// POST /profile/profile-completion
pub async fn complete_profile(db: &MongoDB, uid: &str, request: CompleteProfileRequest) -> Result<User, AppError> {
    let user = find_by_uid(db, uid).await?;
    let (profile, resume) = merge_profile_completion(&user, request)?;

    let mut set = Document::new();
    if let Some(profile) = profile {
        set.insert("profile", to_bson(&profile)?);
    }
    if let Some(resume) = resume {
        set.insert("resume", to_bson(&resume)?);
    }
    if set.is_empty() {
        return Ok(user);
    }

    let updated = set_and_return(db, uid, set).await?;
    log::info!("📝 Profile updated for {}", uid);
    Ok(updated)
}

pub async fn get_resume(db: &MongoDB, uid: &str) -> Result<Resume, AppError> {
    find_by_uid(db, uid)
        .await?
        .resume
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

pub async fn increment_interview_prep(db: &MongoDB, uid: &str) -> Result<(), AppError> {
    db.collection::<User>(COLLECTION)
        .update_one(
            doc! { "firebaseUid": uid },
            doc! { "$inc": { "interviewPrepCount": 1_i64 }, "$set": { "updatedAt": BsonDateTime::now() } },
        )
        .await?;
    Ok(())
}

/// Substitui `resume.softskills` pelo conjunto detectado
pub async fn set_soft_skills(db: &MongoDB, uid: &str, skills: &[String]) -> Result<(), AppError> {
    let result = db
        .collection::<User>(COLLECTION)
        .update_one(
            doc! { "firebaseUid": uid },
            doc! { "$set": { "resume.softskills": skills.to_vec(), "updatedAt": BsonDateTime::now() } },
        )
        .await?;

    if result.matched_count == 0 {
        return Err(user_not_found());
    }
    Ok(())
}

// ==================== ANALYTICS ====================

#[derive(Debug, Serialize, PartialEq)]
pub struct ChartSlice {
    pub name: &'static str,
    pub value: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TimelineEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: String,
    pub date: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    pub skills_count: usize,
    pub certifications_count: usize,
    pub jobs_applied: usize,
    pub wishlist_count: usize,
    pub learning_paths: usize,
    pub interview_prep: i64,
    pub softskills_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAnalytics {
    pub pie_data: Vec<ChartSlice>,
    pub bar_data: Vec<serde_json::Value>,
    pub timeline: Vec<TimelineEntry>,
    pub stats: AnalyticsStats,
}

fn label_or(value: &Option<String>, fallback: &str) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Dados de gráficos do perfil (GET /profile/analytics)
pub fn profile_analytics(user: &User) -> ProfileAnalytics {
    let resume = user.resume.clone().unwrap_or_default();

    let stats = AnalyticsStats {
        skills_count: resume.skills.len(),
        certifications_count: resume.certifications.len(),
        jobs_applied: user.jobs_applied.len(),
        wishlist_count: user.wishlist.len(),
        learning_paths: user.learning_paths.len(),
        interview_prep: user.interview_prep_count,
        softskills_count: resume.softskills.len(),
    };

    let pie_data = vec![
        ChartSlice { name: "Skills", value: stats.skills_count },
        ChartSlice { name: "Certifications", value: stats.certifications_count },
        ChartSlice { name: "Learning Paths", value: stats.learning_paths },
        ChartSlice { name: "Wishlist", value: stats.wishlist_count },
        ChartSlice { name: "Interview Prep", value: stats.interview_prep.max(0) as usize },
        ChartSlice { name: "Soft Skills", value: stats.softskills_count },
    ];

    let bar_data = vec![serde_json::json!({
        "name": "You",
        "Jobs Applied": stats.jobs_applied,
        "Wishlist": stats.wishlist_count,
        "Certifications": stats.certifications_count,
        "Skills": stats.skills_count,
    })];

    let mut timeline = Vec::new();
    for exp in &resume.experience {
        if let Some(date) = exp.start_date.clone() {
            let label = exp
                .position
                .as_deref()
                .or(exp.company.as_deref())
                .filter(|v| !v.is_empty())
                .unwrap_or("Experience")
                .to_string();
            timeline.push(TimelineEntry { kind: "Experience", label, date });
        }
    }
    for cert in &resume.certifications {
        if let Some(date) = cert.date.clone() {
            timeline.push(TimelineEntry {
                kind: "Certification",
                label: label_or(&cert.name, "Certification"),
                date,
            });
        }
    }
    for path in &user.learning_paths {
        if let Some(date) = path.started_at.clone() {
            timeline.push(TimelineEntry {
                kind: "Learning Path",
                label: label_or(&path.name, "Learning Path"),
                date,
            });
        }
    }

    ProfileAnalytics { pie_data, bar_data, timeline, stats }
}

/// Linha da listagem de usuários (admin)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: crate::models::UserRole,
    pub is_active: bool,
    pub last_login: Option<String>,
    pub created_at: Option<String>,
    pub full_name: String,
}

impl From<&User> for UserListItem {
    fn from(user: &User) -> Self {
        Self {
            id: user.id_hex(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            is_active: user.is_active,
            last_login: to_iso_opt(&user.last_login),
            created_at: to_iso_opt(&user.created_at),
            full_name: user.full_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_resume(resume: serde_json::Value) -> User {
        serde_json::from_value(serde_json::json!({
            "firebaseUid": "uid-1",
            "email": "jane@example.com",
            "resume": resume,
            "learningPaths": [{ "name": "Rust", "startedAt": "2024-02-01T00:00:00.000Z" }],
            "interviewPrepCount": 2,
            "lastLogin": null,
            "createdAt": null,
            "updatedAt": null
        }))
        .unwrap()
    }

    fn as_map(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_merge_keeps_untouched_resume_keys() {
        let user = user_with_resume(serde_json::json!({ "summary": "Old", "skills": ["Rust"] }));
        let request = CompleteProfileRequest {
            profile: Some(as_map(serde_json::json!({ "firstName": "Jane", "completed": true }))),
            resume: Some(as_map(serde_json::json!({
                "summary": "New",
                "experience": [{ "company": "Acme", "startDate": "01/2020", "endDate": "2021-06" }],
                "certifications": [{ "name": "AWS", "date": "someday" }]
            }))),
        };

        let (profile, resume) = merge_profile_completion(&user, request).unwrap();
        let profile = profile.unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Jane"));
        assert!(profile.completed);

        let resume = resume.unwrap();
        assert_eq!(resume.summary.as_deref(), Some("New"));
        assert_eq!(resume.skills, vec!["Rust"]);
        assert_eq!(resume.experience[0].start_date.as_deref(), Some("2020-01-01T00:00:00.000Z"));
        assert_eq!(resume.experience[0].end_date.as_deref(), Some("2021-06-01T00:00:00.000Z"));
        assert_eq!(resume.certifications[0].date, None);
    }

    #[test]
    fn test_merge_rejects_wrong_types() {
        let user = user_with_resume(serde_json::json!({}));
        let request = CompleteProfileRequest {
            profile: None,
            resume: Some(as_map(serde_json::json!({ "skills": "not-a-list" }))),
        };
        assert!(matches!(merge_profile_completion(&user, request), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_profile_analytics() {
        let user = user_with_resume(serde_json::json!({
            "skills": ["Rust", "Go"],
            "softskills": ["teamwork"],
            "experience": [{ "company": "Acme", "startDate": "2020-01-01T00:00:00.000Z" }, { "company": "NoDate" }],
            "certifications": [{ "name": "AWS", "date": "2022-05-15T00:00:00.000Z" }]
        }));

        let analytics = profile_analytics(&user);
        assert_eq!(analytics.stats.skills_count, 2);
        assert_eq!(analytics.stats.interview_prep, 2);
        assert_eq!(analytics.pie_data.len(), 6);
        assert_eq!(analytics.bar_data[0]["Skills"], 2);
        assert_eq!(analytics.timeline.len(), 3);
        assert_eq!(analytics.timeline[0].label, "Acme");
        assert_eq!(analytics.timeline[2].kind, "Learning Path");
    }
}
