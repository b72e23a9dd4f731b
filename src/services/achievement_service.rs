use futures::stream::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    database::MongoDB,
    models::{Achievement, AchievementSummary, AchievementView, User, UserAchievement, UserStats},
    services::user_service,
    utils::error::AppError,
};

pub const ACHIEVEMENTS: &str = "achievements";
pub const USER_ACHIEVEMENTS: &str = "user_achievements";

#[derive(Debug, Serialize)]
pub struct AchievementsReport {
    pub achievements: Vec<AchievementView>,
    pub stats: UserStats,
    pub summary: AchievementSummary,
}

/// Estatísticas usadas pelos critérios, derivadas do documento do usuário
pub fn compute_stats(user: &User) -> UserStats {
    let resume = user.resume.as_ref();
    UserStats {
        profile_completed: user.profile.completed,
        resume_uploaded: resume
            .and_then(|r| r.resume_text.as_deref())
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false),
        skills_count: resume.map(|r| r.skills.len() as i64).unwrap_or(0),
        certifications_count: resume.map(|r| r.certifications.len() as i64).unwrap_or(0),
        jobs_applied: user.jobs_applied.len() as i64,
        wishlist_count: user.wishlist.len() as i64,
        interview_prep: user.interview_prep_count,
        soft_skills_analyzed: resume.map(|r| !r.softskills.is_empty()).unwrap_or(false),
        learning_paths_started: user.learning_paths.len() as i64,
        interviews: user.interviews_count,
        offers: user.offers_count,
        placed: user.placed,
    }
}

/// Valor numérico de um stat: booleanos contam como 1 / 0, ausente como 0
fn numeric(value: Option<&serde_json::Value>) -> Option<f64> {
    match value {
        None | Some(serde_json::Value::Null) => Some(0.0),
        Some(serde_json::Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(_) => None,
    }
}

/// Um critério vale por igualdade ou por limiar (`>=`)
///
/// Booleanos entram no limiar como 1 / 0, então `true` satisfaz `1` e um
/// contador positivo satisfaz `true`. Chave ausente conta como `false` / `0`.
fn criterion_holds(actual: Option<&serde_json::Value>, expected: &serde_json::Value) -> bool {
    if actual == Some(expected) {
        return true;
    }
    match (numeric(actual), numeric(Some(expected))) {
        (Some(value), Some(threshold)) => value >= threshold,
        _ => false,
    }
}

pub fn is_unlocked(criteria: &serde_json::Map<String, serde_json::Value>, stats: &UserStats) -> bool {
    let stats = match serde_json::to_value(stats) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return false,
    };
    criteria
        .iter()
        .all(|(key, expected)| criterion_holds(stats.get(key), expected))
}

/// Mudança de estado a persistir para uma conquista
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// Primeira avaliação: cria o registro
    Create { code: String, unlocked: bool },
    /// Estava bloqueada e passou a valer
    Unlock { code: String },
}

/// Decide o que gravar; o desbloqueio é monotônico
///
/// Nunca gera transição desbloqueada -> bloqueada, mesmo que as
/// estatísticas tenham caído.
pub fn plan_changes(
    catalog: &[Achievement],
    states: &HashMap<String, UserAchievement>,
    stats: &UserStats,
) -> Vec<StateChange> {
    catalog
        .iter()
        .filter_map(|achievement| {
            let unlocked = is_unlocked(&achievement.criteria, stats);
            match states.get(&achievement.code) {
                None => Some(StateChange::Create { code: achievement.code.clone(), unlocked }),
                Some(state) if unlocked && !state.unlocked => {
                    Some(StateChange::Unlock { code: achievement.code.clone() })
                }
                Some(_) => None,
            }
        })
        .collect()
}

async fn load_states(db: &MongoDB, uid: &str) -> Result<HashMap<String, UserAchievement>, AppError> {
    let states: Vec<UserAchievement> = db
        .collection::<UserAchievement>(USER_ACHIEVEMENTS)
        .find(doc! { "userId": uid })
        .await?
        .try_collect()
        .await?;
    Ok(states
        .into_iter()
        .map(|s| (s.achievement_code.clone(), s))
        .collect())
}

async fn apply_change(db: &MongoDB, uid: &str, change: &StateChange) -> Result<(), AppError> {
    let collection = db.collection::<UserAchievement>(USER_ACHIEVEMENTS);
    let now = BsonDateTime::now();

    match change {
        StateChange::Create { code, unlocked } => {
            // $setOnInsert evita sobrescrever um registro criado em paralelo
            let unlocked_at = if *unlocked { Some(now) } else { None };
            collection
                .update_one(
                    doc! { "userId": uid, "achievementCode": code },
                    doc! { "$setOnInsert": {
                        "userId": uid,
                        "achievementCode": code,
                        "unlocked": *unlocked,
                        "unlockedAt": unlocked_at,
                    } },
                )
                .upsert(true)
                .await?;
        }
        StateChange::Unlock { code } => {
            collection
                .update_one(
                    doc! { "userId": uid, "achievementCode": code, "unlocked": false },
                    doc! { "$set": { "unlocked": true, "unlockedAt": now } },
                )
                .await?;
            log::info!("🏆 Achievement unlocked: {} for {}", code, uid);
        }
    }
    Ok(())
}

/// Avalia o catálogo para o usuário, persiste mudanças e monta a resposta
pub async fn get_achievements(db: &MongoDB, uid: &str) -> Result<AchievementsReport, AppError> {
    let user = user_service::find_by_uid(db, uid).await?;
    let stats = compute_stats(&user);

    let catalog: Vec<Achievement> = db
        .collection::<Achievement>(ACHIEVEMENTS)
        .find(doc! {})
        .await?
        .try_collect()
        .await?;

    let mut states = load_states(db, uid).await?;
    let changes = plan_changes(&catalog, &states, &stats);

    if !changes.is_empty() {
        for change in &changes {
            apply_change(db, uid, change).await?;
        }
        states = load_states(db, uid).await?;
    }

    let achievements: Vec<AchievementView> = catalog
        .into_iter()
        .map(|achievement| {
            let state = states.get(&achievement.code);
            AchievementView::new(achievement, state)
        })
        .collect();
    let summary = AchievementSummary::from_views(&achievements);

    Ok(AchievementsReport { achievements, stats, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rarity;

    fn achievement(code: &str, criteria: serde_json::Value) -> Achievement {
        Achievement {
            id: None,
            code: code.into(),
            title: code.into(),
            description: String::new(),
            icon: "FiAward".into(),
            category: "profile".into(),
            rarity: Rarity::Common,
            criteria: match criteria {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            },
        }
    }

    fn state(code: &str, unlocked: bool) -> UserAchievement {
        UserAchievement {
            id: None,
            user_id: "u1".into(),
            achievement_code: code.into(),
            unlocked,
            unlocked_at: if unlocked { Some(BsonDateTime::now()) } else { None },
        }
    }

    #[test]
    fn test_criteria_equality_and_threshold() {
        let stats = UserStats {
            profile_completed: true,
            skills_count: 7,
            ..Default::default()
        };
        let criteria = |v: serde_json::Value| achievement("x", v).criteria;

        assert!(is_unlocked(&criteria(serde_json::json!({ "profileCompleted": true })), &stats));
        assert!(is_unlocked(&criteria(serde_json::json!({ "skillsCount": 5 })), &stats));
        assert!(is_unlocked(&criteria(serde_json::json!({ "skillsCount": 7 })), &stats));
        assert!(!is_unlocked(&criteria(serde_json::json!({ "skillsCount": 15 })), &stats));
        assert!(!is_unlocked(&criteria(serde_json::json!({ "placed": true })), &stats));
        assert!(!is_unlocked(
            &criteria(serde_json::json!({ "profileCompleted": true, "skillsCount": 15 })),
            &stats
        ));
        // Chave desconhecida conta como 0 / false
        assert!(!is_unlocked(&criteria(serde_json::json!({ "unknownCounter": 1 })), &stats));
        assert!(is_unlocked(&criteria(serde_json::json!({ "unknownFlag": false })), &stats));
        assert!(is_unlocked(&criteria(serde_json::json!({})), &stats));
    }

    #[test]
    fn test_criteria_mix_booleans_and_thresholds() {
        let stats = UserStats {
            profile_completed: true,
            skills_count: 2,
            ..Default::default()
        };
        let criteria = |v: serde_json::Value| achievement("x", v).criteria;

        assert!(is_unlocked(&criteria(serde_json::json!({ "profileCompleted": 1 })), &stats));
        assert!(is_unlocked(&criteria(serde_json::json!({ "skillsCount": true })), &stats));
        assert!(!is_unlocked(&criteria(serde_json::json!({ "placed": 1 })), &stats));
        assert!(!is_unlocked(&criteria(serde_json::json!({ "interviews": true })), &stats));
        assert!(!is_unlocked(&criteria(serde_json::json!({ "skillsCount": "many" })), &stats));
    }

    #[test]
    fn test_plan_creates_missing_states() {
        let catalog = vec![
            achievement("first_steps", serde_json::json!({ "profileCompleted": true })),
            achievement("placed", serde_json::json!({ "placed": true })),
        ];
        let stats = UserStats { profile_completed: true, ..Default::default() };

        let changes = plan_changes(&catalog, &HashMap::new(), &stats);
        assert_eq!(
            changes,
            vec![
                StateChange::Create { code: "first_steps".into(), unlocked: true },
                StateChange::Create { code: "placed".into(), unlocked: false },
            ]
        );
    }

    #[test]
    fn test_unlock_is_monotonic() {
        let catalog = vec![
            achievement("skill_collector", serde_json::json!({ "skillsCount": 5 })),
            achievement("first_steps", serde_json::json!({ "profileCompleted": true })),
        ];
        let mut states = HashMap::new();
        states.insert("skill_collector".to_string(), state("skill_collector", true));
        states.insert("first_steps".to_string(), state("first_steps", false));

        // Stats caíram: skill_collector não pode voltar a bloquear
        let stats = UserStats { skills_count: 1, profile_completed: true, ..Default::default() };
        let changes = plan_changes(&catalog, &states, &stats);
        assert_eq!(changes, vec![StateChange::Unlock { code: "first_steps".into() }]);

        states.insert("first_steps".to_string(), state("first_steps", true));
        assert!(plan_changes(&catalog, &states, &UserStats::default()).is_empty());
    }

    #[test]
    fn test_compute_stats() {
        let user: User = serde_json::from_value(serde_json::json!({
            "firebaseUid": "u1",
            "email": "a@b.c",
            "profile": { "completed": true },
            "resume": { "resumeText": "text", "skills": ["a", "b"], "softskills": ["teamwork"] },
            "interviewPrepCount": 3,
            "placed": true,
            "lastLogin": null,
            "createdAt": null,
            "updatedAt": null
        }))
        .unwrap();

        let stats = compute_stats(&user);
        assert!(stats.profile_completed);
        assert!(stats.resume_uploaded);
        assert_eq!(stats.skills_count, 2);
        assert!(stats.soft_skills_analyzed);
        assert_eq!(stats.interview_prep, 3);
        assert!(stats.placed);
        assert_eq!(stats.wishlist_count, 0);
    }
}
