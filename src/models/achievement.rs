use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::dates::to_iso_opt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Legendary,
}

/// Catálogo estático de conquistas (collection `achievements`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub code: String,
    pub title: String,
    pub description: String,
    /// Nome do ícone no frontend (ex: "FiAward")
    pub icon: String,
    pub category: String,
    #[serde(default)]
    pub rarity: Rarity,
    /// Ex: { "skillsCount": 5 } ou { "placed": true }
    #[serde(default)]
    pub criteria: serde_json::Map<String, serde_json::Value>,
}

/// Estado de desbloqueio por usuário (collection `user_achievements`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAchievement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub achievement_code: String,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<BsonDateTime>,
}

/// Conquista + estado do usuário para a resposta
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementView {
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub rarity: Rarity,
    pub criteria: serde_json::Map<String, serde_json::Value>,
    pub unlocked: bool,
    pub unlocked_at: Option<String>,
}

impl AchievementView {
    pub fn new(achievement: Achievement, state: Option<&UserAchievement>) -> Self {
        Self {
            code: achievement.code,
            title: achievement.title,
            description: achievement.description,
            icon: achievement.icon,
            category: achievement.category,
            rarity: achievement.rarity,
            criteria: achievement.criteria,
            unlocked: state.map(|s| s.unlocked).unwrap_or(false),
            unlocked_at: state.and_then(|s| to_iso_opt(&s.unlocked_at)),
        }
    }
}

/// Estatísticas derivadas do usuário usadas pelos critérios
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub profile_completed: bool,
    pub resume_uploaded: bool,
    pub skills_count: i64,
    pub certifications_count: i64,
    pub jobs_applied: i64,
    pub wishlist_count: i64,
    pub interview_prep: i64,
    pub soft_skills_analyzed: bool,
    pub learning_paths_started: i64,
    pub interviews: i64,
    pub offers: i64,
    pub placed: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AchievementSummary {
    pub unlocked: usize,
    pub total: usize,
    pub percentage: u32,
}

impl AchievementSummary {
    pub fn from_views(views: &[AchievementView]) -> Self {
        let total = views.len();
        let unlocked = views.iter().filter(|v| v.unlocked).count();
        let percentage = if total == 0 {
            0
        } else {
            ((unlocked as f64 / total as f64) * 100.0).round() as u32
        };
        Self { unlocked, total, percentage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_entry(code: &str) -> Achievement {
        Achievement {
            id: None,
            code: code.to_string(),
            title: code.to_uppercase(),
            description: String::new(),
            icon: "FiAward".into(),
            category: "profile".into(),
            rarity: Rarity::Common,
            criteria: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_view_without_state_is_locked() {
        let view = AchievementView::new(catalog_entry("first_steps"), None);
        assert!(!view.unlocked);
        assert!(view.unlocked_at.is_none());
    }

    #[test]
    fn test_summary_percentage() {
        let unlocked = UserAchievement {
            id: None,
            user_id: "u1".into(),
            achievement_code: "first_steps".into(),
            unlocked: true,
            unlocked_at: Some(BsonDateTime::now()),
        };
        let views = vec![
            AchievementView::new(catalog_entry("first_steps"), Some(&unlocked)),
            AchievementView::new(catalog_entry("resume_ready"), None),
            AchievementView::new(catalog_entry("certified"), None),
        ];
        assert_eq!(
            AchievementSummary::from_views(&views),
            AchievementSummary { unlocked: 1, total: 3, percentage: 33 }
        );
        assert_eq!(AchievementSummary::from_views(&[]).percentage, 0);
    }

    #[test]
    fn test_rarity_wire_format() {
        let r: Rarity = serde_json::from_str("\"legendary\"").unwrap();
        assert_eq!(r, Rarity::Legendary);
    }
}
