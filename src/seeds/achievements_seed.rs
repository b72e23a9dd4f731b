use crate::database::MongoDB;
use crate::models::{Achievement, Rarity};
use crate::services::achievement_service::ACHIEVEMENTS;
use mongodb::bson::doc;

/// Seed do catálogo de conquistas.
/// Só insere quando a collection está vazia.
pub async fn seed_default_achievements(db: &MongoDB) {
    let collection = db.collection::<Achievement>(ACHIEVEMENTS);

    let count = collection.count_documents(doc! {}).await.unwrap_or(0);
    if count > 0 {
        log::info!("🏆 Achievements: {} already in DB, skipping seed", count);
        return;
    }

    let catalog = build_default_catalog();
    log::info!("🏆 Achievements: seeding {} default achievements...", catalog.len());

    match collection.insert_many(&catalog).await {
        Ok(result) => log::info!("   ✅ Inserted {} achievements", result.inserted_ids.len()),
        Err(e) => log::error!("   ❌ Failed to seed achievements: {}", e),
    }
}

fn entry(
    code: &str,
    title: &str,
    description: &str,
    icon: &str,
    category: &str,
    rarity: Rarity,
    criteria: serde_json::Value,
) -> Achievement {
    Achievement {
        id: None,
        code: code.into(),
        title: title.into(),
        description: description.into(),
        icon: icon.into(),
        category: category.into(),
        rarity,
        criteria: match criteria {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        },
    }
}

fn build_default_catalog() -> Vec<Achievement> {
    use serde_json::json;

    vec![
        // ── Perfil ──
        entry("first_steps", "First Steps", "Complete your profile", "FiUserCheck", "profile",
            Rarity::Common, json!({ "profileCompleted": true })),
        entry("resume_ready", "Resume Ready", "Upload your resume", "FiFileText", "profile",
            Rarity::Common, json!({ "resumeUploaded": true })),

        // ── Skills ──
        entry("skill_collector", "Skill Collector", "Add 5 skills to your resume", "FiPlusCircle", "skills",
            Rarity::Common, json!({ "skillsCount": 5 })),
        entry("skill_master", "Skill Master", "Add 15 skills to your resume", "FiLayers", "skills",
            Rarity::Rare, json!({ "skillsCount": 15 })),

        // ── Certificações ──
        entry("certified", "Certified", "Add your first certification", "FiAward", "certification",
            Rarity::Common, json!({ "certificationsCount": 1 })),
        entry("cert_collector", "Certification Collector", "Add 5 certifications", "FiAward", "certification",
            Rarity::Rare, json!({ "certificationsCount": 5 })),

        // ── Candidaturas e wishlist ──
        entry("window_shopper", "Window Shopper", "Save a job to your wishlist", "FiHeart", "wishlist",
            Rarity::Common, json!({ "wishlistCount": 1 })),
        entry("job_hunter", "Job Hunter", "Apply to 10 jobs", "FiSend", "applications",
            Rarity::Rare, json!({ "jobsApplied": 10 })),

        // ── Entrevistas ──
        entry("interview_ready", "Interview Ready", "Complete a mock interview", "FiMic", "interview",
            Rarity::Common, json!({ "interviewPrep": 1 })),
        entry("interview_pro", "Interview Pro", "Complete 10 mock interviews", "FiMic", "interview",
            Rarity::Rare, json!({ "interviewPrep": 10 })),
        entry("people_person", "People Person", "Get your soft skills analyzed", "FiSmile", "interview",
            Rarity::Common, json!({ "softSkillsAnalyzed": true })),

        // ── Aprendizado ──
        entry("lifelong_learner", "Lifelong Learner", "Start 3 learning paths", "FiBookOpen", "learning",
            Rarity::Common, json!({ "learningPathsStarted": 3 })),

        // ── Marcos ──
        entry("interviewee", "Interviewee", "Land your first real interview", "FiPhoneCall", "milestone",
            Rarity::Common, json!({ "interviews": 1 })),
        entry("offer_in_hand", "Offer in Hand", "Receive a job offer", "FiBriefcase", "milestone",
            Rarity::Rare, json!({ "offers": 1 })),
        entry("placed", "Placed!", "Get placed in a job", "FiStar", "milestone",
            Rarity::Legendary, json!({ "placed": true })),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStats;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_codes_are_unique() {
        let catalog = build_default_catalog();
        let codes: HashSet<&str> = catalog.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes.len(), catalog.len());
    }

    #[test]
    fn test_catalog_criteria_reference_known_stats() {
        let stats = match serde_json::to_value(UserStats::default()).unwrap() {
            serde_json::Value::Object(map) => map,
            _ => panic!("stats must serialize to an object"),
        };
        for achievement in build_default_catalog() {
            assert!(!achievement.criteria.is_empty(), "{} has no criteria", achievement.code);
            for key in achievement.criteria.keys() {
                assert!(stats.contains_key(key), "{} uses unknown stat {}", achievement.code, key);
            }
        }
    }
}
