use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::resume::Resume;
use crate::utils::dates::{deserialize_flexible_date, to_iso_opt};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
    Moderator,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Gravada como BSON Date; a API aceita string de data
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_birth: Option<BsonDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPreferences {
    #[serde(default = "default_true")]
    pub email: bool,
    #[serde(default = "default_true")]
    pub push: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self { email: true, push: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub notifications: NotificationPreferences,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Usuário (armazenado no MongoDB, collection `users`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// UID do Firebase (único)
    pub firebase_uid: String,

    /// Email em minúsculas (único)
    pub email: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub phone_number: String,

    #[serde(default)]
    pub role: UserRole,

    /// Soft delete
    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub profile: Profile,

    #[serde(default)]
    pub preferences: Preferences,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<Resume>,

    /// Referências para `jobs`
    #[serde(default)]
    pub wishlist: Vec<ObjectId>,

    #[serde(default)]
    pub jobs_applied: Vec<ObjectId>,

    #[serde(default)]
    pub learning_paths: Vec<LearningPath>,

    #[serde(default)]
    pub interview_prep_count: i64,

    #[serde(default)]
    pub interviews_count: i64,

    #[serde(default)]
    pub offers_count: i64,

    #[serde(default)]
    pub placed: bool,

    pub last_login: Option<BsonDateTime>,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

impl User {
    /// Nome completo: "first last" quando ambos existem, senão displayName, senão email
    pub fn full_name(&self) -> String {
        match (&self.profile.first_name, &self.profile.last_name) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                format!("{} {}", first, last)
            }
            _ if !self.display_name.is_empty() => self.display_name.clone(),
            _ => self.email.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

/// Resumo retornado por /auth/verify
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub firebase_uid: String,
    pub email: String,
    pub display_name: String,
    #[schema(value_type = String)]
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id_hex(),
            firebase_uid: user.firebase_uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            is_active: user.is_active,
            last_login: to_iso_opt(&user.last_login),
        }
    }
}

/// Perfil como exposto na API (datas em ISO 8601)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub address: Option<Address>,
    pub completed: bool,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            date_of_birth: to_iso_opt(&profile.date_of_birth),
            first_name: profile.first_name,
            last_name: profile.last_name,
            gender: profile.gender,
            address: profile.address,
            completed: profile.completed,
        }
    }
}

/// Perfil completo (inclui currículo e wishlist como ids hex)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub firebase_uid: String,
    pub email: String,
    pub display_name: String,
    pub phone_number: String,
    pub role: UserRole,
    pub is_active: bool,
    pub profile: ProfileResponse,
    pub preferences: Preferences,
    pub resume: Option<Resume>,
    pub wishlist: Vec<String>,
    pub interview_prep_count: i64,
    pub last_login: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub full_name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id_hex(),
            firebase_uid: user.firebase_uid,
            email: user.email,
            display_name: user.display_name,
            phone_number: user.phone_number,
            role: user.role,
            is_active: user.is_active,
            profile: ProfileResponse::from(user.profile),
            preferences: user.preferences,
            resume: user.resume,
            wishlist: user.wishlist.iter().map(|id| id.to_hex()).collect(),
            interview_prep_count: user.interview_prep_count,
            last_login: to_iso_opt(&user.last_login),
            created_at: to_iso_opt(&user.created_at),
            updated_at: to_iso_opt(&user.updated_at),
            full_name,
        }
    }
}

/// Request para PUT /auth/profile
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
    #[schema(value_type = Object)]
    pub profile: Option<Profile>,
    #[schema(value_type = Object)]
    pub preferences: Option<Preferences>,
}

/// Request para POST /profile/profile-completion (merge raso)
#[derive(Debug, Deserialize)]
pub struct CompleteProfileRequest {
    pub profile: Option<serde_json::Map<String, serde_json::Value>>,
    pub resume: Option<serde_json::Map<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        serde_json::from_value(serde_json::json!({
            "firebaseUid": "uid-1",
            "email": "jane@example.com",
            "lastLogin": null,
            "createdAt": null,
            "updatedAt": null
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_on_minimal_document() {
        let user = sample_user();
        assert_eq!(user.role, UserRole::User);
        assert!(user.is_active);
        assert_eq!(user.preferences.theme, Theme::Light);
        assert!(user.preferences.notifications.email);
        assert!(user.wishlist.is_empty());
    }

    #[test]
    fn test_full_name_fallbacks() {
        let mut user = sample_user();
        assert_eq!(user.full_name(), "jane@example.com");

        user.display_name = "Jane D".into();
        assert_eq!(user.full_name(), "Jane D");

        user.profile.first_name = Some("Jane".into());
        assert_eq!(user.full_name(), "Jane D");

        user.profile.last_name = Some("Doe".into());
        assert_eq!(user.full_name(), "Jane Doe");
    }

    #[test]
    fn test_date_of_birth_stored_as_bson_date() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "firstName": "Jane",
            "dateOfBirth": "1990-04-12"
        }))
        .unwrap();

        let stored = mongodb::bson::to_document(&profile).unwrap();
        assert!(matches!(stored.get("dateOfBirth"), Some(mongodb::bson::Bson::DateTime(_))));

        let response = ProfileResponse::from(profile);
        assert_eq!(response.date_of_birth.as_deref().map(|d| &d[..10]), Some("1990-04-12"));
    }

    #[test]
    fn test_role_wire_format() {
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
        assert_eq!(serde_json::to_string(&UserRole::Moderator).unwrap(), "\"moderator\"");
    }
}
