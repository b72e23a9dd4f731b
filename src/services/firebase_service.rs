use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::utils::http_client::http_client;

/// Chaves públicas usadas pelo Firebase Auth para assinar ID tokens (JWK)
const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Google rotaciona as chaves a cada ~6h; 1h de TTL é suficiente
const KEYS_CACHE_TTL_SECONDS: u64 = 3600;

/// Claims do ID token do Firebase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Clone)]
struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

lazy_static! {
    static ref KEYS_CACHE: Mutex<Option<CachedKeys>> = Mutex::new(None);
}

/// Extrai o token de um header `Authorization: Bearer <token>`
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn project_id() -> Result<String, String> {
    env::var("FIREBASE_PROJECT_ID")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| "FIREBASE_PROJECT_ID not configured".to_string())
}

async fn fetch_keys() -> Result<JwkSet, String> {
    log::debug!("🔑 Fetching Firebase signing keys...");

    let response = http_client()
        .get(FIREBASE_JWKS_URL)
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| format!("Failed to fetch Firebase keys: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Firebase keys endpoint error: {}", response.status()));
    }

    response
        .json::<JwkSet>()
        .await
        .map_err(|e| format!("Failed to parse Firebase keys: {}", e))
}

/// Busca as chaves com cache em memória
///
/// `force_refresh` ignora o cache (usado quando o `kid` não é encontrado,
/// o que indica rotação de chaves).
async fn signing_keys(force_refresh: bool) -> Result<JwkSet, String> {
    if !force_refresh {
        if let Ok(cache) = KEYS_CACHE.lock() {
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed().as_secs() < KEYS_CACHE_TTL_SECONDS {
                    return Ok(cached.keys.clone());
                }
            }
        }
    }

    let keys = fetch_keys().await?;

    if let Ok(mut cache) = KEYS_CACHE.lock() {
        *cache = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        log::debug!("💾 Cached {} Firebase signing keys", keys.keys.len());
    }

    Ok(keys)
}

fn validation_for(project: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[project]);
    validation.set_issuer(&[format!("{}{}", FIREBASE_ISSUER_PREFIX, project)]);
    validation
}

/// Verifica um ID token do Firebase (RS256, aud = projeto, iss = securetoken)
pub async fn verify_id_token(token: &str) -> Result<FirebaseClaims, String> {
    let header = decode_header(token).map_err(|e| format!("Malformed token: {}", e))?;

    if header.alg != Algorithm::RS256 {
        return Err(format!("Unexpected token algorithm: {:?}", header.alg));
    }

    let kid = header.kid.ok_or_else(|| "Token has no key id".to_string())?;
    let project = project_id()?;

    let mut keys = signing_keys(false).await?;
    if keys.find(&kid).is_none() {
        keys = signing_keys(true).await?;
    }

    let jwk = keys
        .find(&kid)
        .ok_or_else(|| format!("Unknown signing key: {}", kid))?;
    let decoding_key =
        DecodingKey::from_jwk(jwk).map_err(|e| format!("Invalid signing key: {}", e))?;

    let data = decode::<FirebaseClaims>(token, &decoding_key, &validation_for(&project))
        .map_err(|e| format!("Invalid token: {}", e))?;

    if data.claims.sub.is_empty() {
        return Err("Token has empty subject".to_string());
    }

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn test_validation_targets_project() {
        let validation = validation_for("demo-project");
        assert_eq!(validation.algorithms, vec![Algorithm::RS256]);
        assert!(validation
            .iss
            .as_ref()
            .map(|iss| iss.contains("https://securetoken.google.com/demo-project"))
            .unwrap_or(false));
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected() {
        let err = verify_id_token("not-a-jwt").await.unwrap_err();
        assert!(err.contains("Malformed token"));
    }
}
