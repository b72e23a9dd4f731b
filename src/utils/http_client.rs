/// Cliente HTTP compartilhado para integrações externas (LLM, JSearch, Firebase, matcher)
///
/// Um único `reqwest::Client` reaproveita o pool de conexões entre requests.
/// O timeout padrão vem de `LLM_TIMEOUT_SECS` (default 60s); chamadas rápidas
/// podem sobrescrever por request com `.timeout(...)`.

use lazy_static::lazy_static;
use std::env;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

lazy_static! {
    pub static ref HTTP_CLIENT: reqwest::Client = build_client();
}

fn build_client() -> reqwest::Client {
    let timeout_secs = env::var("LLM_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("⚠️  Failed to build tuned HTTP client ({}), using defaults", e);
            reqwest::Client::new()
        })
}

/// Acesso ao cliente compartilhado
pub fn http_client() -> &'static reqwest::Client {
    &HTTP_CLIENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_is_shared() {
        let a = http_client() as *const reqwest::Client;
        let b = http_client() as *const reqwest::Client;
        assert_eq!(a, b);
    }
}
