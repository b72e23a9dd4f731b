// ═══════════════════════════════════════════════════════════════════
// JOB FETCHER — ingestão de vagas do JSearch (RapidAPI)
// ═══════════════════════════════════════════════════════════════════
//
// Um ciclo:
//   1. remove vagas mais antigas que JOB_RETENTION_DAYS
//   2. percorre SEARCH_QUERIES até juntar JOB_FETCH_LIMIT vagas
//      (pausa de JOB_FETCH_DELAY_MS entre queries)
//   3. mapeia cada resultado para `Job` com heurísticas de texto
//   4. upsert por (company_name, job_title, location)
//
// Falhas de uma query ou de uma vaga são logadas e ignoradas; não há retry.
// Um AtomicBool impede dois ciclos simultâneos (timer + trigger manual).

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    database::MongoDB,
    models::Job,
    services::job_service,
    utils::{dates::days_from_now, error::AppError, http_client::http_client},
};

const JSEARCH_URL: &str = "https://jsearch.p.rapidapi.com/search";
const DEFAULT_RAPIDAPI_HOST: &str = "jsearch.p.rapidapi.com";

const DEFAULT_FETCH_LIMIT: usize = 30;
const DEFAULT_FETCH_DELAY_MS: u64 = 1000;
const DEFAULT_RETENTION_DAYS: i64 = 7;
pub const DEFAULT_INTERVAL_SECS: u64 = 6 * 60 * 60;

/// Prazo de candidatura das vagas ingeridas
const APPLICATION_WINDOW_DAYS: i64 = 30;

pub const SEARCH_QUERIES: [&str; 10] = [
    "software developer jobs",
    "web developer jobs",
    "full stack developer jobs",
    "frontend developer jobs",
    "backend developer jobs",
    "mobile developer jobs",
    "data scientist jobs",
    "devops engineer jobs",
    "ui ux designer jobs",
    "product manager jobs",
];

const SKILL_KEYWORDS: [&str; 35] = [
    "JavaScript", "Python", "Java", "React", "Node.js", "Angular", "Vue.js",
    "TypeScript", "PHP", "Ruby", "Go", "Swift", "Kotlin", "C++", "C#",
    "HTML", "CSS", "SQL", "MongoDB", "PostgreSQL", "MySQL", "Redis",
    "AWS", "Azure", "GCP", "Docker", "Kubernetes", "Jenkins", "Git",
    "Agile", "Scrum", "REST", "GraphQL", "API", "Microservices",
];

const BENEFIT_KEYWORDS: [&str; 17] = [
    "health insurance", "dental", "vision", "401k", "retirement",
    "paid time off", "pto", "vacation", "remote work", "flexible hours",
    "professional development", "training", "stock options", "bonus",
    "gym membership", "free lunch", "parental leave",
];

/// Casa a palavra inteira sem depender de `\b` (que falha em "C++" e "C#")
fn keyword_regex(keyword: &'static str) -> Option<(&'static str, Regex)> {
    let pattern = format!(r"(?i)(?:^|[^a-z0-9]){}(?:$|[^a-z0-9+#])", regex::escape(keyword));
    Regex::new(&pattern).ok().map(|re| (keyword, re))
}

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref SENIOR: Regex =
        Regex::new(r"(?i)\b(senior|lead|principal|architect)\b|\bsr\.|\b(5|7|8|10)\+ years").unwrap();
    static ref JUNIOR: Regex =
        Regex::new(r"(?i)\b(junior|entry|graduate|new grad)\b|\bjr\.|\b0-2 years").unwrap();
    static ref INTERN: Regex = Regex::new(r"(?i)\b(intern|internship|trainee)\b").unwrap();
    static ref PHD: Regex = Regex::new(r"(?i)\b(phd|ph\.d|doctorate)").unwrap();
    static ref MASTERS: Regex = Regex::new(r"(?i)\b(master'?s?|mba)\b").unwrap();
    static ref BACHELORS: Regex = Regex::new(r"(?i)\b(bachelor'?s?|degree)\b").unwrap();
    static ref SKILL_MATCHERS: Vec<(&'static str, Regex)> =
        SKILL_KEYWORDS.iter().filter_map(|k| keyword_regex(*k)).collect();
    static ref BENEFIT_MATCHERS: Vec<(&'static str, Regex)> =
        BENEFIT_KEYWORDS.iter().filter_map(|k| keyword_regex(*k)).collect();
    static ref LAST_CYCLE: Mutex<Option<FetchCycleSummary>> = Mutex::new(None);
}

static CYCLE_RUNNING: AtomicBool = AtomicBool::new(false);

// ==================== CONFIG ====================

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub api_host: String,
    pub fetch_limit: usize,
    pub delay_ms: u64,
    pub retention_days: i64,
    pub interval_secs: u64,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl FetcherConfig {
    pub fn from_env() -> Self {
        let enabled = env::var("JOB_FETCHER_ENABLED")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(true);

        Self {
            enabled,
            api_key: env::var("RAPIDAPI_KEY").ok().filter(|k| !k.trim().is_empty()),
            api_host: env::var("RAPIDAPI_HOST").unwrap_or_else(|_| DEFAULT_RAPIDAPI_HOST.to_string()),
            fetch_limit: env_parse("JOB_FETCH_LIMIT", DEFAULT_FETCH_LIMIT).max(1),
            delay_ms: env_parse("JOB_FETCH_DELAY_MS", DEFAULT_FETCH_DELAY_MS),
            retention_days: env_parse("JOB_RETENTION_DAYS", DEFAULT_RETENTION_DAYS).max(1),
            interval_secs: env_parse("JOB_FETCH_INTERVAL_SECS", DEFAULT_INTERVAL_SECS).max(60),
        }
    }
}

// ==================== JSEARCH PAYLOAD ====================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JSearchJob {
    #[serde(default)]
    pub employer_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub job_employment_type: Option<String>,
    #[serde(default)]
    pub job_city: Option<String>,
    #[serde(default)]
    pub job_state: Option<String>,
    #[serde(default)]
    pub job_country: Option<String>,
    #[serde(default)]
    pub job_min_salary: Option<f64>,
    #[serde(default)]
    pub job_max_salary: Option<f64>,
    #[serde(default)]
    pub job_salary_currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JSearchResponse {
    #[serde(default)]
    data: Vec<JSearchJob>,
}

// ==================== HEURÍSTICAS ====================

/// Remove tags HTML e colapsa espaços
pub fn strip_html(html: &str) -> String {
    let no_tags = HTML_TAG.replace_all(html, " ");
    WHITESPACE.replace_all(&no_tags, " ").trim().to_string()
}

pub fn extract_skills(text: &str) -> Vec<String> {
    let found: Vec<String> = SKILL_MATCHERS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(skill, _)| skill.to_string())
        .collect();

    if found.is_empty() {
        vec!["General Development".to_string()]
    } else {
        found
    }
}

pub fn experience_level(description: &str, title: &str) -> String {
    let text = format!("{} {}", title, description);
    let level = if SENIOR.is_match(&text) {
        "Senior"
    } else if JUNIOR.is_match(&text) {
        "Junior"
    } else if INTERN.is_match(&text) {
        "Intern"
    } else {
        "Mid-level"
    };
    level.to_string()
}

pub fn education_requirements(description: &str) -> String {
    let requirement = if PHD.is_match(description) {
        "PhD required"
    } else if MASTERS.is_match(description) {
        "Master's degree preferred"
    } else if BACHELORS.is_match(description) {
        "Bachelor's degree required"
    } else {
        "Bachelor's degree preferred"
    };
    requirement.to_string()
}

fn money(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("${}", value as i64)
    } else {
        format!("${:.2}", value)
    }
}

pub fn format_salary(min: Option<f64>, max: Option<f64>, currency: Option<&str>) -> String {
    let currency = currency.map(str::trim).filter(|c| !c.is_empty());
    let with_currency = |s: String| match currency {
        Some(cur) => format!("{} {}", s, cur),
        None => s,
    };

    match (min.filter(|v| *v > 0.0), max.filter(|v| *v > 0.0)) {
        (Some(min), Some(max)) => with_currency(format!("{} - {}", money(min), money(max))),
        (Some(min), None) => with_currency(format!("{}+", money(min))),
        (None, Some(max)) => with_currency(format!("Up to {}", money(max))),
        (None, None) => "Competitive salary".to_string(),
    }
}

pub fn format_location(city: Option<&str>, state: Option<&str>, country: Option<&str>) -> String {
    let parts: Vec<&str> = [city, state, country]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        "Remote".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn extract_benefits(text: &str) -> Vec<String> {
    let found: Vec<String> = BENEFIT_MATCHERS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(benefit, _)| capitalize(benefit))
        .collect();

    if found.is_empty() {
        vec!["Competitive benefits package".to_string()]
    } else {
        found
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Converte um resultado do JSearch no documento `Job`
pub fn map_api_job(api_job: &JSearchJob) -> Job {
    let title = non_empty(&api_job.job_title).unwrap_or("Job Title Not Available").to_string();
    let description = strip_html(api_job.job_description.as_deref().unwrap_or(""));
    let employment_type = non_empty(&api_job.job_employment_type).unwrap_or("FULLTIME").to_string();
    let text = format!("{} {}", title, description);

    Job {
        id: None,
        company_name: non_empty(&api_job.employer_name)
            .unwrap_or("Company Name Not Available")
            .to_string(),
        required_skills: extract_skills(&text),
        experience_level: experience_level(&description, &title),
        education_requirements: education_requirements(&description),
        stipend: if employment_type.eq_ignore_ascii_case("INTERN") {
            Some("Available".to_string())
        } else {
            None
        },
        salary: format_salary(
            api_job.job_min_salary,
            api_job.job_max_salary,
            api_job.job_salary_currency.as_deref(),
        ),
        location: format_location(
            api_job.job_city.as_deref(),
            api_job.job_state.as_deref(),
            api_job.job_country.as_deref(),
        ),
        benefits: extract_benefits(&description),
        application_deadline: days_from_now(APPLICATION_WINDOW_DAYS),
        job_description: if description.is_empty() {
            "Job description not available".to_string()
        } else {
            description
        },
        job_title: title,
        job_type: employment_type,
        created_at: None,
        updated_at: None,
    }
}

// ==================== CICLO ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchCycleSummary {
    pub pruned: u64,
    pub queries_run: usize,
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    pub started_at: String,
    pub duration_ms: u128,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(FetchCycleSummary),
    /// Outro ciclo já estava rodando
    Skipped,
}

/// Libera o flag ao sair do ciclo, inclusive em erro
struct RunningGuard;

impl RunningGuard {
    fn acquire() -> Option<Self> {
        CYCLE_RUNNING
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunningGuard)
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        CYCLE_RUNNING.store(false, Ordering::SeqCst);
    }
}

pub fn is_running() -> bool {
    CYCLE_RUNNING.load(Ordering::SeqCst)
}

pub fn last_cycle() -> Option<FetchCycleSummary> {
    LAST_CYCLE.lock().ok().and_then(|guard| guard.clone())
}

async fn fetch_query(config: &FetcherConfig, api_key: &str, query: &str) -> Result<Vec<JSearchJob>, String> {
    let url = format!(
        "{}?query={}&page=1&num_pages=1&country=us&date_posted=all",
        JSEARCH_URL,
        urlencoding::encode(query)
    );

    let response = http_client()
        .get(&url)
        .header("x-rapidapi-key", api_key)
        .header("x-rapidapi-host", &config.api_host)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| format!("JSearch request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("JSearch API error: {}", response.status()));
    }

    let body: JSearchResponse = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse JSearch response: {}", e))?;

    Ok(body.data)
}

/// Executa um ciclo completo (limpeza + busca + upsert)
pub async fn run_cycle(db: &MongoDB, config: &FetcherConfig) -> Result<CycleOutcome, AppError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| AppError::ExternalError("RAPIDAPI_KEY not configured".to_string()))?;

    let _guard = match RunningGuard::acquire() {
        Some(guard) => guard,
        None => {
            log::warn!("⏭️  Job fetch cycle already running, skipping");
            return Ok(CycleOutcome::Skipped);
        }
    };

    let start = std::time::Instant::now();
    let started_at = chrono::Utc::now().to_rfc3339();
    log::info!("📥 Job fetch cycle starting (limit: {})", config.fetch_limit);

    let pruned = job_service::delete_older_than(db, config.retention_days).await?;

    let mut collected: Vec<Job> = Vec::new();
    let mut queries_run = 0;

    for query in SEARCH_QUERIES {
        if collected.len() >= config.fetch_limit {
            break;
        }
        queries_run += 1;
        log::debug!("📥 Fetching jobs for query: {}", query);

        match fetch_query(config, &api_key, query).await {
            Ok(results) => {
                log::debug!("   {} results for '{}'", results.len(), query);
                collected.extend(results.iter().map(map_api_job));
            }
            Err(e) => log::warn!("⚠️  {} (query: '{}')", e, query),
        }

        tokio::time::sleep(Duration::from_millis(config.delay_ms)).await;
    }

    collected.truncate(config.fetch_limit);

    let (mut inserted, mut updated, mut failed) = (0, 0, 0);
    for job in &collected {
        match job_service::upsert_job(db, job).await {
            Ok(true) => inserted += 1,
            Ok(false) => updated += 1,
            Err(e) => {
                failed += 1;
                log::error!("❌ Failed to save job '{}' at '{}': {}", job.job_title, job.company_name, e);
            }
        }
    }

    let summary = FetchCycleSummary {
        pruned,
        queries_run,
        fetched: collected.len(),
        inserted,
        updated,
        failed,
        started_at,
        duration_ms: start.elapsed().as_millis(),
    };

    log::info!(
        "✅ Job fetch cycle done: {} fetched, {} new, {} updated, {} failed, {} pruned ({}ms)",
        summary.fetched,
        summary.inserted,
        summary.updated,
        summary.failed,
        summary.pruned,
        summary.duration_ms
    );

    if let Ok(mut last) = LAST_CYCLE.lock() {
        *last = Some(summary.clone());
    }

    Ok(CycleOutcome::Completed(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Build <b>APIs</b></p>\n\n  with   Rust"), "Build APIs with Rust");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_extract_skills_uses_word_boundaries() {
        let skills = extract_skills("We use React, Node.js and C++ on AWS. Good communication.");
        assert!(skills.contains(&"React".to_string()));
        assert!(skills.contains(&"Node.js".to_string()));
        assert!(skills.contains(&"C++".to_string()));
        assert!(skills.contains(&"AWS".to_string()));
        assert!(!skills.contains(&"Go".to_string()));

        let js_only = extract_skills("JavaScript developer");
        assert!(!js_only.contains(&"Java".to_string()));

        assert_eq!(extract_skills("Cooking and cleaning"), vec!["General Development"]);
    }

    #[test]
    fn test_experience_level() {
        assert_eq!(experience_level("5+ years of experience", "Engineer"), "Senior");
        assert_eq!(experience_level("", "Lead Developer"), "Senior");
        assert_eq!(experience_level("Great for a new grad", "Engineer"), "Junior");
        assert_eq!(experience_level("", "Software Intern"), "Intern");
        assert_eq!(experience_level("International team", "Engineer"), "Mid-level");
    }

    #[test]
    fn test_education_requirements() {
        assert_eq!(education_requirements("PhD in ML"), "PhD required");
        assert_eq!(education_requirements("MBA a plus"), "Master's degree preferred");
        assert_eq!(education_requirements("Bachelor's in CS"), "Bachelor's degree required");
        assert_eq!(education_requirements("Self-taught welcome"), "Bachelor's degree preferred");
    }

    #[test]
    fn test_format_salary() {
        assert_eq!(format_salary(Some(80000.0), Some(120000.0), Some("USD")), "$80000 - $120000 USD");
        assert_eq!(format_salary(Some(50000.0), None, None), "$50000+");
        assert_eq!(format_salary(None, Some(90000.0), Some("")), "Up to $90000");
        assert_eq!(format_salary(None, None, Some("USD")), "Competitive salary");
    }

    #[test]
    fn test_format_location() {
        assert_eq!(format_location(Some("Austin"), Some("TX"), Some("US")), "Austin, TX, US");
        assert_eq!(format_location(None, Some(" "), Some("US")), "US");
        assert_eq!(format_location(None, None, None), "Remote");
    }

    #[test]
    fn test_extract_benefits() {
        let benefits = extract_benefits("Health insurance, PTO and stock options");
        assert!(benefits.contains(&"Health insurance".to_string()));
        assert!(benefits.contains(&"Pto".to_string()));
        assert!(benefits.contains(&"Stock options".to_string()));
        assert!(!extract_benefits("crypto startup").contains(&"Pto".to_string()));
        assert_eq!(extract_benefits("nothing"), vec!["Competitive benefits package"]);
    }

    #[test]
    fn test_map_api_job_defaults() {
        let job = map_api_job(&JSearchJob::default());
        assert_eq!(job.company_name, "Company Name Not Available");
        assert_eq!(job.job_title, "Job Title Not Available");
        assert_eq!(job.job_description, "Job description not available");
        assert_eq!(job.job_type, "FULLTIME");
        assert_eq!(job.location, "Remote");
        assert_eq!(job.stipend, None);
    }

    #[test]
    fn test_map_api_intern_job() {
        let api_job: JSearchJob = serde_json::from_value(serde_json::json!({
            "employer_name": "Acme",
            "job_title": "Software Intern",
            "job_description": "<ul><li>Python</li><li>SQL</li></ul>",
            "job_employment_type": "INTERN",
            "job_city": "Boston",
            "job_state": "MA"
        }))
        .unwrap();
        let job = map_api_job(&api_job);
        assert_eq!(job.stipend.as_deref(), Some("Available"));
        assert_eq!(job.experience_level, "Intern");
        assert_eq!(job.location, "Boston, MA");
        assert_eq!(job.required_skills, vec!["Python", "SQL"]);
        assert_eq!(job.job_description, "Python SQL");
    }

    #[test]
    fn test_running_guard_is_exclusive() {
        let first = RunningGuard::acquire();
        assert!(first.is_some());
        assert!(RunningGuard::acquire().is_none());
        drop(first);
        assert!(RunningGuard::acquire().is_some());
    }
}
