use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime, Document};
use serde::{Deserialize, Serialize};

use crate::{
    database::MongoDB,
    models::{Job, JobResponse, JobSearchQuery},
    utils::{
        dates::{days_from_now, hours_ago, to_iso_opt},
        error::AppError,
    },
};

pub const COLLECTION: &str = "jobs";

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPage {
    pub count: usize,
    pub total_jobs: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub jobs: Vec<JobResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupCount {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total_jobs: u64,
    pub recent_jobs: u64,
    pub experience_stats: Vec<GroupCount>,
    pub job_type_stats: Vec<GroupCount>,
    pub top_companies: Vec<GroupCount>,
    pub top_skills: Vec<GroupCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub is_active: bool,
    pub total_jobs: u64,
    pub latest_job_date: Option<String>,
    pub recent_jobs_count: u64,
    pub last_fetch_status: String,
}

/// Normaliza paginação: página >= 1, limite entre 1 e 100 (default 10)
pub fn normalize_pagination(page: Option<u64>, limit: Option<i64>) -> (u64, i64) {
    let page = page.filter(|p| *p >= 1).unwrap_or(1);
    let limit = limit
        .filter(|l| *l >= 1)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    (page, limit)
}

fn total_pages(total: u64, limit: i64) -> u64 {
    let limit = limit.max(1) as u64;
    total.div_ceil(limit)
}

fn contains_ci(value: &str) -> Document {
    doc! { "$regex": regex::escape(value.trim()), "$options": "i" }
}

/// Filtro de busca a partir dos query params
///
/// Campos texto viram regex case-insensitive com a entrada escapada;
/// `skills` é uma lista separada por vírgulas casada com `$in`.
pub fn build_search_filter(query: &JobSearchQuery) -> Document {
    let mut filter = Document::new();

    let text_fields = [
        ("experience_level", &query.experience_level),
        ("job_type", &query.job_type),
        ("location", &query.location),
        ("company_name", &query.company_name),
    ];
    for (field, value) in text_fields {
        if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            filter.insert(field, contains_ci(v));
        }
    }

    if let Some(skills) = query.skills.as_deref() {
        let skills: Vec<Bson> = skills
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Bson::String(s.to_string()))
            .collect();
        if !skills.is_empty() {
            filter.insert("required_skills", doc! { "$in": skills });
        }
    }

    if let Some(min) = query.salary_min.as_deref().filter(|v| !v.trim().is_empty()) {
        filter.insert(
            "salary",
            doc! { "$regex": format!(r"\${}", regex::escape(min.trim())), "$options": "i" },
        );
    }

    filter
}

/// Chave de deduplicação das vagas (postadas ou ingeridas)
pub fn dedup_filter(job: &Job) -> Document {
    doc! {
        "company_name": &job.company_name,
        "job_title": &job.job_title,
        "location": &job.location,
    }
}

pub fn parse_job_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::InvalidRequest("Invalid job ID".to_string()))
}

/// Resultado da busca por id: ausência vira 404
pub fn found_job(job: Option<Job>) -> Result<Job, AppError> {
    job.ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}

/// Vaga gravada por POST /jobs/postjd
#[derive(Debug)]
pub enum PostedJob {
    /// Primeira vez que a chave (empresa, título, local) aparece
    Created(Job),
    /// Já existia; o documento foi atualizado no lugar
    Existing(Job),
}

impl PostedJob {
    pub fn from_upsert(inserted: bool, stored: Job) -> Self {
        if inserted {
            PostedJob::Created(stored)
        } else {
            PostedJob::Existing(stored)
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, PostedJob::Created(_))
    }

    pub fn into_job(self) -> Job {
        match self {
            PostedJob::Created(job) | PostedJob::Existing(job) => job,
        }
    }
}

/// Cria uma vaga manualmente (POST /jobs/postjd)
///
/// Passa pela mesma chave de deduplicação da ingestão: postar a mesma vaga
/// duas vezes atualiza o documento existente em vez de criar outro.
pub async fn create_job(db: &MongoDB, job: Job) -> Result<PostedJob, AppError> {
    let inserted = upsert_job(db, &job).await?;

    let stored = db
        .collection::<Job>(COLLECTION)
        .find_one(dedup_filter(&job))
        .await?
        .ok_or_else(|| AppError::DatabaseError("Job upsert returned no document".to_string()))?;

    if inserted {
        log::info!("✅ Job created: {} at {}", stored.job_title, stored.company_name);
    } else {
        log::info!("♻️  Job already posted, updated in place: {} at {}", stored.job_title, stored.company_name);
    }
    Ok(PostedJob::from_upsert(inserted, stored))
}

/// Insere ou atualiza pela chave (empresa, título, local)
///
/// `createdAt` só é gravado na inserção, então a idade da vaga para a
/// limpeza conta a partir da primeira ingestão. Retorna `true` se inseriu.
pub async fn upsert_job(db: &MongoDB, job: &Job) -> Result<bool, AppError> {
    let collection = db.collection::<Job>(COLLECTION);
    let now = BsonDateTime::now();

    let result = collection
        .update_one(dedup_filter(job), upsert_update(job, now)?)
        .upsert(true)
        .await?;

    Ok(result.upserted_id.is_some())
}

/// `$set` com os campos da vaga e `$setOnInsert` só para `createdAt`
pub fn upsert_update(job: &Job, now: BsonDateTime) -> Result<Document, AppError> {
    let mut fields = mongodb::bson::to_document(job)?;
    fields.remove("_id");
    fields.remove("createdAt");
    fields.insert("updatedAt", now);

    Ok(doc! { "$set": fields, "$setOnInsert": { "createdAt": now } })
}

async fn find_page(db: &MongoDB, filter: Document, page: u64, limit: i64) -> Result<JobPage, AppError> {
    let collection = db.collection::<Job>(COLLECTION);
    let skip = (page - 1) * limit as u64;

    let jobs: Vec<Job> = collection
        .find(filter.clone())
        .sort(doc! { "createdAt": -1 })
        .skip(skip)
        .limit(limit)
        .await?
        .try_collect()
        .await?;

    let total_jobs = collection.count_documents(filter).await?;

    Ok(JobPage {
        count: jobs.len(),
        total_jobs,
        total_pages: total_pages(total_jobs, limit),
        current_page: page,
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
    })
}

/// Lista paginada, mais recentes primeiro
pub async fn list_jobs(db: &MongoDB, page: Option<u64>, limit: Option<i64>) -> Result<JobPage, AppError> {
    let (page, limit) = normalize_pagination(page, limit);
    find_page(db, Document::new(), page, limit).await
}

pub async fn search_jobs(db: &MongoDB, query: &JobSearchQuery) -> Result<JobPage, AppError> {
    let (page, limit) = normalize_pagination(query.page, query.limit);
    let filter = build_search_filter(query);
    log::debug!("🔎 Job search filter: {}", filter);
    find_page(db, filter, page, limit).await
}

pub async fn get_job(db: &MongoDB, id: &str) -> Result<Job, AppError> {
    let object_id = parse_job_id(id)?;
    let job = db
        .collection::<Job>(COLLECTION)
        .find_one(doc! { "_id": object_id })
        .await?;
    found_job(job)
}

pub async fn jobs_by_ids(db: &MongoDB, ids: &[ObjectId]) -> Result<Vec<Job>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let jobs = db
        .collection::<Job>(COLLECTION)
        .find(doc! { "_id": { "$in": ids.to_vec() } })
        .await?
        .try_collect()
        .await?;
    Ok(jobs)
}

async fn group_counts(db: &MongoDB, pipeline: Vec<Document>) -> Result<Vec<GroupCount>, AppError> {
    let docs: Vec<Document> = db
        .collection::<Document>(COLLECTION)
        .aggregate(pipeline)
        .await?
        .try_collect()
        .await?;

    Ok(docs
        .into_iter()
        .filter_map(|d| match mongodb::bson::from_document::<GroupCount>(d) {
            Ok(group) => Some(group),
            Err(e) => {
                log::warn!("⚠️  Skipping malformed aggregation row: {}", e);
                None
            }
        })
        .collect())
}

fn group_by(field: &str, limit: Option<i64>) -> Vec<Document> {
    let mut pipeline = vec![
        doc! { "$group": { "_id": format!("${}", field), "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
    ];
    if let Some(limit) = limit {
        pipeline.push(doc! { "$limit": limit });
    }
    pipeline
}

/// Estatísticas agregadas das vagas
pub async fn job_stats(db: &MongoDB) -> Result<JobStats, AppError> {
    let collection = db.collection::<Job>(COLLECTION);
    let total_jobs = collection.count_documents(doc! {}).await?;
    let recent_jobs = collection
        .count_documents(doc! { "createdAt": { "$gte": hours_ago(24) } })
        .await?;

    let mut skills_pipeline = vec![doc! { "$unwind": "$required_skills" }];
    skills_pipeline.extend(group_by("required_skills", Some(15)));

    Ok(JobStats {
        total_jobs,
        recent_jobs,
        experience_stats: group_counts(db, group_by("experience_level", None)).await?,
        job_type_stats: group_counts(db, group_by("job_type", None)).await?,
        top_companies: group_counts(db, group_by("company_name", Some(10))).await?,
        top_skills: group_counts(db, skills_pipeline).await?,
    })
}

/// Status da ingestão visto pelo banco (vagas das últimas 12h)
pub async fn service_status(db: &MongoDB) -> Result<ServiceStatus, AppError> {
    let collection = db.collection::<Job>(COLLECTION);
    let total_jobs = collection.count_documents(doc! {}).await?;
    let latest = collection
        .find_one(doc! {})
        .sort(doc! { "createdAt": -1 })
        .await?;
    let recent_jobs_count = collection
        .count_documents(doc! { "createdAt": { "$gte": hours_ago(12) } })
        .await?;

    Ok(ServiceStatus {
        is_active: recent_jobs_count > 0,
        total_jobs,
        latest_job_date: latest.and_then(|job| to_iso_opt(&job.created_at)),
        recent_jobs_count,
        last_fetch_status: if recent_jobs_count > 0 {
            "Success".to_string()
        } else {
            "No recent activity".to_string()
        },
    })
}

/// Remove vagas criadas há mais de `days` dias
pub async fn delete_older_than(db: &MongoDB, days: i64) -> Result<u64, AppError> {
    let cutoff = days_from_now(-days);
    let result = db
        .collection::<Job>(COLLECTION)
        .delete_many(doc! { "createdAt": { "$lt": cutoff } })
        .await?;
    log::info!("🧹 Removed {} jobs older than {} days", result.deleted_count, days);
    Ok(result.deleted_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job {
            id: None,
            company_name: "Acme".into(),
            job_title: "Backend Engineer".into(),
            job_description: "Rust services".into(),
            required_skills: vec!["Rust".into()],
            experience_level: "Senior".into(),
            education_requirements: "Bachelor's degree preferred".into(),
            stipend: None,
            salary: "Competitive salary".into(),
            location: "Austin, TX".into(),
            job_type: "FULLTIME".into(),
            benefits: vec![],
            application_deadline: BsonDateTime::now(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_normalize_pagination() {
        assert_eq!(normalize_pagination(None, None), (1, 10));
        assert_eq!(normalize_pagination(Some(0), Some(-5)), (1, 10));
        assert_eq!(normalize_pagination(Some(3), Some(500)), (3, 100));
        assert_eq!(total_pages(21, 10), 3);
        assert_eq!(total_pages(0, 10), 0);
    }

    #[test]
    fn test_search_filter_escapes_input() {
        let query = JobSearchQuery {
            company_name: Some("C++ (Labs)".into()),
            skills: Some("Rust, Go ,".into()),
            salary_min: Some("80".into()),
            ..Default::default()
        };
        let filter = build_search_filter(&query);

        let company = filter.get_document("company_name").unwrap();
        assert_eq!(company.get_str("$regex").unwrap(), r"C\+\+ \(Labs\)");
        assert_eq!(company.get_str("$options").unwrap(), "i");

        let skills = filter.get_document("required_skills").unwrap();
        assert_eq!(skills.get_array("$in").unwrap().len(), 2);

        assert_eq!(filter.get_document("salary").unwrap().get_str("$regex").unwrap(), r"\$80");
        assert!(!filter.contains_key("location"));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(build_search_filter(&JobSearchQuery::default()).is_empty());
    }

    #[test]
    fn test_dedup_filter_uses_company_title_location() {
        let job = sample_job();
        let mut other = sample_job();
        other.salary = "$100 - $200 USD".into();
        other.job_description = "changed".into();
        assert_eq!(dedup_filter(&job), dedup_filter(&other));

        other.location = "Remote".into();
        assert_ne!(dedup_filter(&job), dedup_filter(&other));
    }

    #[test]
    fn test_parse_job_id() {
        assert!(matches!(parse_job_id("nope"), Err(AppError::InvalidRequest(_))));
        assert!(parse_job_id(&ObjectId::new().to_hex()).is_ok());
    }

    #[test]
    fn test_missing_job_is_not_found() {
        match found_job(None) {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Job not found"),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(found_job(Some(sample_job())).unwrap().job_title, "Backend Engineer");
    }

    #[test]
    fn test_upsert_update_keeps_created_at_on_insert_only() {
        let mut job = sample_job();
        job.id = Some(ObjectId::new());
        job.created_at = Some(BsonDateTime::from_millis(0));
        let now = BsonDateTime::from_millis(1_700_000_000_000);

        let update = upsert_update(&job, now).unwrap();
        let set = update.get_document("$set").unwrap();
        assert!(!set.contains_key("_id"));
        assert!(!set.contains_key("createdAt"));
        assert_eq!(set.get_datetime("updatedAt").unwrap(), &now);
        assert_eq!(set.get_str("company_name").unwrap(), "Acme");

        let on_insert = update.get_document("$setOnInsert").unwrap();
        assert_eq!(on_insert.get_datetime("createdAt").unwrap(), &now);
    }

    #[test]
    fn test_posting_same_job_twice_hits_same_key() {
        // Duas submissões idênticas caem no mesmo filtro de upsert
        let first = sample_job();
        let second = sample_job();
        assert_eq!(dedup_filter(&first), dedup_filter(&second));

        let created = PostedJob::from_upsert(true, first);
        let existing = PostedJob::from_upsert(false, second);
        assert!(created.is_new());
        assert!(!existing.is_new());
        assert_eq!(existing.into_job().company_name, "Acme");
    }

    #[test]
    fn test_group_count_from_aggregation_row() {
        let row = doc! { "_id": "Senior", "count": 4_i32 };
        let group: GroupCount = mongodb::bson::from_document(row).unwrap();
        assert_eq!(group, GroupCount { id: Some("Senior".into()), count: 4 });
    }

    #[tokio::test]
    #[ignore] // Requer MongoDB rodando
    async fn test_upsert_is_idempotent() {
        let db = MongoDB::new("mongodb://localhost:27017/career_service_test").await.unwrap();
        let job = sample_job();
        let _ = db.collection::<Job>(COLLECTION).delete_many(dedup_filter(&job)).await;

        assert!(upsert_job(&db, &job).await.unwrap());
        assert!(!upsert_job(&db, &job).await.unwrap());

        let count = db
            .collection::<Job>(COLLECTION)
            .count_documents(dedup_filter(&job))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    #[ignore] // Requer MongoDB rodando
    async fn test_create_job_twice_keeps_one_document() {
        let db = MongoDB::new("mongodb://localhost:27017/career_service_test").await.unwrap();
        let mut job = sample_job();
        job.job_title = "Posted Twice Engineer".into();
        let _ = db.collection::<Job>(COLLECTION).delete_many(dedup_filter(&job)).await;

        let first = create_job(&db, job.clone()).await.unwrap();
        let second = create_job(&db, job.clone()).await.unwrap();
        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.into_job().id, second.into_job().id);

        let count = db
            .collection::<Job>(COLLECTION)
            .count_documents(dedup_filter(&job))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
