use mongodb::bson::{doc, DateTime as BsonDateTime};

use crate::{
    database::MongoDB,
    models::{Job, User},
    services::{job_service, user_service},
    utils::error::AppError,
};

/// Adiciona uma vaga à wishlist do usuário
///
/// `$addToSet` com filtro `wishlist: { $ne: id }` torna a operação atômica:
/// se nada casar, ou o usuário não existe ou a vaga já estava na lista.
pub async fn add(db: &MongoDB, uid: &str, job_id: &str) -> Result<(), AppError> {
    let job = job_service::get_job(db, job_id).await?;
    let job_oid = job
        .id
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let users = db.collection::<User>(user_service::COLLECTION);
    let result = users
        .update_one(
            doc! { "firebaseUid": uid, "wishlist": { "$ne": job_oid } },
            doc! { "$addToSet": { "wishlist": job_oid }, "$set": { "updatedAt": BsonDateTime::now() } },
        )
        .await?;

    let user_exists = if result.matched_count > 0 {
        true
    } else {
        // Distingue usuário inexistente de duplicata
        users.count_documents(doc! { "firebaseUid": uid }).await? > 0
    };
    add_outcome(result.matched_count, user_exists)?;

    log::info!("💖 Job {} added to wishlist of {}", job_id, uid);
    Ok(())
}

/// Interpreta o update condicional de `add`
pub fn add_outcome(matched_count: u64, user_exists: bool) -> Result<(), AppError> {
    match (matched_count, user_exists) {
        (n, _) if n > 0 => Ok(()),
        (_, false) => Err(AppError::NotFound("User not found".to_string())),
        (_, true) => Err(AppError::Conflict("Job already in wishlist".to_string())),
    }
}

pub async fn remove(db: &MongoDB, uid: &str, job_id: &str) -> Result<(), AppError> {
    let job_oid = job_service::parse_job_id(job_id)?;

    let result = db
        .collection::<User>(user_service::COLLECTION)
        .update_one(
            doc! { "firebaseUid": uid },
            doc! { "$pull": { "wishlist": job_oid }, "$set": { "updatedAt": BsonDateTime::now() } },
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}

/// Vagas da wishlist, na ordem em que foram adicionadas
///
/// Referências para vagas já removidas (limpeza por idade) são ignoradas.
pub async fn list(db: &MongoDB, uid: &str) -> Result<Vec<Job>, AppError> {
    let user = user_service::find_by_uid(db, uid).await?;
    let jobs = job_service::jobs_by_ids(db, &user.wishlist).await?;
    Ok(order_like(&user.wishlist, jobs))
}

fn order_like(ids: &[mongodb::bson::oid::ObjectId], mut jobs: Vec<Job>) -> Vec<Job> {
    jobs.sort_by_key(|job| {
        job.id
            .and_then(|id| ids.iter().position(|wanted| *wanted == id))
            .unwrap_or(usize::MAX)
    });
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn job_with_id(id: ObjectId) -> Job {
        Job {
            id: Some(id),
            company_name: "Acme".into(),
            job_title: id.to_hex(),
            job_description: String::new(),
            required_skills: vec![],
            experience_level: String::new(),
            education_requirements: String::new(),
            stipend: None,
            salary: String::new(),
            location: String::new(),
            job_type: String::new(),
            benefits: vec![],
            application_deadline: BsonDateTime::now(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_order_like_follows_wishlist_order() {
        let (a, b, c) = (ObjectId::new(), ObjectId::new(), ObjectId::new());
        let jobs = vec![job_with_id(c), job_with_id(a), job_with_id(b)];
        let ordered = order_like(&[a, b, c], jobs);
        let ids: Vec<ObjectId> = ordered.iter().filter_map(|j| j.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_add_outcome() {
        assert!(add_outcome(1, true).is_ok());

        let duplicate = add_outcome(0, true).unwrap_err();
        assert!(matches!(duplicate, AppError::Conflict(_)));
        assert_eq!(duplicate.message(), "Job already in wishlist");
        assert_eq!(
            actix_web::ResponseError::status_code(&duplicate),
            actix_web::http::StatusCode::BAD_REQUEST
        );

        assert!(matches!(add_outcome(0, false), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    #[ignore] // Requer MongoDB rodando
    async fn test_duplicate_add_is_rejected() {
        let db = MongoDB::new("mongodb://localhost:27017/career_service_test").await.unwrap();
        let job = job_service::create_job(&db, job_with_id(ObjectId::new())).await.unwrap().into_job();
        let job_id = job.id.unwrap().to_hex();

        let auth = crate::middleware::auth::AuthUser {
            uid: "wishlist-test-uid".into(),
            email: Some("wishlist@test.dev".into()),
            name: None,
            phone_number: None,
        };
        user_service::upsert_from_firebase(&db, &auth).await.unwrap();

        add(&db, &auth.uid, &job_id).await.unwrap();
        assert!(matches!(add(&db, &auth.uid, &job_id).await, Err(AppError::Conflict(_))));
        assert!(matches!(add(&db, "missing-uid", &job_id).await, Err(AppError::NotFound(_))));

        remove(&db, &auth.uid, &job_id).await.unwrap();
    }
}
