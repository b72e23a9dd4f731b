use actix_multipart::Multipart;
use actix_web::{http::header::CONTENT_TYPE, web, HttpRequest, HttpResponse, ResponseError};
use futures::StreamExt;

use crate::database::MongoDB;
use crate::middleware::auth::AuthUser;
use crate::models::{InterviewQuestionsRequest, InterviewSubmission};
use crate::services::{interview_service, user_service};
use crate::utils::error::AppError;

const MAX_SUBMISSION_BYTES: usize = 10 * 1024 * 1024;
const SUBMISSION_FIELD: &str = "interviewData";

pub async fn generate_questions(request: web::Json<InterviewQuestionsRequest>) -> HttpResponse {
    match interview_service::generate_questions(&request).await {
        Ok(questions) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "questions": questions
        })),
        Err(e) => e.error_response(),
    }
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn parse_submission(bytes: &[u8]) -> Result<InterviewSubmission, AppError> {
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid interview data: {}", e)))
}

/// Lê o formulário: `interviewData` (JSON) + partes de mídia, que só são contadas
async fn read_multipart(mut form: Multipart) -> Result<(InterviewSubmission, usize), AppError> {
    let mut data: Option<Vec<u8>> = None;
    let mut media_files = 0;

    while let Some(field) = form.next().await {
        let mut field = field.map_err(|e| AppError::InvalidRequest(format!("Invalid multipart body: {}", e)))?;
        let is_data = field.name() == Some(SUBMISSION_FIELD);

        let mut buffer = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidRequest(format!("Invalid multipart body: {}", e)))?;
            if is_data {
                if buffer.len() + chunk.len() > MAX_SUBMISSION_BYTES {
                    return Err(AppError::InvalidRequest("Interview data too large".to_string()));
                }
                buffer.extend_from_slice(&chunk);
            }
        }

        if is_data {
            data = Some(buffer);
        } else {
            media_files += 1;
        }
    }

    let data = data.ok_or_else(|| AppError::InvalidRequest("Missing interviewData field".to_string()))?;
    Ok((parse_submission(&data)?, media_files))
}

async fn read_json(mut payload: web::Payload) -> Result<InterviewSubmission, AppError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidRequest(format!("Invalid body: {}", e)))?;
        if body.len() + chunk.len() > MAX_SUBMISSION_BYTES {
            return Err(AppError::InvalidRequest("Interview data too large".to_string()));
        }
        body.extend_from_slice(&chunk);
    }
    parse_submission(&body)
}

/// Recebe a entrevista finalizada (JSON ou multipart) e devolve o feedback
pub async fn submit_interview(
    req: HttpRequest,
    payload: web::Payload,
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthUser>>,
) -> HttpResponse {
    let parsed = if is_multipart(&req) {
        read_multipart(Multipart::new(req.headers(), payload)).await
    } else {
        read_json(payload).await.map(|submission| (submission, 0))
    };

    let (submission, media_files) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return e.error_response(),
    };

    let report = interview_service::analyze_submission(&submission, media_files).await;

    if let Some(user) = user {
        if let Err(e) = user_service::increment_interview_prep(&db, &user.uid).await {
            log::warn!("⚠️  Could not update interview count for {}: {}", user.uid, e);
        }
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "feedback": report.feedback,
        "analysis": report.analysis,
        "interviewSummary": report.interview_summary
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_question_failure_is_500_with_message() {
        std::env::remove_var("GROQ_API_KEY");
        let app = test::init_service(
            App::new().route("/api/interview/questions", web::post().to(generate_questions)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/interview/questions")
            .set_json(serde_json::json!({ "job": { "job_title": "Backend Engineer" } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Failed to generate questions");
    }

    #[::core::prelude::v1::test]
    fn test_parse_submission_rejects_bad_json() {
        assert!(matches!(parse_submission(b"{not json"), Err(AppError::InvalidRequest(_))));
        let ok = parse_submission(br#"{"questions": ["Q1"], "totalTime": 60}"#).unwrap();
        assert_eq!(ok.questions.len(), 1);
    }

    #[actix_web::test]
    async fn test_multipart_without_interview_data_is_rejected() {
        let app = test::init_service(
            App::new().route(
                "/submit",
                web::post().to(|req: HttpRequest, payload: web::Payload| async move {
                    match read_multipart(Multipart::new(req.headers(), payload)).await {
                        Ok((_, media)) => HttpResponse::Ok().body(media.to_string()),
                        Err(e) => e.error_response(),
                    }
                }),
            ),
        )
        .await;

        let body = "--BOUNDARY\r\n\
Content-Disposition: form-data; name=\"media\"; filename=\"q1.webm\"\r\n\
Content-Type: video/webm\r\n\r\n\
binary\r\n\
--BOUNDARY--\r\n";
        let req = test::TestRequest::post()
            .uri("/submit")
            .insert_header((CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY"))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_multipart_counts_media_parts() {
        let app = test::init_service(
            App::new().route(
                "/submit",
                web::post().to(|req: HttpRequest, payload: web::Payload| async move {
                    match read_multipart(Multipart::new(req.headers(), payload)).await {
                        Ok((submission, media)) => {
                            HttpResponse::Ok().body(format!("{}:{}", submission.questions.len(), media))
                        }
                        Err(e) => e.error_response(),
                    }
                }),
            ),
        )
        .await;

        let body = "--BOUNDARY\r\n\
Content-Disposition: form-data; name=\"interviewData\"\r\n\r\n\
{\"questions\": [\"Q1\", \"Q2\"], \"totalTime\": 90}\r\n\
--BOUNDARY\r\n\
Content-Disposition: form-data; name=\"media\"; filename=\"q1.webm\"\r\n\
Content-Type: video/webm\r\n\r\n\
binary\r\n\
--BOUNDARY--\r\n";
        let req = test::TestRequest::post()
            .uri("/submit")
            .insert_header((CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY"))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "2:1");
    }
}
