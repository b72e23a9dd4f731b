use actix_web::{web, HttpResponse, ResponseError};
use serde::Deserialize;

use crate::services::email_service::EmailService;
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub text: String,
}

fn validate(request: &SendEmailRequest) -> Result<(), AppError> {
    if request.email.trim().is_empty() || request.text.trim().is_empty() {
        return Err(AppError::InvalidRequest("Email and text are required".to_string()));
    }
    Ok(())
}

pub async fn send_email(request: web::Json<SendEmailRequest>) -> HttpResponse {
    if let Err(e) = validate(&request) {
        return e.error_response();
    }

    let service = match EmailService::from_env() {
        Ok(service) => service,
        Err(e) => {
            log::error!("❌ Email service unavailable: {}", e);
            return e.error_response();
        }
    };

    match service.send_notification(&request.email, &request.text).await {
        Ok(message_id) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Email sent successfully",
            "messageId": message_id
        })),
        Err(e) => e.error_response(),
    }
}

pub async fn test_email() -> HttpResponse {
    let service = match EmailService::from_env() {
        Ok(service) => service,
        Err(e) => {
            log::error!("❌ Email service unavailable: {}", e);
            return e.error_response();
        }
    };

    match service.send_test().await {
        Ok(message_id) => {
            log::info!("📧 Test email sent to {}", service.sender());
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Test email sent successfully",
                "messageId": message_id
            }))
        }
        Err(e) => e.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_send_email_requires_fields() {
        let app = test::init_service(App::new().route("/sendEmail", web::post().to(send_email))).await;

        let req = test::TestRequest::post()
            .uri("/sendEmail")
            .set_json(serde_json::json!({ "email": "dev@example.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Email and text are required");
    }
}
