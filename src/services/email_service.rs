use std::env;

use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::utils::error::AppError;

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_NAME: &str = "Zenith";

pub const NOTIFICATION_SUBJECT: &str = "New Jobs Added - Check Them Out!";
const TEST_SUBJECT: &str = "Test Email";
const TEST_BODY: &str = "This is a test email to verify the email service is working.";

/// Envio de emails via SMTP (STARTTLS)
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
}

impl EmailService {
    /// Lê `SMTP_HOST`, `SMTP_PORT`, `EMAIL_USER`, `EMAIL_PASS`, `EMAIL_FROM_NAME`
    pub fn from_env() -> Result<Self, AppError> {
        let user = env::var("EMAIL_USER")
            .map_err(|_| AppError::Internal("EMAIL_USER not configured".to_string()))?;
        let pass = env::var("EMAIL_PASS")
            .map_err(|_| AppError::Internal("EMAIL_PASS not configured".to_string()))?;
        let host = env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string());
        let port = env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
            .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
            .port(port)
            .credentials(Credentials::new(user.clone(), pass))
            .build();

        Ok(Self {
            transport,
            from_email: user,
            from_name: env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| DEFAULT_FROM_NAME.to_string()),
        })
    }

    pub fn sender(&self) -> &str {
        &self.from_email
    }

    fn from_mailbox(&self) -> Result<Mailbox, AppError> {
        format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid sender address: {}", e)))
    }

    /// Envia o email de novidades de vagas; retorna o Message-ID
    pub async fn send_notification(&self, to: &str, text: &str) -> Result<String, AppError> {
        let to = parse_recipient(to)?;
        let message = Message::builder()
            .from(self.from_mailbox()?)
            .to(to)
            .subject(NOTIFICATION_SUBJECT)
            .multipart(MultiPart::alternative_plain_html(text.to_string(), notification_html(text)))
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.deliver(message).await
    }

    /// Email de teste para o próprio remetente
    pub async fn send_test(&self) -> Result<String, AppError> {
        let message = Message::builder()
            .from(self.from_mailbox()?)
            .to(parse_recipient(&self.from_email)?)
            .subject(TEST_SUBJECT)
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(TEST_BODY.to_string()),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.deliver(message).await
    }

    async fn deliver(&self, message: Message) -> Result<String, AppError> {
        let message_id = message
            .headers()
            .get_raw("Message-ID")
            .unwrap_or_default()
            .to_string();

        self.transport.send(message).await.map_err(|e| {
            log::error!("❌ SMTP send failed: {}", e);
            AppError::Internal(format!("Failed to send email: {}", e))
        })?;

        log::info!("📧 Email sent ({})", message_id);
        Ok(message_id)
    }
}

/// 400 para destinatário inválido
pub fn parse_recipient(address: &str) -> Result<Mailbox, AppError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|_| AppError::InvalidRequest(format!("Invalid email address: {}", address)))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn notification_html(text: &str) -> String {
    format!("<p>{}</p>", escape_html(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_html_escapes() {
        assert_eq!(notification_html("5 new jobs"), "<p>5 new jobs</p>");
        assert_eq!(
            notification_html("<script>alert('x')</script> & more"),
            "<p>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more</p>"
        );
    }

    #[test]
    fn test_parse_recipient() {
        assert!(parse_recipient("dev@example.com").is_ok());
        assert!(parse_recipient(" Dev <dev@example.com> ").is_ok());
        assert!(matches!(parse_recipient("not-an-email"), Err(AppError::InvalidRequest(_))));
    }
}
