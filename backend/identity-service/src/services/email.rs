/// Outbound email: SMTP via lettre, or a no-op sender that only logs
use crate::config::EmailSettings;
use crate::error::{IdentityError, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// Email collaborator used by the identity flows
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

/// Build the configured sender; an empty SMTP host selects no-op mode
pub fn build_email_sender(settings: &EmailSettings) -> Result<Arc<dyn EmailSender>> {
    if settings.smtp_host.trim().is_empty() {
        warn!("SMTP host not configured; email service will operate in no-op mode");
        return Ok(Arc::new(NoopEmailSender));
    }
    Ok(Arc::new(SmtpEmailSender::new(settings)?))
}

/// SMTP transport wrapper
#[derive(Clone)]
pub struct SmtpEmailSender {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: &EmailSettings) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| IdentityError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let builder = if config.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        }
        .map_err(|e| IdentityError::Internal(format!("Failed to configure SMTP transport: {}", e)))?
        .port(config.smtp_port);

        let builder = if let (Some(username), Some(password)) =
            (&config.smtp_username, &config.smtp_password)
        {
            builder.credentials(Credentials::new(username.to_string(), password.to_string()))
        } else {
            builder
        };

        Ok(Self {
            transport: Arc::new(builder.build()),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| IdentityError::Email(format!("Invalid recipient email address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(strip_tags(html_body)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| IdentityError::Email(format!("Failed to build email message: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| IdentityError::Email(format!("Failed to send email: {}", e)))?;
        info!(subject, "email sent successfully");
        Ok(())
    }
}

/// Logs instead of sending
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmailSender;

#[async_trait]
impl EmailSender for NoopEmailSender {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<()> {
        info!(
            subject,
            recipient = to,
            "Email service running in no-op mode; skipping actual send"
        );
        Ok(())
    }
}

/// Plain-text fallback for the HTML part
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

/// Link and message templates for the identity emails
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    base_url: String,
}

impl EmailTemplates {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn confirmation_link(&self, token: &str) -> String {
        format!("{}/api/auth/confirm-email?token={}", self.base_url, token)
    }

    pub fn password_reset_link(&self, token: &str) -> String {
        format!("{}/api/auth/reset-password?token={}", self.base_url, token)
    }

    /// (subject, html body)
    pub fn confirmation_email(&self, greeting_name: &str, token: &str) -> (&'static str, String) {
        let link = self.confirmation_link(token);
        (
            "Confirm your email",
            format!(
                "<p>Hi {},</p><p>Confirm your email: <a href=\"{}\">Activate Account</a></p>\
                 <p>This link expires in 24 hours.</p>",
                html_escape(greeting_name),
                link
            ),
        )
    }

    pub fn password_reset_email(&self, token: &str) -> (&'static str, String) {
        let link = self.password_reset_link(token);
        (
            "Reset your password",
            format!(
                "<p>Reset it <a href=\"{}\">here</a>.</p>\
                 <p>This link expires in 2 hours. If you did not request this, ignore this email.</p>",
                link
            ),
        )
    }
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
