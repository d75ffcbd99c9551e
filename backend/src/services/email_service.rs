//! Outgoing mail for the account flows.
//!
//! `SmtpMailer` relays through `lettre` when SMTP is configured; otherwise
//! `LogMailer` writes the activation link to the log so a local tracker can
//! still be activated by hand.

use crate::config::EmailConfig;
use crate::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;

/// Delivers the activation link to a newly registered user.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_activation_email(
        &self,
        recipient_email: &str,
        username: &str,
        activation_url: &str,
    ) -> ServiceResult<()>;
}

/// Builds the activation link mailed to the user.
pub fn activation_url(base_url: &str, secret: &str) -> String {
    format!("{}/account/activate/{}", base_url.trim_end_matches('/'), secret)
}

pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl SmtpMailer {
    /// Creates a new SmtpMailer instance
    pub fn new(config: EmailConfig) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, config })
    }

    /// Sends a multipart text/HTML email
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::validation(format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| ServiceError::validation(format!("Invalid recipient email: {e}")))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_content.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_content.to_string()),
                    ),
            )
            .map_err(|e| ServiceError::validation(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| ServiceError::external_service(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_activation_email(
        &self,
        recipient_email: &str,
        username: &str,
        activation_url: &str,
    ) -> ServiceResult<()> {
        let subject = "Activate your tracker account";
        let html_content = build_activation_html(username, activation_url);
        let text_content = build_activation_text(username, activation_url);

        self.send_email(recipient_email, subject, &html_content, &text_content)
            .await
    }
}

/// Mailer used when no SMTP relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_activation_email(
        &self,
        recipient_email: &str,
        username: &str,
        activation_url: &str,
    ) -> ServiceResult<()> {
        tracing::info!(
            recipient = recipient_email,
            username,
            activation_url,
            "SMTP not configured, activation link not mailed"
        );
        Ok(())
    }
}

fn build_activation_html(username: &str, activation_url: &str) -> String {
    format!(
        r#"
        <!DOCTYPE html>
        <html>
        <head>
            <meta charset="UTF-8">
            <title>Activate your account</title>
        </head>
        <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
            <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                <h2 style="color: #2c3e50;">Welcome, {username}!</h2>

                <p>Thanks for registering. Follow the link below to activate your account:</p>

                <div style="text-align: center; margin: 30px 0;">
                    <a href="{activation_url}"
                       style="background-color: #3498db; color: white; padding: 12px 30px;
                              text-decoration: none; border-radius: 5px; display: inline-block;">
                        Activate Account
                    </a>
                </div>

                <p>Or copy and paste this link into your browser:</p>
                <p style="word-break: break-all; color: #7f8c8d;">{activation_url}</p>

                <hr style="border: none; border-top: 1px solid #ecf0f1; margin: 30px 0;">

                <p style="font-size: 12px; color: #7f8c8d;">
                    If you did not register, you can safely ignore this email.
                </p>
            </div>
        </body>
        </html>
        "#
    )
}

fn build_activation_text(username: &str, activation_url: &str) -> String {
    format!(
        r#"Welcome, {username}!

Thanks for registering. Follow the link below to activate your account:
{activation_url}

If you did not register, you can safely ignore this email.
"#
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_url_trims_trailing_slash() {
        assert_eq!(
            activation_url("https://tracker.test/", "abc123"),
            "https://tracker.test/account/activate/abc123"
        );
    }

    #[test]
    fn test_activation_bodies_contain_link() {
        let url = "https://tracker.test/account/activate/abc123";
        assert!(build_activation_html("alice", url).contains(url));
        assert!(build_activation_text("alice", url).contains("Welcome, alice!"));
    }
}
