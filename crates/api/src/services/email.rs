//! Email service for verification, welcome, and order notifications.
//!
//! Uses SMTP via lettre with Askama HTML templates. Delivery is
//! fire-and-forget from the caller's perspective: routes spawn sends in
//! the background and log failures, never surfacing them. Without SMTP
//! configuration the service logs each message instead of sending it.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use avoi_core::{Email, Price};

use crate::config::EmailConfig;

/// HTML template for the verification email.
#[derive(Template)]
#[template(path = "email/verification.html")]
struct VerificationEmailHtml<'a> {
    name: &'a str,
    verification_url: &'a str,
}

/// Plain text template for the verification email.
#[derive(Template)]
#[template(path = "email/verification.txt")]
struct VerificationEmailText<'a> {
    name: &'a str,
    verification_url: &'a str,
}

/// HTML template for the welcome email.
#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmailHtml<'a> {
    name: &'a str,
    shop_url: &'a str,
}

/// Plain text template for the welcome email.
#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeEmailText<'a> {
    name: &'a str,
    shop_url: &'a str,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    order_number: &'a str,
    total: String,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    name: &'a str,
    order_number: &'a str,
    total: String,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    /// `None` means log-only mode (no SMTP configured).
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
    base_url: String,
}

impl EmailService {
    /// Create an email service. Without SMTP configuration the service
    /// runs in log-only mode.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Smtp` if the SMTP transport fails to build.
    pub fn new(config: Option<&EmailConfig>, base_url: &str) -> Result<Self, EmailError> {
        let (mailer, from_address) = match config {
            Some(config) => {
                let credentials = Credentials::new(
                    config.smtp_user.clone(),
                    config.smtp_password.expose_secret().to_owned(),
                );
                let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
                    .port(config.smtp_port)
                    .credentials(credentials)
                    .build();
                (Some(mailer), config.from_address.clone())
            }
            None => (None, "noreply@avoi.com".to_owned()),
        };

        Ok(Self {
            mailer,
            from_address,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Send the email-verification message.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if rendering or delivery fails.
    pub async fn send_verification(
        &self,
        to: &Email,
        name: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let verification_url = format!(
            "{}/verify-email?token={token}&email={to}",
            self.base_url
        );

        let html = VerificationEmailHtml {
            name,
            verification_url: &verification_url,
        }
        .render()?;
        let text = VerificationEmailText {
            name,
            verification_url: &verification_url,
        }
        .render()?;

        self.send(to, "Welcome to AVOI - Please Verify Your Email", html, text)
            .await
    }

    /// Send the post-verification welcome message.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if rendering or delivery fails.
    pub async fn send_welcome(&self, to: &Email, name: &str) -> Result<(), EmailError> {
        let shop_url = format!("{}/products", self.base_url);

        let html = WelcomeEmailHtml {
            name,
            shop_url: &shop_url,
        }
        .render()?;
        let text = WelcomeEmailText {
            name,
            shop_url: &shop_url,
        }
        .render()?;

        self.send(to, "Welcome to AVOI - Your Account is Ready!", html, text)
            .await
    }

    /// Send the order confirmation message.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if rendering or delivery fails.
    pub async fn send_order_confirmation(
        &self,
        to: &Email,
        name: &str,
        order_number: &str,
        total: &Price,
    ) -> Result<(), EmailError> {
        let html = OrderConfirmationHtml {
            name,
            order_number,
            total: total.to_string(),
        }
        .render()?;
        let text = OrderConfirmationText {
            name,
            order_number,
            total: total.to_string(),
        }
        .render()?;

        self.send(
            to,
            &format!("AVOI Order Confirmation - {order_number}"),
            html,
            text,
        )
        .await
    }

    async fn send(
        &self,
        to: &Email,
        subject: &str,
        html: String,
        text: String,
    ) -> Result<(), EmailError> {
        let Some(mailer) = &self.mailer else {
            tracing::info!(to = %to, subject, "email (log-only, SMTP not configured)");
            return Ok(());
        };

        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?;
        let to_mailbox: Mailbox = to
            .as_str()
            .parse()
            .map_err(|_| EmailError::InvalidAddress(to.to_string()))?;

        let message = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))?;

        mailer.send(message).await?;
        tracing::debug!(to = %to, subject, "email sent");

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_template_includes_link() {
        let html = VerificationEmailHtml {
            name: "Amara",
            verification_url: "http://localhost:5001/verify-email?token=abc&email=a@b.c",
        }
        .render()
        .unwrap();

        assert!(html.contains("Hello Amara!"));
        assert!(html.contains("verify-email?token=abc"));
    }

    #[test]
    fn test_order_confirmation_template_includes_number_and_total() {
        let text = OrderConfirmationText {
            name: "Amara",
            order_number: "AVOI-20250807-9F2C41AB",
            total: "\u{20a6}18750.00".to_owned(),
        }
        .render()
        .unwrap();

        assert!(text.contains("AVOI-20250807-9F2C41AB"));
        assert!(text.contains("18750.00"));
    }

    #[tokio::test]
    async fn test_log_only_mode_send_succeeds() {
        let service = EmailService::new(None, "http://localhost:5001/").unwrap();
        let to = Email::parse("user@example.com").unwrap();

        service
            .send_verification(&to, "Test", "token123")
            .await
            .unwrap();
    }
}
