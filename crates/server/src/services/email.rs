//! Email service for sending verification codes.
//!
//! Uses SMTP via lettre for delivery. When no SMTP configuration is present
//! the service runs in console mode and logs the code instead of mailing it,
//! which keeps local development free of mail infrastructure.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

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
}

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    Smtp {
        mailer: AsyncSmtpTransport<Tokio1Executor>,
        from_address: String,
    },
    Console,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: Option<&EmailConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            tracing::warn!("no SMTP configuration, verification codes will be logged");
            return Ok(Self {
                inner: Inner::Console,
            });
        };

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            inner: Inner::Smtp {
                mailer,
                from_address: config.from_address.clone(),
            },
        })
    }

    /// Send an email verification code to a freshly registered user.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fails to build or send.
    pub async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let body = format!(
            "Welcome to MooStyle!\n\n\
             Your email verification code is: {code}\n\n\
             The code expires in 15 minutes. If you did not create an account,\n\
             you can ignore this message.\n"
        );

        self.send_text_email(to, "Your MooStyle Verification Code", &body)
            .await
    }

    async fn send_text_email(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let Inner::Smtp {
            mailer,
            from_address,
        } = &self.inner
        else {
            tracing::info!(to = %to, subject = %subject, body = %body, "console mail");
            return Ok(());
        };

        let email = Message::builder()
            .from(
                from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_mode_always_succeeds() {
        let service = EmailService::new(None).unwrap();
        service
            .send_verification_code("user@example.com", "123456")
            .await
            .unwrap();
    }
}
