//! Email service for outbound transactional mail.
//!
//! Uses SMTP via lettre. Messages are plain text; the only template is the
//! password-reset link.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use loomline_core::Email;

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
    InvalidAddress(#[from] lettre::address::AddressError),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the password-reset link.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the message cannot be built or dispatched.
    /// Callers are expected to roll back the pending reset token when this
    /// fails.
    pub async fn send_password_reset(
        &self,
        to: &Email,
        reset_url: &str,
    ) -> Result<(), EmailError> {
        let body = format!(
            "Someone requested a password reset for your Loomline account.\n\n\
             Copy and paste this link into your browser to choose a new password:\n\n\
             {reset_url}\n\n\
             The link expires in 20 minutes. If you did not request this, you can\n\
             ignore this email.\n"
        );

        let message = Message::builder()
            .from(self.from_address.parse::<Mailbox>()?)
            .to(to.as_str().parse::<Mailbox>()?)
            .subject("Loomline - password reset")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.mailer.send(message).await?;
        Ok(())
    }
}
