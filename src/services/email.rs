//! Email service for verification, password and email-change notifications
//!
//! All sends are fire-and-forget from the callers' perspective: a failed
//! send is logged and must never roll back state that already committed.

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use rand::Rng;
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::user::User,
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Generate a 6-digit one-time code
    pub fn generate_otp(&self) -> String {
        let mut rng = rand::thread_rng();
        format!("{:06}", rng.gen_range(0..1_000_000))
    }

    /// Send the account verification email after signup
    pub async fn send_verification_email(&self, to: &str, user: &User) -> AppResult<()> {
        let name = user.firstname.as_deref().unwrap_or("there");
        let token = user.verification_token.as_deref().unwrap_or_default();
        let subject = "Verify your Librarium account";
        let body = format!(
            r#"
Hi {name},

Welcome to Librarium. Please verify your email address by submitting the
token below:

{token}

If you didn't create this account, please ignore this email.
"#,
            name = name,
            token = token
        );

        self.send_email(to, subject, &body).await
    }

    /// Send the reset-password email
    pub async fn send_reset_password_email(&self, to: &str) -> AppResult<()> {
        let subject = "Reset your Librarium password";
        let body = r#"
A password reset was requested for your Librarium account.

If this was you, submit a new password through the reset endpoint.
If you didn't request this, please ignore this email.
"#;

        self.send_email(to, subject, body).await
    }

    /// Notify that the account password was changed
    pub async fn send_change_password_email(&self, to: &str) -> AppResult<()> {
        let subject = "Your Librarium password was changed";
        let body = r#"
The password for your Librarium account has just been changed.

If this wasn't you, please contact support immediately.
"#;

        self.send_email(to, subject, body).await
    }

    /// Send the email-change OTP to the old address
    pub async fn send_change_email(&self, to: &str, otp: &str) -> AppResult<()> {
        let subject = "Confirm your Librarium email change";
        let body = format!(
            r#"
A change of email address was requested for your Librarium account.

Your one-time confirmation code is: {otp}

This code can only be used once. If you didn't request this change,
please contact support immediately.
"#,
            otp = otp
        );

        self.send_email(to, subject, &body).await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Librarium");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            // Use STARTTLS for secure connection
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) = (
            &self.config.smtp_username,
            &self.config.smtp_password,
        ) {
            mailer_builder.credentials(Credentials::new(
                username.clone(),
                password.clone(),
            ))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        mailer
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        let service = EmailService::new(EmailConfig::default());
        for _ in 0..100 {
            let otp = service.generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
