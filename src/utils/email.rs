use lettre::message::{Mailbox, MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

use academy_config::EmailConfig;
use academy_core::AppError;
use academy_models::OtpPurpose;

use crate::metrics::track_email_sent;

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn otp_subject(purpose: OtpPurpose) -> &'static str {
        match purpose {
            OtpPurpose::Verification => "OTP Verification - IT360 Academy",
            OtpPurpose::PasswordReset => "Password Reset OTP - IT360 Academy",
        }
    }

    pub fn otp_body(purpose: OtpPurpose, code: &str) -> String {
        match purpose {
            OtpPurpose::Verification => format!(
                "Your IT360 Academy Registration OTP is: {}\n\n\
                 This code will expire in 10 minutes.\n\n\
                 If you did not request this code, please ignore this email.",
                code
            ),
            OtpPurpose::PasswordReset => format!(
                "Your IT360 Academy Password Reset OTP is: {}\n\n\
                 This code will expire in 15 minutes.\n\n\
                 If you did not request a password reset, please ignore this email.",
                code
            ),
        }
    }

    #[instrument(skip(self, code))]
    pub async fn send_otp(
        &self,
        to_email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), AppError> {
        let subject = Self::otp_subject(purpose);
        let text_body = Self::otp_body(purpose, code);
        self.send_email(to_email, subject, &text_body, None).await
    }

    /// Sends a notification as a plain text plus branded HTML message.
    #[instrument(skip(self, message))]
    pub async fn send_notification(
        &self,
        to_email: &str,
        to_name: &str,
        title: &str,
        message: &str,
        action_url: Option<&str>,
    ) -> Result<(), AppError> {
        let link = action_url.map(|path| format!("{}{}", self.config.frontend_url, path));
        let text_body = match &link {
            Some(link) => format!("Hi {},\n\n{}\n\n{}\n\nIT360 Academy", to_name, message, link),
            None => format!("Hi {},\n\n{}\n\nIT360 Academy", to_name, message),
        };
        let html_body = self.notification_template(to_name, title, message, link.as_deref());

        self.send_email(to_email, title, &text_body, Some(&html_body))
            .await
    }

    #[instrument(skip(self, text_body))]
    pub async fn send_custom(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
    ) -> Result<(), AppError> {
        self.send_email(to_email, subject, text_body, None).await
    }

    #[instrument(skip(self, text_body, html_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            info!(to = %to_email, subject = %subject, "SMTP disabled, email logged only");
            track_email_sent("logged");
            return Ok(());
        }

        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?;
        let to: Mailbox = to_email
            .parse()
            .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?;

        let builder = Message::builder().from(from).to(to).subject(subject);
        let email = match html_body {
            Some(html) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html.to_string()),
                    ),
            ),
            None => builder
                .header(header::ContentType::TEXT_PLAIN)
                .body(text_body.to_string()),
        }
        .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = self.transport()?;

        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?;

        match result {
            Ok(_) => {
                track_email_sent("sent");
                info!(to = %to_email, "Email sent");
                Ok(())
            }
            Err(e) => {
                track_email_sent("failed");
                Err(AppError::internal_error(format!("Failed to send email: {}", e)))
            }
        }
    }

    fn transport(&self) -> Result<SmtpTransport, AppError> {
        if self.config.smtp_username.is_empty() {
            return Ok(SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build());
        }

        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        Ok(SmtpTransport::starttls_relay(&self.config.smtp_host)
            .map_err(|e| AppError::internal_error(format!("Failed to create SMTP relay: {}", e)))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build())
    }

    fn notification_template(
        &self,
        name: &str,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> String {
        let button = link
            .map(|href| {
                format!(
                    r#"<p style="margin: 30px 0; text-align: center;"><a href="{}" style="display: inline-block; padding: 12px 32px; background-color: #0F766E; color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: bold;">View details</a></p>"#,
                    href
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif; background-color: #f1f5f9;">
    <table width="600" align="center" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px;">
        <tr>
            <td style="background-color: #0F766E; padding: 24px; text-align: center; color: #ffffff; font-size: 24px;">IT360 Academy</td>
        </tr>
        <tr>
            <td style="padding: 32px; color: #334155; font-size: 15px; line-height: 1.6;">
                <h2 style="margin-top: 0;">{title}</h2>
                <p>Hi <strong>{name}</strong>,</p>
                <p>{message}</p>
                {button}
            </td>
        </tr>
        <tr>
            <td style="padding: 16px; text-align: center; color: #94a3b8; font-size: 12px; border-top: 1px solid #e2e8f0;">
                You are receiving this because of your notification settings on IT360 Academy.
            </td>
        </tr>
    </table>
</body>
</html>"#,
            title = title,
            name = name,
            message = message,
            button = button,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EmailService {
        let mut config = EmailConfig::from_env();
        config.enabled = false;
        config.frontend_url = "https://app.it360academy.com".to_string();
        EmailService::new(config)
    }

    #[test]
    fn otp_copy_matches_purpose() {
        assert_eq!(
            EmailService::otp_subject(OtpPurpose::Verification),
            "OTP Verification - IT360 Academy"
        );
        let body = EmailService::otp_body(OtpPurpose::Verification, "123456");
        assert!(body.starts_with(
            "Your IT360 Academy Registration OTP is: 123456\n\nThis code will expire in 10 minutes."
        ));

        let body = EmailService::otp_body(OtpPurpose::PasswordReset, "654321");
        assert!(body.contains("654321"));
        assert!(body.contains("15 minutes"));
    }

    #[test]
    fn template_links_to_frontend() {
        let html = service().notification_template(
            "Ada",
            "Enrolled",
            "Welcome aboard",
            Some("https://app.it360academy.com/courses/1"),
        );
        assert!(html.contains("https://app.it360academy.com/courses/1"));
        assert!(html.contains("<strong>Ada</strong>"));
    }

    #[tokio::test]
    async fn disabled_smtp_succeeds_without_sending() {
        let result = service()
            .send_custom("ada@example.com", "Hello", "Just checking in")
            .await;
        assert!(result.is_ok());
    }
}
