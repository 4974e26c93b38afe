use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use academy_core::text::random_code;
use academy_core::{AppError, PaginationMeta, PaginationParams};
use academy_models::{CertificateId, NotificationType, RecipientType, UserId};

use crate::modules::certificates::model::{
    Certificate, IssueCertificateDto, PaginatedCertificatesResponse,
};
use crate::modules::courses::service::CourseService;
use crate::modules::notifications::model::NewNotification;
use crate::modules::users::service::UserService;

const CERTIFICATE_SELECT: &str = r#"SELECT
        ce.id, ce.user_id, ce.course_id, ce.certificate_id, ce.issued_at, ce.certificate_url,
        c.title AS course_title
    FROM certificates ce
    JOIN courses c ON c.id = ce.course_id"#;

/// Public certificate number, e.g. `CERT-7QK2M9XA1B`.
pub fn new_certificate_number() -> String {
    format!("CERT-{}", random_code(10))
}

pub fn certificate_notification(certificate: &Certificate) -> NewNotification {
    NewNotification {
        user_id: certificate.user_id,
        recipient_type: RecipientType::Student,
        notification_type: NotificationType::Certificate,
        title: format!("Certificate issued for {}", certificate.course_title),
        message: format!(
            "Congratulations! Your certificate {} for {} is ready.",
            certificate.certificate_id, certificate.course_title
        ),
        action_url: Some(format!("/certificates/{}", certificate.id)),
        related_object_id: Some(certificate.id.into_inner()),
        related_object_type: Some("certificate".to_string()),
    }
}

pub struct CertificateService;

impl CertificateService {
    #[instrument(skip(db, dto))]
    pub async fn issue_certificate(
        db: &PgPool,
        dto: IssueCertificateDto,
    ) -> Result<Certificate, AppError> {
        UserService::get_user(db, dto.user_id).await?;
        CourseService::get_course(db, dto.course_id).await?;

        let id: CertificateId = sqlx::query_scalar(
            "INSERT INTO certificates (user_id, course_id, certificate_id, certificate_url)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(dto.user_id)
        .bind(dto.course_id)
        .bind(new_certificate_number())
        .bind(&dto.certificate_url)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::invalid(
                    "A certificate has already been issued for this course.",
                );
            }
            AppError::database(e)
        })?;

        Self::get_certificate(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_certificate(db: &PgPool, id: CertificateId) -> Result<Certificate, AppError> {
        sqlx::query_as::<_, Certificate>(&format!("{} WHERE ce.id = $1", CERTIFICATE_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Certificate not found")))
    }

    /// Newest first. `owner` of `None` lists every certificate.
    #[instrument(skip(db))]
    pub async fn get_certificates(
        db: &PgPool,
        owner: Option<UserId>,
        pagination: PaginationParams,
    ) -> Result<PaginatedCertificatesResponse, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM certificates WHERE ($1::uuid IS NULL OR user_id = $1)",
        )
        .bind(owner)
        .fetch_one(db)
        .await?;

        let certificates = sqlx::query_as::<_, Certificate>(&format!(
            "{} WHERE ($1::uuid IS NULL OR ce.user_id = $1) ORDER BY ce.issued_at DESC{}",
            CERTIFICATE_SELECT,
            pagination.sql_suffix()
        ))
        .bind(owner)
        .fetch_all(db)
        .await?;

        Ok(PaginatedCertificatesResponse {
            data: certificates,
            meta: PaginationMeta::new(total, &pagination),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_models::CourseId;
    use chrono::Utc;

    #[test]
    fn certificate_number_shape() {
        let number = new_certificate_number();
        assert_eq!(number.len(), 15);
        let suffix = number.strip_prefix("CERT-").unwrap();
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
        assert_ne!(new_certificate_number(), new_certificate_number());
    }

    #[test]
    fn notification_names_the_course() {
        let certificate = Certificate {
            id: CertificateId::new(),
            user_id: UserId::new(),
            course_id: CourseId::new(),
            certificate_id: "CERT-ABCDE12345".to_string(),
            issued_at: Utc::now(),
            certificate_url: String::new(),
            course_title: "Intro to Rust".to_string(),
        };
        let new = certificate_notification(&certificate);
        assert_eq!(new.notification_type, NotificationType::Certificate);
        assert_eq!(new.user_id, certificate.user_id);
        assert!(new.message.contains("CERT-ABCDE12345"));
        assert_eq!(new.title, "Certificate issued for Intro to Rust");
    }
}
