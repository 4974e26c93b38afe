pub use academy_models::enrollments::{
    Certificate, IssueCertificateDto, PaginatedCertificatesResponse,
};
