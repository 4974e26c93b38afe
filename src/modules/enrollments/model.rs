pub use academy_models::enrollments::{
    CourseDetails, CreateEnrollmentDto, DropEnrollmentResponse, EnrollmentDetail,
    EnrollmentFilterParams, EnrollmentRow, PaginatedEnrollmentsResponse, UpdateEnrollmentDto,
};
