use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use academy_core::PaginationMeta;
use academy_models::auth::{
    AuthResponse, EmailExistsResponse, EmailRequest, LoginRequest, MessageResponse,
    RefreshRequest, RegisterRequest, ResetPasswordRequest, TokenPair, VerifyOtpRequest,
};
use academy_models::courses::{
    Category, CategoryDto, Course, CourseDetail, CourseListItem, CreateCourseDto, CreateLessonDto,
    Lesson, PaginatedCategoriesResponse, PaginatedCoursesResponse, PaginatedLessonsResponse,
    UpdateCourseDto, UpdateLessonDto,
};
use academy_models::enrollments::{
    Bookmark, Certificate, CourseDetails, CreateBookmarkDto, CreateEnrollmentDto, CreateReviewDto,
    DropEnrollmentResponse, EnrollmentDetail, IssueCertificateDto, PaginatedBookmarksResponse,
    PaginatedCertificatesResponse, PaginatedEnrollmentsResponse, PaginatedReviewsResponse, Review,
    UpdateEnrollmentDto, UpdateReviewDto,
};
use academy_models::enums::{
    CourseLevel, CourseStatus, EnrollmentStatus, Gender, NotificationType, PaymentStatus,
    RecipientType, Relationship, UserRole,
};
use academy_models::notifications::{
    BulkNotificationDto, BulkNotificationResult, Notification, NotificationPreferences,
    PaginatedNotificationsResponse, PatchPreferencesDto, StatusResponse, UnreadCountResponse,
    UpdatePreferencesDto,
};
use academy_models::payments::{
    CallbackResponse, InitializePaymentDto, InitializedPayment, PaginatedPaymentsResponse,
    Payment, PaymentStatusData, VerifyPaymentDto,
};
use academy_models::quizzes::{
    CompleteAttemptRequest, CreateQuizAttemptDto, CreateQuizDto, PaginatedQuizAttemptsResponse,
    PaginatedQuizzesResponse, Quiz, QuizAttempt, UpdateQuizDto,
};
use academy_models::users::{
    ChildCourses, ChildrenCoursesResponse, LinkChildRequest, LinkChildResponse, Parent, Profile,
    ProfileDto, Student, StudentDetail, UpdateUserDto, UserDetail, UserSummary, UserWithProfile,
};

use crate::modules::auth::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::verify_otp,
        crate::modules::auth::controller::resend_otp,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::forget_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::auth::controller::check_email_exists,
        crate::modules::auth::controller::delete_account,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::refresh_token,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::link_child,
        crate::modules::users::controller::children_courses,
        crate::modules::categories::controller::get_categories,
        crate::modules::categories::controller::get_category,
        crate::modules::categories::controller::create_category,
        crate::modules::categories::controller::update_category,
        crate::modules::categories::controller::patch_category,
        crate::modules::categories::controller::delete_category,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::lessons::controller::get_lessons,
        crate::modules::lessons::controller::get_course_lessons,
        crate::modules::lessons::controller::get_lesson,
        crate::modules::lessons::controller::create_lesson,
        crate::modules::lessons::controller::create_course_lesson,
        crate::modules::lessons::controller::update_lesson,
        crate::modules::lessons::controller::delete_lesson,
        crate::modules::quizzes::controller::get_quizzes,
        crate::modules::quizzes::controller::get_lesson_quizzes,
        crate::modules::quizzes::controller::get_quiz,
        crate::modules::quizzes::controller::create_quiz,
        crate::modules::quizzes::controller::create_lesson_quiz,
        crate::modules::quizzes::controller::update_quiz,
        crate::modules::quizzes::controller::delete_quiz,
        crate::modules::quiz_attempts::controller::get_attempts,
        crate::modules::quiz_attempts::controller::get_quiz_attempts,
        crate::modules::quiz_attempts::controller::create_attempt,
        crate::modules::quiz_attempts::controller::create_quiz_attempt,
        crate::modules::quiz_attempts::controller::get_attempt,
        crate::modules::quiz_attempts::controller::complete_attempt,
        crate::modules::quiz_attempts::controller::delete_attempt,
        crate::modules::enrollments::controller::get_enrollments,
        crate::modules::enrollments::controller::get_course_enrollments,
        crate::modules::enrollments::controller::get_student_enrollments,
        crate::modules::enrollments::controller::my_enrollments,
        crate::modules::enrollments::controller::create_enrollment,
        crate::modules::enrollments::controller::create_course_enrollment,
        crate::modules::enrollments::controller::get_enrollment,
        crate::modules::enrollments::controller::update_enrollment,
        crate::modules::enrollments::controller::drop_enrollment,
        crate::modules::enrollments::controller::delete_enrollment,
        crate::modules::certificates::controller::get_certificates,
        crate::modules::certificates::controller::get_certificate,
        crate::modules::certificates::controller::issue_certificate,
        crate::modules::bookmarks::controller::get_bookmarks,
        crate::modules::bookmarks::controller::get_student_bookmarks,
        crate::modules::bookmarks::controller::create_bookmark,
        crate::modules::bookmarks::controller::get_bookmark,
        crate::modules::bookmarks::controller::delete_bookmark,
        crate::modules::reviews::controller::get_reviews,
        crate::modules::reviews::controller::get_course_reviews,
        crate::modules::reviews::controller::get_review,
        crate::modules::reviews::controller::create_review,
        crate::modules::reviews::controller::create_course_review,
        crate::modules::reviews::controller::update_review,
        crate::modules::reviews::controller::delete_review,
        crate::modules::notifications::controller::get_notifications,
        crate::modules::notifications::controller::get_notification,
        crate::modules::notifications::controller::unread_count,
        crate::modules::notifications::controller::mark_read,
        crate::modules::notifications::controller::mark_all_read,
        crate::modules::notifications::controller::delete_notification,
        crate::modules::notifications::controller::bulk_notify,
        crate::modules::notifications::controller::get_preferences,
        crate::modules::notifications::controller::update_preferences,
        crate::modules::notifications::controller::patch_preferences,
        crate::modules::payments::controller::get_payments,
        crate::modules::payments::controller::get_payment,
        crate::modules::payments::controller::initialize_payment,
        crate::modules::payments::controller::verify_payment,
        crate::modules::payments::controller::payment_callback,
        crate::modules::payments::webhook::paystack_webhook,
    ),
    components(
        schemas(
            ErrorResponse,
            PaginationMeta,
            UserRole,
            Gender,
            Relationship,
            CourseLevel,
            CourseStatus,
            EnrollmentStatus,
            NotificationType,
            RecipientType,
            PaymentStatus,
            RegisterRequest,
            VerifyOtpRequest,
            EmailRequest,
            LoginRequest,
            ResetPasswordRequest,
            RefreshRequest,
            TokenPair,
            AuthResponse,
            MessageResponse,
            EmailExistsResponse,
            UserDetail,
            UserSummary,
            UserWithProfile,
            Profile,
            ProfileDto,
            Student,
            StudentDetail,
            Parent,
            UpdateUserDto,
            LinkChildRequest,
            LinkChildResponse,
            ChildCourses,
            ChildrenCoursesResponse,
            Category,
            CategoryDto,
            PaginatedCategoriesResponse,
            Course,
            CourseDetail,
            CourseListItem,
            CreateCourseDto,
            UpdateCourseDto,
            PaginatedCoursesResponse,
            Lesson,
            CreateLessonDto,
            UpdateLessonDto,
            PaginatedLessonsResponse,
            Quiz,
            CreateQuizDto,
            UpdateQuizDto,
            PaginatedQuizzesResponse,
            QuizAttempt,
            CreateQuizAttemptDto,
            CompleteAttemptRequest,
            PaginatedQuizAttemptsResponse,
            CourseDetails,
            EnrollmentDetail,
            CreateEnrollmentDto,
            UpdateEnrollmentDto,
            DropEnrollmentResponse,
            PaginatedEnrollmentsResponse,
            Certificate,
            IssueCertificateDto,
            PaginatedCertificatesResponse,
            Bookmark,
            CreateBookmarkDto,
            PaginatedBookmarksResponse,
            Review,
            CreateReviewDto,
            UpdateReviewDto,
            PaginatedReviewsResponse,
            Notification,
            PaginatedNotificationsResponse,
            UnreadCountResponse,
            StatusResponse,
            BulkNotificationDto,
            BulkNotificationResult,
            NotificationPreferences,
            UpdatePreferencesDto,
            PatchPreferencesDto,
            Payment,
            InitializePaymentDto,
            InitializedPayment,
            VerifyPaymentDto,
            PaymentStatusData,
            CallbackResponse,
            PaginatedPaymentsResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, OTP verification and tokens"),
        (name = "Users", description = "User accounts and parent links"),
        (name = "Categories", description = "Course categories"),
        (name = "Courses", description = "Course catalogue"),
        (name = "Lessons", description = "Course lessons"),
        (name = "Quizzes", description = "Lesson quizzes"),
        (name = "Quiz Attempts", description = "Student quiz attempts"),
        (name = "Enrollments", description = "Course enrollments"),
        (name = "Certificates", description = "Completion certificates"),
        (name = "Bookmarks", description = "Bookmarked courses"),
        (name = "Reviews", description = "Course reviews"),
        (name = "Notifications", description = "In-app notifications and email preferences"),
        (name = "Payments", description = "Paystack checkout and webhooks")
    ),
    info(
        title = "IT360 Academy API",
        version = "0.1.0",
        description = "Learning platform backend: courses, enrollments, quizzes, payments and chat.",
        contact(
            name = "API Support",
            email = "support@it360academy.com"
        ),
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_feature() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/courses/{id}",
            "/api/enrollments/{id}/drop",
            "/api/quiz-attempts/{id}/complete",
            "/api/notifications/unread_count",
            "/api/payments/webhook",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let schemes = doc.components.as_ref().map(|c| &c.security_schemes);
        assert!(schemes.is_some_and(|s| s.contains_key("bearer_auth")));
    }
}
