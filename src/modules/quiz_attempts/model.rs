pub use academy_models::quizzes::{
    CompleteAttemptRequest, CreateQuizAttemptDto, PaginatedQuizAttemptsResponse, QuizAttempt,
    QuizAttemptFilterParams, minutes_between,
};
