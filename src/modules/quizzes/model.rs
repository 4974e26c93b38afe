pub use academy_models::quizzes::{
    CreateQuizDto, PaginatedQuizzesResponse, Quiz, QuizFilterParams, UpdateQuizDto,
};
