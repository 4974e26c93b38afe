pub use academy_models::enrollments::{
    CreateReviewDto, PaginatedReviewsResponse, Review, UpdateReviewDto,
};
