pub use academy_models::courses::{
    Category, CategoryDto, CategoryFilterParams, CategoryOrdering, PaginatedCategoriesResponse,
};
