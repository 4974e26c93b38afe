pub use academy_models::enrollments::{Bookmark, CreateBookmarkDto, PaginatedBookmarksResponse};
