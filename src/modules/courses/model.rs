pub use academy_models::courses::{
    Course, CourseDetail, CourseFilterParams, CourseListItem, CreateCourseDto,
    PaginatedCoursesResponse, UpdateCourseDto,
};
