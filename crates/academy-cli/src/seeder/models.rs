use academy_models::{CategoryId, CourseLevel};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub struct CategorySeed {
    pub name: String,
    pub slug: String,
}

pub struct CourseSeed {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub level: CourseLevel,
    pub duration: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category_id: CategoryId,
}

pub struct StudentSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub linking_code: String,
}

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub categories: usize,
    pub courses_per_category: usize,
    pub students: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            categories: 5,
            courses_per_category: 4,
            students: 50,
        }
    }
}
