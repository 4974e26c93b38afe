//! Fake data for local development.
//!
//! Generation runs on rayon; inserts go through one transaction per entity
//! kind with multi-row `INSERT`s.

mod catalogue;
mod models;
mod students;

pub use catalogue::{seed_categories, seed_courses};
pub use models::{CategorySeed, CourseSeed, SeedConfig, StudentSeed};
pub use students::{generate_students, seed_students};

use sqlx::PgPool;
use std::time::Instant;

use crate::CliResult;

/// Password given to every seeded student.
pub const SEED_PASSWORD: &str = "password123";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub courses: usize,
    pub students: usize,
}

pub async fn seed_all(db: &PgPool, config: &SeedConfig) -> CliResult<SeedSummary> {
    let started = Instant::now();
    println!("🌱 Seeding database...");

    let category_ids = seed_categories(db, config.categories).await?;
    let course_ids = seed_courses(db, &category_ids, config.courses_per_category).await?;
    let student_ids = seed_students(db, config.students).await?;

    println!("✅ Done in {:?}", started.elapsed());

    Ok(SeedSummary {
        categories: category_ids.len(),
        courses: course_ids.len(),
        students: student_ids.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn seeds_requested_counts(pool: PgPool) {
        let config = SeedConfig {
            categories: 2,
            courses_per_category: 3,
            students: 4,
        };
        let summary = seed_all(&pool, &config).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                categories: 2,
                courses: 6,
                students: 4
            }
        );

        let linking_codes: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT linking_code) FROM students")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(linking_codes, 4);
    }
}
