use academy_core::text::slugify;
use academy_models::{CategoryId, CourseId, CourseLevel, CourseStatus};
use chrono::{Duration, Utc};
use fake::Fake;
use fake::faker::company::en::Industry;
use fake::faker::lorem::en::{Paragraphs, Words};
use rayon::prelude::*;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::time::Instant;

use super::models::{CategorySeed, CourseSeed};
use crate::CliResult;

const LEVELS: [CourseLevel; 3] = [
    CourseLevel::Beginner,
    CourseLevel::Intermediate,
    CourseLevel::Advanced,
];

pub fn generate_categories(count: usize) -> Vec<CategorySeed> {
    (0..count)
        .map(|idx| {
            let name: String = Industry().fake();
            // suffix keeps slugs unique when faker repeats itself
            let slug = format!("{}-{}", slugify(&name), idx + 1);
            CategorySeed { name, slug }
        })
        .collect()
}

pub fn generate_courses(category_ids: &[CategoryId], per_category: usize) -> Vec<CourseSeed> {
    let today = Utc::now().date_naive();

    category_ids
        .par_iter()
        .enumerate()
        .flat_map(|(cat_idx, &category_id)| {
            (0..per_category)
                .map(|idx| {
                    let words: Vec<String> = Words(2..5).fake();
                    let title = capitalize(&words.join(" "));
                    let slug = format!("{}-{}-{}", slugify(&title), cat_idx + 1, idx + 1);
                    let paragraphs: Vec<String> = Paragraphs(2..4).fake();
                    let kobo: i64 = (100_000..5_000_000).fake();
                    let weeks: i64 = (4..16).fake();

                    CourseSeed {
                        title,
                        slug,
                        description: paragraphs.join("\n\n"),
                        price: Decimal::new(kobo, 2),
                        level: LEVELS[idx % LEVELS.len()],
                        duration: (60..1200).fake(),
                        start_date: today,
                        end_date: today + Duration::weeks(weeks),
                        category_id,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn seed_categories(db: &PgPool, count: usize) -> CliResult<Vec<CategoryId>> {
    let started = Instant::now();
    println!("🗂  Seeding {} categories...", count);

    let seeds = generate_categories(count);
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(seeds.len());

    for seed in &seeds {
        let id = sqlx::query_scalar::<_, CategoryId>(
            "INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id",
        )
        .bind(&seed.name)
        .bind(&seed.slug)
        .fetch_one(&mut *tx)
        .await?;
        ids.push(id);
    }

    tx.commit().await?;
    println!("   ✓ Inserted {} categories in {:?}", ids.len(), started.elapsed());
    Ok(ids)
}

pub async fn seed_courses(
    db: &PgPool,
    category_ids: &[CategoryId],
    per_category: usize,
) -> CliResult<Vec<CourseId>> {
    let started = Instant::now();
    let seeds = generate_courses(category_ids, per_category);
    println!("📚 Seeding {} courses...", seeds.len());

    if seeds.is_empty() {
        return Ok(Vec::new());
    }

    // 9 params per course
    const BATCH_SIZE: usize = 500;
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(seeds.len());

    for chunk in seeds.chunks(BATCH_SIZE) {
        let mut query = String::from(
            "INSERT INTO courses (title, slug, description, price, level, duration, start_date, end_date, category_id, is_published, status) VALUES ",
        );
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            let p = i * 9;
            query.push_str(&format!(
                "(${}, ${}, ${}, ${}, ${}, ${}, ${}, ${}, ${}, TRUE, '{}')",
                p + 1,
                p + 2,
                p + 3,
                p + 4,
                p + 5,
                p + 6,
                p + 7,
                p + 8,
                p + 9,
                CourseStatus::Active.as_str()
            ));
        }
        query.push_str(" RETURNING id");

        let mut q = sqlx::query_scalar::<_, CourseId>(&query);
        for course in chunk {
            q = q
                .bind(&course.title)
                .bind(&course.slug)
                .bind(&course.description)
                .bind(course.price)
                .bind(course.level)
                .bind(course.duration)
                .bind(course.start_date)
                .bind(course.end_date)
                .bind(course.category_id);
        }
        ids.extend(q.fetch_all(&mut *tx).await?);
    }

    tx.commit().await?;
    println!("   ✓ Inserted {} courses in {:?}", ids.len(), started.elapsed());
    Ok(ids)
}
