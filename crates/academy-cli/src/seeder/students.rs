use academy_core::hash_password;
use academy_core::text::random_code;
use academy_models::{UserId, UserRole};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;
use sqlx::PgPool;
use std::time::Instant;

use super::SEED_PASSWORD;
use super::models::StudentSeed;
use crate::CliResult;

pub fn generate_students(count: usize) -> Vec<StudentSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let phone: String = PhoneNumber().fake();
            let email = format!(
                "{}.{}+student{}@example.com",
                first_name.to_lowercase(),
                last_name.to_lowercase(),
                idx
            );

            StudentSeed {
                first_name,
                last_name,
                email,
                phone_number: phone.chars().take(20).collect(),
                linking_code: random_code(8),
            }
        })
        .collect()
}

/// Inserts verified students with profiles, student rows and preferences.
pub async fn seed_students(db: &PgPool, count: usize) -> CliResult<Vec<UserId>> {
    let started = Instant::now();
    println!("🎓 Seeding {} students...", count);

    // one hash shared by every seeded account
    let password_hash = hash_password(SEED_PASSWORD).map_err(|e| e.message())?;
    let seeds = generate_students(count);

    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(seeds.len());

    for seed in &seeds {
        let user_id = sqlx::query_scalar::<_, UserId>(
            "INSERT INTO users (email, password, phone_number, first_name, last_name, role, is_verified)
             VALUES ($1, $2, $3, $4, $5, $6, TRUE)
             RETURNING id",
        )
        .bind(&seed.email)
        .bind(&password_hash)
        .bind(&seed.phone_number)
        .bind(&seed.first_name)
        .bind(&seed.last_name)
        .bind(UserRole::Student)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO students (user_id, linking_code) VALUES ($1, $2)")
            .bind(user_id)
            .bind(&seed.linking_code)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO notification_preferences (user_id) VALUES ($1)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        ids.push(user_id);
    }

    tx.commit().await?;
    println!(
        "   ✓ Inserted {} students in {:?} (password: {})",
        ids.len(),
        started.elapsed(),
        SEED_PASSWORD
    );
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_students_are_distinct() {
        let students = generate_students(20);
        let mut emails: Vec<_> = students.iter().map(|s| s.email.clone()).collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), 20);
        assert!(students.iter().all(|s| s.linking_code.len() == 8));
    }
}
