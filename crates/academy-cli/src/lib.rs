//! # Academy CLI
//!
//! Administrative commands for the IT360 Academy database.
//!
//! - [`superuser`]: Create an admin account
//! - [`seeder`]: Generate fake categories, courses and students
//!
//! ```ignore
//! use academy_cli::seeder::{SeedConfig, seed_all};
//!
//! seed_all(&pool, &SeedConfig::default()).await?;
//! ```

pub mod seeder;
pub mod superuser;

pub type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
