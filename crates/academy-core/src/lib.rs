//! # Academy Core
//!
//! Core types, errors, and utilities shared by every IT360 Academy crate.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination parameters and metadata for list endpoints
//! - [`password`]: bcrypt password hashing and verification
//! - [`serde`]: Query-string friendly deserializers
//! - [`text`]: Slug generation and random token helpers
//!
//! # Example
//!
//! ```ignore
//! use academy_core::errors::AppError;
//! use academy_core::text::slugify;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Course not found"));
//! assert_eq!(slugify("Intro to Rust"), "intro-to-rust");
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;
pub mod text;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, hash_password_async, verify_password, verify_password_async};
