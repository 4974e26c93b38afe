//! Shared utilities.
//!
//! - [`email`]: SMTP delivery for OTPs, notifications and ad-hoc messages
//! - [`request`]: Client IP and bearer token extraction
//! - [`tracing`]: Span and audit event helpers

pub mod email;
pub mod request;
pub mod tracing;
