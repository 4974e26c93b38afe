pub mod controller;
pub mod model;
pub mod paystack;
pub mod router;
pub mod service;
pub mod webhook;
