pub mod controller;
pub mod model;
pub mod rooms;
pub mod router;
pub mod service;
