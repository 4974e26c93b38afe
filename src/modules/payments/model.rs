pub use academy_models::payments::*;
