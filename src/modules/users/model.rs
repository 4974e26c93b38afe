pub use academy_models::users::*;
