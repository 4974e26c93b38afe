pub use academy_models::auth::*;
