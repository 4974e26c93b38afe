pub use academy_models::notifications::*;
