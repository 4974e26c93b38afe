pub use academy_models::chat::*;
