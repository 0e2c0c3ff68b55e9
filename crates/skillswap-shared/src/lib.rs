pub mod api;
pub mod models;
pub mod signaling;

pub use models::*;
