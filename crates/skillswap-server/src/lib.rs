pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod routes;
pub mod services;
pub mod signaling;

pub use config::Config;
pub use db::DbPool;
pub use error::AppError;
pub use routes::{create_router, AppState};
