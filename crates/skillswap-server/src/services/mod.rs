//! Domain operations shared by the HTTP handlers.

pub mod connections;
pub mod conversations;
