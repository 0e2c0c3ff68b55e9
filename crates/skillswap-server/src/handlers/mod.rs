pub mod auth;
pub mod calls;
pub mod connections;
pub mod messages;
pub mod posts;
pub mod profiles;
pub mod ringtones;
