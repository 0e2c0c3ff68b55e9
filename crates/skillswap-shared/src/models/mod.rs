mod connection;
mod message;
mod post;
mod profile;
mod ringtone;
mod user;

pub use connection::*;
pub use message::*;
pub use post::*;
pub use profile::*;
pub use ringtone::*;
pub use user::*;
