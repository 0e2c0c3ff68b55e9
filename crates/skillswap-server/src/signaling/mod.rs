//! Call-signaling relay.
//!
//! Clients register under their own user id; envelopes naming another user id
//! are relabelled and fanned out to every live registration of that id. The
//! relay keeps no call state and reports no delivery failures.

mod hub;
mod relay;

pub use hub::{Registration, SignalingHub};
pub use relay::forward;
