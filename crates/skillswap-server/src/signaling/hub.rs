use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use skillswap_shared::signaling::{ClientEnvelope, ServerEnvelope};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::relay::forward;

type Outbox = mpsc::Sender<ServerEnvelope>;

/// Frames buffered per registration before further frames are dropped.
pub const OUTBOX_CAPACITY: usize = 256;

/// Registry of live realtime registrations grouped by user id.
#[derive(Debug, Default)]
pub struct SignalingHub {
    groups: DashMap<Uuid, HashMap<u64, Outbox>>,
    next_id: AtomicU64,
}

impl SignalingHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration to `user_id`'s group. It stays a member until the
    /// returned handle is dropped.
    pub fn register(self: &Arc<Self>, user_id: Uuid) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);

        self.groups.entry(user_id).or_default().insert(id, tx);
        tracing::debug!(%user_id, registration = id, "Signaling client registered");

        Registration {
            hub: Arc::clone(self),
            user_id,
            id,
            inbox: rx,
        }
    }

    fn unregister(&self, user_id: Uuid, id: u64) {
        if let Some(mut members) = self.groups.get_mut(&user_id) {
            members.remove(&id);
        }
        self.groups.remove_if(&user_id, |_, members| members.is_empty());
        tracing::debug!(%user_id, registration = id, "Signaling client unregistered");
    }

    /// Number of live registrations for `user_id`.
    pub fn registrations(&self, user_id: Uuid) -> usize {
        self.groups.get(&user_id).map_or(0, |members| members.len())
    }

    /// Deliver `envelope` to every current registration of `user_id` and
    /// return how many accepted it. A registration whose outbox is full
    /// misses the frame. Membership is snapshotted first so no lock is
    /// held while sending.
    pub fn send_to(&self, user_id: Uuid, envelope: ServerEnvelope) -> usize {
        let members: Vec<Outbox> = self
            .groups
            .get(&user_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default();

        if members.is_empty() {
            tracing::debug!(%user_id, "No live registration, dropping signaling frame");
            return 0;
        }

        members
            .iter()
            .filter(|outbox| match outbox.try_send(envelope.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!(%user_id, "Outbox full, dropping signaling frame");
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            })
            .count()
    }

    /// Forward an inbound envelope from `sender` to its addressee.
    pub fn relay(&self, sender: Uuid, envelope: ClientEnvelope) -> usize {
        let (target, frame) = forward(sender, envelope);
        self.send_to(target, frame)
    }

    /// Parse and forward a raw text frame. Frames that are not valid
    /// envelopes are ignored and yield `None`.
    pub fn relay_text(&self, sender: Uuid, text: &str) -> Option<usize> {
        match serde_json::from_str::<ClientEnvelope>(text) {
            Ok(envelope) => Some(self.relay(sender, envelope)),
            Err(e) => {
                tracing::debug!(%sender, error = %e, "Ignoring signaling frame");
                None
            }
        }
    }
}

/// Membership of one client in its user's group.
#[derive(Debug)]
pub struct Registration {
    hub: Arc<SignalingHub>,
    user_id: Uuid,
    id: u64,
    inbox: mpsc::Receiver<ServerEnvelope>,
}

impl Registration {
    /// Next envelope addressed to this registration.
    pub async fn recv(&mut self) -> Option<ServerEnvelope> {
        self.inbox.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ServerEnvelope> {
        self.inbox.try_recv().ok()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.hub.unregister(self.user_id, self.id);
    }
}
