//! Envelopes exchanged over the call-signaling WebSocket.
//!
//! Every frame is a JSON object with a `type` discriminator. The server never
//! looks inside `offer`, `answer` or `candidate`; they are forwarded verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Frame sent by a client to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEnvelope {
    CallOffer {
        recipient_id: Uuid,
        offer: Value,
        caller_name: String,
    },
    CallAnswer {
        caller_id: Uuid,
        answer: Value,
    },
    IceCandidate {
        peer_id: Uuid,
        candidate: Value,
    },
    CallEnd {
        peer_id: Uuid,
    },
}

impl ClientEnvelope {
    /// User id whose channel this envelope is addressed to.
    pub fn target(&self) -> Uuid {
        match self {
            Self::CallOffer { recipient_id, .. } => *recipient_id,
            Self::CallAnswer { caller_id, .. } => *caller_id,
            Self::IceCandidate { peer_id, .. } | Self::CallEnd { peer_id } => *peer_id,
        }
    }
}

/// Frame delivered by the relay to every registration of the addressed user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEnvelope {
    CallOffer {
        offer: Value,
        caller_id: Uuid,
        caller_name: String,
    },
    CallAnswer {
        answer: Value,
    },
    IceCandidate {
        candidate: Value,
    },
    CallEnd,
}
