use skillswap_shared::signaling::{ClientEnvelope, ServerEnvelope};
use uuid::Uuid;

/// Translate an inbound envelope from `sender` into the frame delivered to
/// the addressed user. The caller id of an offer is always the sender's own
/// id, whatever the client claimed.
pub fn forward(sender: Uuid, envelope: ClientEnvelope) -> (Uuid, ServerEnvelope) {
    match envelope {
        ClientEnvelope::CallOffer {
            recipient_id,
            offer,
            caller_name,
        } => (
            recipient_id,
            ServerEnvelope::CallOffer {
                offer,
                caller_id: sender,
                caller_name,
            },
        ),
        ClientEnvelope::CallAnswer { caller_id, answer } => {
            (caller_id, ServerEnvelope::CallAnswer { answer })
        }
        ClientEnvelope::IceCandidate { peer_id, candidate } => {
            (peer_id, ServerEnvelope::IceCandidate { candidate })
        }
        ClientEnvelope::CallEnd { peer_id } => (peer_id, ServerEnvelope::CallEnd),
    }
}
