//! Handshake checks for the call-signaling socket, relay through the shared
//! hub, and a real client connection against a served router.

use std::time::Duration;

use axum::http::{Method, StatusCode};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use skillswap_server::signaling::SignalingHub;
use skillswap_shared::signaling::{ClientEnvelope, ServerEnvelope};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

mod common;

use common::{TestApp, TestUser};

const WAIT: Duration = Duration::from_secs(5);

/// Wait until `user_id` has exactly `expected` live registrations.
async fn wait_for_registrations(hub: &SignalingHub, user_id: Uuid, expected: usize) {
    timeout(WAIT, async {
        while hub.registrations(user_id) != expected {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {expected} registrations for {user_id}, found {}",
            hub.registrations(user_id)
        )
    });
}

#[tokio::test]
async fn socket_requires_token() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;

    let (status, _) = app
        .json(Method::GET, &format!("/ws/call/{}", ada.id), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .json(
            Method::GET,
            &format!("/ws/call/{}?token=garbage", ada.id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn socket_rejects_other_users_id() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;
    let bob = app.signup("bob", "Bob", "Builder").await;

    let (status, body) = app
        .json(
            Method::GET,
            &format!("/ws/call/{}?token={}", bob.id, ada.token),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied");
}

#[tokio::test]
async fn valid_token_without_upgrade_is_bad_request() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;

    let (status, _) = app
        .json(
            Method::GET,
            &format!("/ws/call/{}?token={}", ada.id, ada.token),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn offer_answer_and_end_flow_between_users() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;
    let bob = app.signup("bob", "Bob", "Builder").await;
    let hub = &app.state.hub;

    let mut ada_socket = hub.register(ada.id);
    let mut bob_socket = hub.register(bob.id);

    let offer = json!({
        "type": "call-offer",
        "recipient_id": bob.id,
        "offer": {"type": "offer", "sdp": "v=0"},
        "caller_name": "Ada Lovelace",
    });
    assert_eq!(hub.relay_text(ada.id, &offer.to_string()), Some(1));

    match bob_socket.recv().await.unwrap() {
        ServerEnvelope::CallOffer {
            caller_id,
            caller_name,
            offer,
        } => {
            assert_eq!(caller_id, ada.id);
            assert_eq!(caller_name, "Ada Lovelace");
            assert_eq!(offer["sdp"], "v=0");
        }
        other => panic!("unexpected frame {other:?}"),
    }

    hub.relay(
        bob.id,
        ClientEnvelope::CallAnswer {
            caller_id: ada.id,
            answer: json!({"type": "answer", "sdp": "v=0"}),
        },
    );
    assert_eq!(
        ada_socket.recv().await,
        Some(ServerEnvelope::CallAnswer {
            answer: json!({"type": "answer", "sdp": "v=0"})
        })
    );

    hub.relay(ada.id, ClientEnvelope::CallEnd { peer_id: bob.id });
    assert_eq!(bob_socket.recv().await, Some(ServerEnvelope::CallEnd));

    // Frames for a user nobody registered are dropped.
    drop(bob_socket);
    assert_eq!(
        hub.relay(ada.id, ClientEnvelope::CallEnd { peer_id: bob.id }),
        0
    );
}

#[tokio::test]
async fn socket_relays_offer_stamped_with_sender_and_unregisters_on_close() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;
    let bob = app.signup("bob", "Bob", "Builder").await;
    let addr = app.serve().await;

    let url = |user: &TestUser| format!("ws://{addr}/ws/call/{}?token={}", user.id, user.token);
    let (mut ada_ws, _) = connect_async(url(&ada)).await.expect("ada failed to connect");
    let (mut bob_ws, _) = connect_async(url(&bob)).await.expect("bob failed to connect");

    wait_for_registrations(&app.state.hub, ada.id, 1).await;
    wait_for_registrations(&app.state.hub, bob.id, 1).await;

    // Unparseable frames are skipped without closing the socket.
    ada_ws
        .send(Message::Text("{not an envelope".to_string()))
        .await
        .unwrap();

    let offer = json!({
        "type": "call-offer",
        "recipient_id": bob.id,
        "caller_id": Uuid::new_v4(),
        "offer": {"type": "offer", "sdp": "v=0"},
        "caller_name": "Ada Lovelace",
    });
    ada_ws.send(Message::Text(offer.to_string())).await.unwrap();

    let frame = timeout(WAIT, async {
        loop {
            match bob_ws.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(_)) => continue,
                other => panic!("bob's socket ended early: {other:?}"),
            }
        }
    })
    .await
    .expect("bob received no offer");

    let frame: Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(frame["type"], "call-offer");
    assert_eq!(frame["caller_id"], ada.id.to_string());
    assert_eq!(frame["caller_name"], "Ada Lovelace");
    assert_eq!(frame["offer"]["sdp"], "v=0");

    bob_ws.close(None).await.unwrap();
    wait_for_registrations(&app.state.hub, bob.id, 0).await;
    assert_eq!(app.state.hub.registrations(ada.id), 1);

    ada_ws.close(None).await.unwrap();
    wait_for_registrations(&app.state.hub, ada.id, 0).await;
}
