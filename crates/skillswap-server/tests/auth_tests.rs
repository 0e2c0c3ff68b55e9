//! Signup, login and token handling.

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;

use common::{fail_writes, stored_files, Part, TestApp};

#[tokio::test]
async fn signup_returns_token_and_user() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "username": "ada",
                "email": "Ada@Example.com",
                "password": "password123",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "phone_number": "+44 20 0000",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["phone_number"], "+44 20 0000");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn duplicate_email_or_username_conflicts() {
    let app = TestApp::new().await;
    app.signup("ada", "Ada", "Lovelace").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "username": "someone-else",
                "email": "ada@example.com",
                "password": "password123",
                "first_name": "A",
                "last_name": "B",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "username": "ada",
                "email": "other@example.com",
                "password": "password123",
                "first_name": "A",
                "last_name": "B",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_validates_fields() {
    let app = TestApp::new().await;

    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "username": "ada",
                "email": "not-an-email",
                "password": "password123",
                "first_name": "Ada",
                "last_name": "Lovelace",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "username": "ada",
                "email": "ada@example.com",
                "password": "short",
                "first_name": "Ada",
                "last_name": "Lovelace",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_payload_error() {
    let app = TestApp::new().await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_reports_profile_presence() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;

    let login = || {
        app.json(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": ada.email, "password": "password123"})),
        )
    };

    let (status, body) = login().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_profile"], false);
    assert_eq!(body["user"]["username"], "ada");

    let (status, _) = app
        .post("/api/v1/profile", &ada.token, json!({"skills": ["rust"]}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = login().await;
    assert_eq!(body["has_profile"], true);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": ada.email, "password": "wrong-password"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = TestApp::new().await;

    for uri in [
        "/api/v1/auth/me",
        "/api/v1/posts",
        "/api/v1/conversations",
        "/api/v1/connections/pending",
        "/api/v1/ringtones",
    ] {
        let (status, _) = app.json(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }

    let (status, _) = app.get("/api/v1/auth/me", "garbage").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.json(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;

    let (status, body) = app
        .post(
            "/api/v1/auth/change-password",
            &ada.token,
            json!({"old_password": "nope-nope", "new_password": "newpassword1"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let (status, _) = app
        .post(
            "/api/v1/auth/change-password",
            &ada.token,
            json!({"old_password": "password123", "new_password": "newpassword1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": ada.email, "password": "newpassword1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleted_account_token_stops_working() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;
    let bob = app.signup("bob", "Bob", "Builder").await;

    app.post(
        "/api/v1/send",
        &bob.token,
        json!({"receiver_id": ada.id, "content": "hi"}),
    )
    .await;
    app.post("/api/v1/connections/send", &bob.token, json!({"to_user_id": ada.id}))
        .await;

    let (status, _) = app
        .json(Method::DELETE, "/api/v1/auth/account", Some(&ada.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/v1/auth/me", &ada.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The other side no longer sees the deleted user anywhere.
    let (_, conversations) = app.get("/api/v1/conversations", &bob.token).await;
    assert_eq!(conversations.as_array().unwrap().len(), 0);
    let (status, _) = app
        .get(&format!("/api/v1/connections/status/{}", ada.id), &bob.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn image(file_name: &str) -> Part<'_> {
    Part::File {
        name: "profile_image",
        file_name,
        content_type: "image/png",
        bytes: b"\x89PNG\r\n\x1a\nfake",
    }
}

#[tokio::test]
async fn profile_image_replaces_previous_file_and_survives_failed_update() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;

    let (status, first) = app
        .multipart(Method::POST, "/api/v1/auth/update-profile", &ada.token, &[image("a.png")])
        .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    let (status, second) = app
        .multipart(Method::POST, "/api/v1/auth/update-profile", &ada.token, &[image("b.png")])
        .await;
    assert_eq!(status, StatusCode::OK, "{second}");
    assert_ne!(first["user"]["profile_image"], second["user"]["profile_image"]);
    assert_eq!(stored_files(&app, "profile_images"), 1);

    fail_writes(&app, "UPDATE", "users").await;
    let (status, _) = app
        .multipart(Method::POST, "/api/v1/auth/update-profile", &ada.token, &[image("c.png")])
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, me) = app.get("/api/v1/auth/me", &ada.token).await;
    assert_eq!(me["profile_image"], second["user"]["profile_image"]);
    assert_eq!(stored_files(&app, "profile_images"), 1);
}
