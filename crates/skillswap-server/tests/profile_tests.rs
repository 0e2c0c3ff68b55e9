use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;

use common::TestApp;

#[tokio::test]
async fn profile_create_update_and_list() {
    let app = TestApp::new().await;
    let ada = app.signup("ada", "Ada", "Lovelace").await;

    let (status, _) = app.get("/api/v1/profile", &ada.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(Method::PUT, "/api/v1/profile", Some(&ada.token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, profile) = app
        .post(
            "/api/v1/profile",
            &ada.token,
            json!({"skills": ["rust", "sql"], "availability": ["weekends"]}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["skills"], json!(["rust", "sql"]));
    assert_eq!(profile["wanted_skills"], json!([]));
    assert_eq!(profile["user"]["username"], "ada");

    let (status, _) = app.post("/api/v1/profile", &ada.token, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, profile) = app
        .json(
            Method::PUT,
            "/api/v1/profile",
            Some(&ada.token),
            Some(json!({"wanted_skills": ["piano"]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["skills"], json!(["rust", "sql"]));
    assert_eq!(profile["wanted_skills"], json!(["piano"]));

    let bob = app.signup("bob", "Bob", "Builder").await;
    let (_, profiles) = app.get("/api/v1/profiles", &bob.token).await;
    assert_eq!(profiles.as_array().unwrap().len(), 1);
}
