//! Shared harness: an in-memory database, a temporary media root and the real
//! router driven through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use skillswap_server::{create_router, db, AppState, Config};
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "skillswap-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _media: TempDir,
}

/// A registered user and the token issued at signup.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
    pub email: String,
}

/// One part of a multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

impl TestApp {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().expect("Failed to create media dir");
        let pool = db::create_memory_pool()
            .await
            .expect("Failed to open in-memory database");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let state = AppState::new(pool, Config::test_default(media.path()));
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _media: media,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, body)
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.json(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        parts: &[Part<'_>],
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();

        self.send(request).await
    }

    /// Sign up `username` with a derived email and the password `password123`.
    pub async fn signup(&self, username: &str, first_name: &str, last_name: &str) -> TestUser {
        let email = format!("{username}@example.com");
        let (status, body) = self
            .json(
                Method::POST,
                "/api/v1/auth/signup",
                None,
                Some(json!({
                    "username": username,
                    "email": email,
                    "password": "password123",
                    "first_name": first_name,
                    "last_name": last_name,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
            email,
        }
    }

    /// Serve the router on an ephemeral local port for clients that need a
    /// real connection.
    pub async fn serve(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let router = self.router.clone();

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server failed");
        });

        addr
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn png(name: &str) -> Part<'_> {
    Part::File {
        name: "images",
        file_name: name,
        content_type: "image/png",
        bytes: b"\x89PNG\r\n\x1a\nfake",
    }
}

/// Number of stored files under `dir` of the media root. A missing directory
/// counts as empty.
pub fn stored_files(app: &TestApp, dir: &str) -> usize {
    std::fs::read_dir(app.state.config.media_root.join(dir))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

/// Make every statement of `event` on `table` fail.
pub async fn fail_writes(app: &TestApp, event: &str, table: &str) {
    sqlx::query(&format!(
        "CREATE TRIGGER fail_{table} BEFORE {event} ON {table} BEGIN SELECT RAISE(ABORT, 'write refused'); END"
    ))
    .execute(&app.state.db)
    .await
    .expect("Failed to install trigger");
}
