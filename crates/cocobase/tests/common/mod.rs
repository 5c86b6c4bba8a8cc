/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for cocobase tests

#![allow(dead_code)]

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use cocobase::{ClientConfig, CocobaseClient};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-key";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(TEST_API_KEY).with_base_url(server.uri())
}

pub fn client_for(server: &MockServer) -> CocobaseClient {
    CocobaseClient::with_config(config_for(server)).expect("client init")
}

/// Unsigned JWT carrying only an `exp` claim
pub fn mock_jwt_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(json!({ "exp": exp }).to_string());
    format!("{header}.{claims}.signature")
}

pub fn document_json(id: &str, collection: &str, data: Value) -> Value {
    json!({
        "id": id,
        "collection": collection,
        "data": data,
        "created_at": "2024-05-01T12:00:00Z",
        "updated_at": "2024-05-01T12:00:00Z"
    })
}

pub fn user_json(email: &str, data: Value) -> Value {
    json!({
        "id": "user-1",
        "email": email,
        "roles": ["editor"],
        "data": data,
        "created_at": "2024-05-01T12:00:00Z",
        "updated_at": "2024-05-01T12:00:00Z"
    })
}

/// Serve `GET /auth-collections/user` for requests bearing `token`
pub async fn mount_current_user(server: &MockServer, token: &str, user: Value) {
    Mock::given(method("GET"))
        .and(path("/auth-collections/user"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(user))
        .mount(server)
        .await;
}

/// Fresh path under the system temp dir
pub fn temp_session_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("cocobase-test-{}", uuid::Uuid::new_v4()))
        .join("session.json")
}
