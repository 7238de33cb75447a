//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use coze_client::CozeClient;
use serde_json::{Value, json};
use wiremock::{MockServer, ResponseTemplate};

/// Token every test client sends.
pub const TOKEN: &str = "pat_test";

/// Log id every canned response carries.
pub const LOGID: &str = "20240601120000-test";

/// A mock platform plus a client pointed at it.
pub struct TestApi {
    pub server: MockServer,
    pub client: CozeClient,
}

impl TestApi {
    /// Start a mock server and a client with a token.
    pub async fn start() -> Self {
        Self::start_with(|builder| builder.api_token(TOKEN)).await
    }

    /// Start a mock server and a client without a token.
    pub async fn start_anonymous() -> Self {
        Self::start_with(|builder| builder).await
    }

    /// Start with extra builder settings.
    pub async fn start_with(
        configure: impl FnOnce(coze_client::ClientBuilder) -> coze_client::ClientBuilder,
    ) -> Self {
        let server = MockServer::start().await;
        let client = configure(
            CozeClient::builder()
                .base_url(server.uri())
                .timeout(Duration::from_secs(5)),
        )
        .build()
        .expect("client should build");
        Self { server, client }
    }

    /// The `Authorization` value the client is expected to send.
    pub fn bearer() -> String {
        format!("Bearer {TOKEN}")
    }
}

/// A successful envelope around `data`.
pub fn ok(data: Value) -> ResponseTemplate {
    json_response(200, json!({"code": 0, "msg": "", "data": data}))
}

/// A JSON response with the log id header.
pub fn json_response(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("X-Tt-Logid", LOGID)
        .set_body_json(body)
}

/// An event-stream response carrying `body` verbatim.
pub fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("X-Tt-Logid", LOGID)
        .insert_header("Cache-Control", "no-cache")
        .set_body_raw(body.to_string(), "text/event-stream")
}

/// A chat object in the given status.
pub fn chat(status: &str) -> Value {
    json!({
        "id": "chat-1",
        "conversation_id": "conv-1",
        "bot_id": "bot-1",
        "created_at": 1718000000,
        "status": status
    })
}
