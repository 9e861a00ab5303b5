//! Shared test helpers for Web API integration tests
//!
//! Provides wiremock-based mock server setup for the device's JSON-RPC
//! endpoint. All JSON-RPC methods share one URL; mocks are matched on the
//! `method` field of the request body.

use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use s7web_rpc::client::RpcClient;

/// A valid 28-character ticket id for tests
pub const TICKET_ID: &str = "abcdefghijklmnopqrstuvwxyz12";

/// Starts a mock device and returns a client pointing at it,
/// pre-loaded with a session token.
pub async fn setup() -> (MockServer, RpcClient) {
    let server = MockServer::start().await;
    let client = RpcClient::new(server.uri());
    client.set_token("test-session-token");
    (server, client)
}

/// Mounts a JSON-RPC method returning the given `result`.
pub async fn mount_rpc(server: &MockServer, rpc_method: &str, result: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/jsonrpc"))
        .and(body_partial_json(serde_json::json!({"method": rpc_method})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result
        })))
        .mount(server)
        .await;
}

/// Mounts a JSON-RPC method failing with the given device error code.
pub async fn mount_rpc_error(server: &MockServer, rpc_method: &str, code: i64, message: &str) {
    Mock::given(method("POST"))
        .and(path("/api/jsonrpc"))
        .and(body_partial_json(serde_json::json!({"method": rpc_method})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": code, "message": message}
        })))
        .mount(server)
        .await;
}

/// Mounts the raw ticket endpoint serving `content` for `ticket_id`.
pub async fn mount_ticket_download(server: &MockServer, ticket_id: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path("/api/ticket"))
        .and(query_param("id", ticket_id))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.to_vec())
                .append_header("Content-Type", "application/octet-stream"),
        )
        .mount(server)
        .await;
}

/// Mounts the raw ticket endpoint accepting uploads for `ticket_id`.
#[allow(dead_code)]
pub async fn mount_ticket_upload(server: &MockServer, ticket_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/ticket"))
        .and(query_param("id", ticket_id))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}
