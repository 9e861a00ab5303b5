//! JSON-RPC client for the device webserver
//!
//! Wraps `reqwest::Client` with JSON-RPC 2.0 envelope construction, the
//! `X-Auth-Token` session header, and decoding of the device's result/error
//! envelopes. Device error codes are classified through [`crate::codes`]
//! so callers can react to typed conditions.
//!
//! The raw ticketing endpoint (`/api/ticket?id=...`) is also served here,
//! since it shares the base URL and session token but speaks plain
//! octet-streams instead of JSON-RPC.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use s7web_core::config::ConnectionConfig;
use s7web_core::domain::newtypes::TicketId;

use crate::codes;

/// Path of the JSON-RPC endpoint below the base URL
const JSONRPC_PATH: &str = "/api/jsonrpc";

/// Path of the raw ticketing endpoint below the base URL
const TICKET_PATH: &str = "/api/ticket";

/// Session header carrying the login token
const AUTH_HEADER: &str = "X-Auth-Token";

// ============================================================================
// JSON-RPC envelope types
// ============================================================================

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    #[allow(dead_code)]
    id: Option<u64>,
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

// ============================================================================
// RpcClient
// ============================================================================

/// HTTP client for the device's JSON-RPC Web API
///
/// One instance corresponds to one device session. The session token is
/// absent until `Api.Login` succeeds (see [`crate::auth`]); unauthenticated
/// calls are sent without the header, which the device answers with a
/// permission error for protected methods.
pub struct RpcClient {
    /// The underlying HTTP client
    client: reqwest::Client,
    /// Base URL of the device webserver
    base_url: String,
    /// Session token from `Api.Login`, if logged in
    token: RwLock<Option<String>>,
    /// Monotonic JSON-RPC request id
    next_id: AtomicU64,
}

impl RpcClient {
    /// Creates a client for the given base URL with default HTTP settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(base_url.into()),
            token: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a client from connection configuration
    ///
    /// Honors `verify_tls` (device webservers commonly run with
    /// self-signed certificates) and the per-request timeout.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: normalize_base_url(config.base_url.clone()),
            token: RwLock::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    /// Base URL this client talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stores the session token attached to subsequent requests
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("token lock poisoned") = Some(token.into());
        debug!("Session token updated");
    }

    /// Drops the session token (after `Api.Logout`)
    pub fn clear_token(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    /// Whether a session token is currently held
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    fn attach_token(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.read().expect("token lock poisoned").as_deref() {
            Some(token) => builder.header(AUTH_HEADER, token),
            None => builder,
        }
    }

    /// Performs one JSON-RPC call and decodes the typed result
    ///
    /// `subject` names the entity the call addresses; it is threaded into
    /// classified error variants for diagnostics.
    pub async fn call<P, R>(&self, method: &str, params: P, subject: &str) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(method, id, subject, "JSON-RPC call");

        let url = format!("{}{JSONRPC_PATH}", self.base_url);
        let response: RpcResponse<R> = self
            .attach_token(self.client.post(&url).json(&request))
            .send()
            .await
            .with_context(|| format!("Failed to send {method} request"))?
            .error_for_status()
            .with_context(|| format!("{method} returned HTTP error status"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse {method} response"))?;

        if let Some(err) = response.error {
            let classified = codes::classify(err.code, &err.message, subject);
            return Err(anyhow::Error::new(classified)
                .context(format!("{method} failed (device code {})", err.code)));
        }

        response
            .result
            .with_context(|| format!("{method} response carried neither result nor error"))
    }

    // ========================================================================
    // Raw ticketing endpoint
    // ========================================================================

    /// Downloads the byte payload bound to a ticket
    pub async fn fetch_ticket_payload(&self, id: &TicketId) -> Result<Vec<u8>> {
        let url = format!("{}{TICKET_PATH}?id={}", self.base_url, id);
        debug!(ticket = %id, "Fetching ticket payload");

        let response = self
            .attach_token(self.client.get(&url))
            .send()
            .await
            .context("Failed to send ticket download request")?
            .error_for_status()
            .context("Ticket download returned error status")?;

        let bytes = response
            .bytes()
            .await
            .context("Failed to read ticket payload body")?;

        debug!(ticket = %id, len = bytes.len(), "Ticket payload received");
        Ok(bytes.to_vec())
    }

    /// Uploads a byte payload to the endpoint bound to a ticket
    pub async fn send_ticket_payload(&self, id: &TicketId, data: &[u8]) -> Result<()> {
        let url = format!("{}{TICKET_PATH}?id={}", self.base_url, id);
        debug!(ticket = %id, len = data.len(), "Sending ticket payload");

        self.attach_token(
            self.client
                .post(&url)
                .header("Content-Type", "application/octet-stream")
                .body(data.to_vec()),
        )
        .send()
        .await
        .context("Failed to send ticket upload request")?
        .error_for_status()
        .context("Ticket upload returned error status")?;

        Ok(())
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.has_token())
            .finish_non_exhaustive()
    }
}

/// Strips a trailing slash so path concatenation stays predictable
fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
