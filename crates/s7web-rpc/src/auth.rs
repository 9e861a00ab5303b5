//! Session authentication
//!
//! `Api.Login` / `Api.Logout` against the device. The device issues a
//! session token on login; the token is attached to every subsequent
//! request by [`RpcClient`] and invalidated again on logout.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::RpcClient;

#[derive(Debug, Serialize)]
struct LoginParams<'a> {
    user: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    token: String,
}

/// Logs in and stores the session token on the client
///
/// # Errors
/// Fails with the classified device error on rejected credentials
/// (`LoginFailed`) or an expired password.
pub async fn login(client: &RpcClient, user: &str, password: &str) -> Result<()> {
    let result: LoginResult = client
        .call("Api.Login", LoginParams { user, password }, user)
        .await
        .context("Login failed")?;

    client.set_token(result.token);
    info!(user, "Logged in to device");
    Ok(())
}

/// Logs out and drops the stored session token
///
/// The token is cleared locally even if the device-side logout fails;
/// a dead session cannot be reused anyway.
pub async fn logout(client: &RpcClient) -> Result<()> {
    let result: Result<bool> = client
        .call("Api.Logout", serde_json::json!({}), "session")
        .await;
    client.clear_token();
    result.context("Logout failed")?;
    info!("Logged out from device");
    Ok(())
}
