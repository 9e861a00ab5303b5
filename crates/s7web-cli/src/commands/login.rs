//! Login command - verify credentials against the device
//!
//! Opens a session, reports success, and closes the session again. The
//! device issues per-session tokens, so there is nothing to persist; the
//! command exists to check connectivity and credentials.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use s7web_rpc::auth;

use crate::commands::{load_config, ConnectionArgs};
use crate::output::Console;

#[derive(Debug, Args)]
pub struct LoginCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl LoginCommand {
    pub async fn execute(&self, console: Console, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;

        let client = self.connection.connect(&config).await?;
        console.success(&format!(
            "Login succeeded for {} at {}",
            self.connection.user,
            client.base_url()
        ));

        if let Err(err) = auth::logout(&client).await {
            tracing::warn!(error = %err, "Logout after credential check failed");
        }
        Ok(())
    }
}
