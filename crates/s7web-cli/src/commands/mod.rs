//! CLI command implementations

pub mod deploy;
pub mod download;
pub mod login;
pub mod status;
pub mod tickets;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use s7web_core::config::Config;
use s7web_rpc::{auth, RpcClient};

/// Connection options shared by every device-facing command
#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Device base URL (e.g. https://192.168.0.10), overrides the config
    #[arg(long)]
    pub url: Option<String>,

    /// Device user name
    #[arg(short, long)]
    pub user: String,

    /// Password; read from $S7WEB_PASSWORD when omitted
    #[arg(short, long)]
    pub password: Option<String>,
}

impl ConnectionArgs {
    /// Builds a client for the configured device and logs in
    pub async fn connect(&self, config: &Config) -> Result<Arc<RpcClient>> {
        let mut connection = config.connection.clone();
        if let Some(url) = &self.url {
            connection.base_url = url.clone();
        }
        let password = match &self.password {
            Some(password) => password.clone(),
            None => std::env::var("S7WEB_PASSWORD")
                .context("No password given. Use --password or set S7WEB_PASSWORD")?,
        };

        let client = Arc::new(RpcClient::from_config(&connection)?);
        auth::login(&client, &self.user, &password).await?;
        Ok(client)
    }
}

/// Loads and validates the config from the override path or the default
/// location
pub fn load_config(override_path: Option<&Path>) -> Result<Config> {
    let config = match override_path {
        Some(path) => Config::load_or_default(path),
        None => Config::load_or_default(&Config::default_path()),
    };
    config.validate()?;
    Ok(config)
}
