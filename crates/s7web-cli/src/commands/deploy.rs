//! Deploy command - synchronize a local directory onto a web application
//!
//! Wires the filesystem scanner and the Web API transport into the
//! synchronizer, runs the bounded-round deployment, and reports the
//! outcome. Ctrl-C cancels between applied operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use s7web_deploy::{DirScanner, Synchronizer};
use s7web_rpc::{auth, WebAppTransport};

use crate::commands::{load_config, ConnectionArgs};
use crate::output::Console;

#[derive(Debug, Args)]
pub struct DeployCommand {
    /// Local directory to deploy
    pub path: PathBuf,

    /// Target web application name
    #[arg(short, long)]
    pub app: String,

    /// Override the configured round budget
    #[arg(long)]
    pub retries: Option<u32>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl DeployCommand {
    pub async fn execute(&self, console: Console, config_path: Option<&Path>) -> Result<()> {
        let mut config = load_config(config_path)?;
        if let Some(retries) = self.retries {
            config.deploy.retries = retries;
        }
        config.validate()?;

        let client = self.connection.connect(&config).await?;
        let transport = Arc::new(WebAppTransport::new(client.clone(), &self.app));
        let synchronizer =
            Synchronizer::new(transport, Arc::new(DirScanner::new()), &config)?;

        let cancel = CancellationToken::new();
        let signal_cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current operation");
                signal_cancel.cancel();
            }
        });

        console.detail(&format!(
            "Deploying {} to application '{}'...",
            self.path.display(),
            self.app
        ));
        let result = synchronizer
            .with_cancellation(cancel)
            .deploy_or_update(&self.path)
            .await;

        if let Err(err) = auth::logout(&client).await {
            tracing::warn!(error = %err, "Logout after deployment failed");
        }
        let report = result?;

        if console.format().is_json() {
            console.document(&serde_json::json!({
                "rounds": report.rounds,
                "files_added": report.files_added,
                "files_updated": report.files_updated,
                "files_deleted": report.files_deleted,
                "errors": report.errors,
                "duration_ms": report.duration_ms,
            }));
            return Ok(());
        }

        let duration = if report.duration_ms >= 1000 {
            format!("{:.1}s", report.duration_ms as f64 / 1000.0)
        } else {
            format!("{}ms", report.duration_ms)
        };

        if report.rounds == 0 {
            console.success("Already up to date");
        } else {
            console.success(&format!(
                "Deployed in {} round{} ({})",
                report.rounds,
                if report.rounds == 1 { "" } else { "s" },
                duration
            ));
        }

        if report.files_added > 0 {
            console.detail(&format!("Added:   {} file(s)", report.files_added));
        }
        if report.files_updated > 0 {
            console.detail(&format!("Updated: {} file(s)", report.files_updated));
        }
        if report.files_deleted > 0 {
            console.detail(&format!("Deleted: {} file(s)", report.files_deleted));
        }
        if !report.errors.is_empty() {
            console.detail(&format!(
                "{} operation(s) needed a retry round:",
                report.errors.len()
            ));
            for error in &report.errors {
                console.detail(&format!("  - {error}"));
            }
        }
        Ok(())
    }
}
