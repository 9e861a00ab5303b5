//! Download command - fetch a single resource from a web application

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use s7web_core::domain::newtypes::ResourcePath;
use s7web_core::ports::rpc_transport::IRpcTransport;
use s7web_rpc::{auth, WebAppTransport};
use s7web_transfer::FileTransfer;

use crate::commands::{load_config, ConnectionArgs};
use crate::output::Console;

#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Resource path within the application (e.g. css/main.css)
    pub resource: String,

    /// Web application name
    #[arg(short, long)]
    pub app: String,

    /// Target directory; must already exist
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl DownloadCommand {
    pub async fn execute(&self, console: Console, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;

        let resource = ResourcePath::new(&self.resource)?;
        let client = self.connection.connect(&config).await?;
        let transport: Arc<dyn IRpcTransport> =
            Arc::new(WebAppTransport::new(client.clone(), &self.app));
        let engine = FileTransfer::new(transport.clone(), &config.transfer);

        let result = async {
            let id = transport.download_resource(&resource).await?;
            engine.download_to_dir(&id, &self.out, resource.name()).await
        }
        .await;

        if let Err(err) = auth::logout(&client).await {
            tracing::warn!(error = %err, "Logout after download failed");
        }
        let outcome = result?;

        if console.format().is_json() {
            console.document(&serde_json::json!({
                "resource": resource.as_str(),
                "path": outcome.path,
                "verified": outcome.ticket.is_some(),
            }));
        } else {
            console.success(&format!(
                "Downloaded {} to {}",
                resource,
                outcome.path.display()
            ));
        }
        Ok(())
    }
}
