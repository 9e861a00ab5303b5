//! Status command - show a web application's deployed structure

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use s7web_core::domain::resource::ResourceKind;
use s7web_core::ports::rpc_transport::{is_not_found, IRpcTransport};
use s7web_rpc::{auth, WebAppTransport};

use crate::commands::{load_config, ConnectionArgs};
use crate::output::Console;

#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Web application name
    #[arg(short, long)]
    pub app: String,

    /// List every deployed resource, not just the summary
    #[arg(long)]
    pub list: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl StatusCommand {
    pub async fn execute(&self, console: Console, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;

        let client = self.connection.connect(&config).await?;
        let transport = WebAppTransport::new(client.clone(), &self.app);
        let result = transport.browse_resource_tree(None).await;
        if let Err(err) = auth::logout(&client).await {
            tracing::warn!(error = %err, "Logout after status query failed");
        }

        let tree = match result {
            Ok(tree) => tree,
            Err(err) if is_not_found(&err) => {
                if console.format().is_json() {
                    console.document(&serde_json::json!({
                        "app": self.app,
                        "exists": false,
                    }));
                } else {
                    console.success(&format!(
                        "Application '{}' is not deployed on the device",
                        self.app
                    ));
                }
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let mut files = 0u64;
        let mut directories = 0u64;
        let mut total_bytes = 0u64;
        for (idx, _) in tree.walk() {
            match &tree.node(idx).kind {
                ResourceKind::File(attrs) => {
                    files += 1;
                    total_bytes += attrs.size;
                }
                ResourceKind::Directory => directories += 1,
            }
        }

        if console.format().is_json() {
            let mut resources = Vec::new();
            if self.list {
                for (idx, path) in tree.walk() {
                    let node = tree.node(idx);
                    resources.push(match &node.kind {
                        ResourceKind::File(attrs) => serde_json::json!({
                            "path": path.as_str(),
                            "type": "file",
                            "size": attrs.size,
                            "last_modified": attrs.last_modified.to_rfc3339(),
                        }),
                        ResourceKind::Directory => serde_json::json!({
                            "path": path.as_str(),
                            "type": "dir",
                        }),
                    });
                }
            }
            console.document(&serde_json::json!({
                "app": self.app,
                "exists": true,
                "files": files,
                "directories": directories,
                "total_bytes": total_bytes,
                "resources": resources,
            }));
            return Ok(());
        }

        console.success(&format!(
            "Application '{}': {} file(s) in {} director{}, {} bytes",
            self.app,
            files,
            directories,
            if directories == 1 { "y" } else { "ies" },
            total_bytes
        ));
        if self.list {
            for (idx, path) in tree.walk() {
                match &tree.node(idx).kind {
                    ResourceKind::File(attrs) => {
                        console.detail(&format!("{:>10}  {}", attrs.size, path));
                    }
                    ResourceKind::Directory => {
                        console.detail(&format!("{:>10}  {}/", "-", path));
                    }
                }
            }
        }
        Ok(())
    }
}
