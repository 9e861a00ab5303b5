//! Tickets commands - list and close session tickets
//!
//! Tickets are session-scoped; a fresh login shows only tickets opened by
//! that session. Listing is mostly useful for diagnosing a client that
//! crashed mid-transfer and left slots occupied on long-lived sessions.

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use s7web_core::domain::newtypes::TicketId;
use s7web_rpc::{auth, browse_all_tickets, close_session_ticket};

use crate::commands::{load_config, ConnectionArgs};
use crate::output::Console;

#[derive(Debug, Subcommand)]
pub enum TicketsCommand {
    /// List the session's tickets
    List {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Close a ticket by id
    Close {
        /// The 28-character ticket id
        id: String,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

impl TicketsCommand {
    pub async fn execute(&self, console: Console, config_path: Option<&Path>) -> Result<()> {
        match self {
            TicketsCommand::List { connection } => {
                self.execute_list(connection, console, config_path).await
            }
            TicketsCommand::Close { id, connection } => {
                self.execute_close(id, connection, console, config_path).await
            }
        }
    }

    async fn execute_list(
        &self,
        connection: &ConnectionArgs,
        console: Console,
        config_path: Option<&Path>,
    ) -> Result<()> {
        let config = load_config(config_path)?;
        let client = connection.connect(&config).await?;

        let result = browse_all_tickets(&client).await;
        if let Err(err) = auth::logout(&client).await {
            tracing::warn!(error = %err, "Logout after ticket listing failed");
        }
        let tickets = result?;

        if console.format().is_json() {
            let entries: Vec<serde_json::Value> = tickets
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "id": t.id.as_str(),
                        "state": t.state.to_string(),
                        "provider": t.provider.to_string(),
                        "created": t.created.to_rfc3339(),
                    })
                })
                .collect();
            console.document(&serde_json::json!({ "tickets": entries }));
            return Ok(());
        }

        if tickets.is_empty() {
            console.success("No open tickets");
            return Ok(());
        }
        console.success(&format!("{} ticket(s)", tickets.len()));
        for ticket in &tickets {
            console.detail(&format!(
                "{}  {}  {}  {}",
                ticket.id,
                ticket.state,
                ticket.provider,
                ticket.created.format("%Y-%m-%d %H:%M:%S"),
            ));
        }
        Ok(())
    }

    async fn execute_close(
        &self,
        id: &str,
        connection: &ConnectionArgs,
        console: Console,
        config_path: Option<&Path>,
    ) -> Result<()> {
        let ticket_id = TicketId::new(id)?;
        let config = load_config(config_path)?;
        let client = connection.connect(&config).await?;

        let result = close_session_ticket(&client, &ticket_id).await;
        if let Err(err) = auth::logout(&client).await {
            tracing::warn!(error = %err, "Logout after ticket close failed");
        }
        result?;

        console.success(&format!("Closed ticket {ticket_id}"));
        Ok(())
    }
}
