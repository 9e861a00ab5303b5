//! `IRpcTransport` adapter for the device Web API
//!
//! Maps the port operations the core consumes onto the device's JSON-RPC
//! methods (`WebApp.*`, `Api.BrowseTickets`, `Api.CloseTicket`) and the raw
//! ticketing endpoint. One [`WebAppTransport`] instance is bound to one
//! web application on one device session.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use s7web_core::domain::newtypes::{ResourcePath, TicketId};
use s7web_core::domain::resource::{FileAttrs, NodeIndex, ResourceTree, Visibility};
use s7web_core::domain::ticket::{Ticket, TicketProvider, TicketState};
use s7web_core::ports::rpc_transport::{IRpcTransport, ResourceMeta, TransportError};

use crate::client::RpcClient;
use crate::codes;

// ============================================================================
// Wire DTOs
// ============================================================================

/// A resource entry as reported by `WebApp.BrowseResources`
///
/// Directories nest their children in `resources`; files carry size,
/// timestamp and serving metadata. Fields use `Option` because the device
/// omits file metadata on directory entries and vice versa.
#[derive(Debug, Deserialize)]
struct WireResource {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
    last_modified: Option<DateTime<Utc>>,
    etag: Option<String>,
    media_type: Option<String>,
    visibility: Option<Visibility>,
    #[serde(default)]
    resources: Vec<WireResource>,
}

#[derive(Debug, Deserialize)]
struct BrowseResourcesResult {
    #[allow(dead_code)]
    max_resources: Option<u64>,
    #[serde(default)]
    resources: Vec<WireResource>,
}

/// A ticket entry as reported by `Api.BrowseTickets`
#[derive(Debug, Deserialize)]
struct WireTicket {
    id: String,
    state: String,
    provider: String,
    date_created: DateTime<Utc>,
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BrowseTicketsResult {
    #[allow(dead_code)]
    max_tickets: Option<u32>,
    #[serde(default)]
    tickets: Vec<WireTicket>,
}

#[derive(Debug, Serialize)]
struct TicketParams<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct ResourceParams<'a> {
    app_name: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateResourceParams<'a> {
    app_name: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_type: Option<&'a str>,
    last_modified: DateTime<Utc>,
    visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    etag: Option<&'a str>,
}

// ============================================================================
// Wire -> domain conversion
// ============================================================================

/// Builds a domain [`ResourceTree`] from browsed wire entries
///
/// The root is the application itself; entry names are single segments at
/// every nesting level. Entries with an unknown `type` are rejected rather
/// than guessed at.
fn build_tree(root_name: &str, entries: &[WireResource]) -> Result<ResourceTree> {
    let mut tree = ResourceTree::new(root_name);
    let root = tree.root();
    for entry in entries {
        attach_entry(&mut tree, root, entry)?;
    }
    Ok(tree)
}

fn attach_entry(tree: &mut ResourceTree, parent: NodeIndex, entry: &WireResource) -> Result<()> {
    match entry.kind.as_str() {
        "dir" => {
            let idx = tree
                .add_directory(parent, &entry.name)
                .with_context(|| format!("Invalid directory entry {:?}", entry.name))?;
            for child in &entry.resources {
                attach_entry(tree, idx, child)?;
            }
        }
        "file" => {
            let attrs = FileAttrs {
                size: entry.size.unwrap_or(0),
                last_modified: entry.last_modified.unwrap_or_else(Utc::now),
                etag: entry.etag.clone(),
                media_type: entry.media_type.clone(),
                visibility: entry.visibility.unwrap_or_default(),
            };
            tree.add_file(parent, &entry.name, attrs)
                .with_context(|| format!("Invalid file entry {:?}", entry.name))?;
        }
        other => {
            anyhow::bail!("Unknown resource type {other:?} for entry {:?}", entry.name);
        }
    }
    Ok(())
}

fn wire_ticket_to_domain(wire: WireTicket) -> Result<Ticket> {
    let state = match wire.state.as_str() {
        "created" => TicketState::Created,
        "active" => TicketState::Active,
        "busy" => TicketState::Busy,
        "completed" => TicketState::Completed,
        "failed" => TicketState::Failed,
        other => anyhow::bail!("Unknown ticket state {other:?} for ticket {}", wire.id),
    };
    Ok(Ticket {
        id: TicketId::new(wire.id)?,
        state,
        provider: TicketProvider::from(wire.provider),
        created: wire.date_created,
        data: wire.data,
    })
}

// ============================================================================
// Session-scoped ticket operations
// ============================================================================

/// Lists every ticket of the current session
pub async fn browse_all_tickets(client: &RpcClient) -> Result<Vec<Ticket>> {
    let result: BrowseTicketsResult = client
        .call("Api.BrowseTickets", serde_json::json!({}), "tickets")
        .await?;
    result
        .tickets
        .into_iter()
        .map(wire_ticket_to_domain)
        .collect()
}

/// Closes a ticket by id, without the idempotent-close leniency of the
/// transport trait; an unknown id is reported to the caller
pub async fn close_session_ticket(client: &RpcClient, id: &TicketId) -> Result<()> {
    let _: bool = client
        .call("Api.CloseTicket", TicketParams { id: id.as_str() }, id.as_str())
        .await?;
    Ok(())
}

// ============================================================================
// WebAppTransport
// ============================================================================

/// Device Web API adapter scoped to one web application
pub struct WebAppTransport {
    client: Arc<RpcClient>,
    app_name: String,
}

impl WebAppTransport {
    /// Creates a transport for `app_name` over an authenticated client
    pub fn new(client: Arc<RpcClient>, app_name: impl Into<String>) -> Self {
        Self {
            client,
            app_name: app_name.into(),
        }
    }

    /// The web application this transport addresses
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    fn subject(&self, path: &ResourcePath) -> String {
        format!("{}/{}", self.app_name, path)
    }
}

impl std::fmt::Debug for WebAppTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebAppTransport")
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl IRpcTransport for WebAppTransport {
    async fn create_resource(
        &self,
        path: &ResourcePath,
        meta: &ResourceMeta,
    ) -> Result<TicketId> {
        let params = CreateResourceParams {
            app_name: &self.app_name,
            name: path.as_str(),
            media_type: meta.media_type.as_deref(),
            last_modified: meta.last_modified,
            visibility: meta.visibility,
            etag: meta.etag.as_deref(),
        };
        let raw: String = self
            .client
            .call("WebApp.CreateResource", params, &self.subject(path))
            .await?;
        TicketId::new(raw).context("Device returned a malformed ticket id")
    }

    async fn download_resource(&self, path: &ResourcePath) -> Result<TicketId> {
        let params = ResourceParams {
            app_name: &self.app_name,
            name: path.as_str(),
        };
        let raw: String = self
            .client
            .call("WebApp.DownloadResource", params, &self.subject(path))
            .await?;
        TicketId::new(raw).context("Device returned a malformed ticket id")
    }

    async fn delete_resource(&self, path: &ResourcePath) -> Result<()> {
        let params = ResourceParams {
            app_name: &self.app_name,
            name: path.as_str(),
        };
        let _: bool = self
            .client
            .call("WebApp.DeleteResource", params, &self.subject(path))
            .await?;
        Ok(())
    }

    async fn create_directory(&self, path: &ResourcePath) -> Result<()> {
        let params = ResourceParams {
            app_name: &self.app_name,
            name: path.as_str(),
        };
        let _: bool = self
            .client
            .call("WebApp.CreateDirectory", params, &self.subject(path))
            .await?;
        Ok(())
    }

    async fn delete_directory(&self, path: &ResourcePath) -> Result<()> {
        let params = ResourceParams {
            app_name: &self.app_name,
            name: path.as_str(),
        };
        let _: bool = self
            .client
            .call("WebApp.DeleteDirectory", params, &self.subject(path))
            .await?;
        Ok(())
    }

    async fn browse_resource_tree(
        &self,
        path: Option<&ResourcePath>,
    ) -> Result<ResourceTree> {
        let subject = match path {
            Some(p) => self.subject(p),
            None => self.app_name.clone(),
        };
        let params = serde_json::json!({
            "app_name": self.app_name,
            "name": path.map(ResourcePath::as_str),
        });
        let result: BrowseResourcesResult = self
            .client
            .call("WebApp.BrowseResources", params, &subject)
            .await?;

        debug!(
            app = %self.app_name,
            entries = result.resources.len(),
            "Browsed resource tree"
        );
        build_tree(&self.app_name, &result.resources)
    }

    async fn browse_ticket(&self, id: &TicketId) -> Result<Ticket> {
        let result: BrowseTicketsResult = self
            .client
            .call("Api.BrowseTickets", TicketParams { id: id.as_str() }, id.as_str())
            .await?;

        let wire = result
            .tickets
            .into_iter()
            .find(|t| t.id == id.as_str())
            .ok_or_else(|| {
                anyhow::Error::new(TransportError::TicketNotFound(id.to_string()))
            })?;
        wire_ticket_to_domain(wire)
    }

    async fn close_ticket(&self, id: &TicketId) -> Result<()> {
        let result: Result<bool> = self
            .client
            .call("Api.CloseTicket", TicketParams { id: id.as_str() }, id.as_str())
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                // Closing an already-closed or unknown ticket is a no-op
                let ignorable = err
                    .chain()
                    .filter_map(|cause| cause.downcast_ref::<TransportError>())
                    .any(codes::ignorable_on_close);
                if ignorable {
                    warn!(ticket = %id, "Close on unknown ticket ignored");
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn download_ticket_content(&self, id: &TicketId) -> Result<Vec<u8>> {
        self.client.fetch_ticket_payload(id).await
    }

    async fn upload_ticket_content(&self, id: &TicketId, data: &[u8]) -> Result<()> {
        self.client.send_ticket_payload(id, data).await
    }
}
