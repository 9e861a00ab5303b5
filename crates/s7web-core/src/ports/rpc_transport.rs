//! RPC transport port (driven/secondary port)
//!
//! Defines the interface the core requires from the device's JSON-RPC Web
//! API. The primary implementation targets the S7 webserver in `s7web-rpc`,
//! but the trait is deliberately narrow: it covers only the browse, ticket
//! and resource operations the transfer and deployment engines consume.
//!
//! ## Design Notes
//!
//! - Methods return `anyhow::Result` because failures at the port boundary
//!   are adapter-specific. Adapters attach a [`TransportError`] to the chain
//!   for conditions the core must distinguish (see [`is_not_found`]).
//! - An implementation is scoped to one web application; resource paths are
//!   relative to that application's root.
//! - `close_ticket` must be idempotent: a device-side "ticket not found"
//!   on close is swallowed by the adapter, never surfaced to the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::newtypes::{ResourcePath, TicketId};
use crate::domain::resource::{ResourceTree, Visibility};
use crate::domain::ticket::Ticket;

// ============================================================================
// TransportError
// ============================================================================

/// Classified transport failures the core reacts to
///
/// Adapters map the device's numeric error codes onto these variants and
/// attach them to the `anyhow` chain. The core only ever inspects
/// [`TransportError::NotFound`] (fresh-deploy detection); everything else is
/// propagated unchanged to the caller.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The addressed entity does not exist on the device
    #[error("Entity does not exist: {0}")]
    NotFound(String),

    /// The addressed entity already exists
    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    /// The entity is in use by another operation
    #[error("Entity in use: {0}")]
    EntityInUse(String),

    /// The authenticated session lacks the required permission
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The device is busy and cannot take the request now
    #[error("System is busy")]
    SystemBusy,

    /// The device has no free resources (e.g. ticket slots) left
    #[error("No resources available on the device")]
    NoResources,

    /// The referenced ticket is unknown to the device
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    /// Any other device-reported error, kept with its numeric code
    #[error("Device error {code}: {message}")]
    Device {
        /// The device's numeric error code
        code: i64,
        /// The device's error message
        message: String,
    },
}

/// Whether an error chain bottoms out in a "does not exist" condition
///
/// Used by the deployment engine to turn a failed browse of the desired
/// root into the fresh-deploy path instead of a hard failure.
#[must_use]
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<TransportError>(),
            Some(TransportError::NotFound(_))
        )
    })
}

// ============================================================================
// ResourceMeta
// ============================================================================

/// Metadata supplied when creating a file resource on the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMeta {
    /// Media type served for the resource (e.g. `text/css`)
    pub media_type: Option<String>,
    /// Modification timestamp recorded on the device
    pub last_modified: DateTime<Utc>,
    /// Public or protected serving
    pub visibility: Visibility,
    /// Optional content identity the device should record
    pub etag: Option<String>,
}

// ============================================================================
// IRpcTransport trait
// ============================================================================

/// Port trait for device Web API operations
///
/// Every method is a suspension point; timeouts are the adapter's concern.
/// One implementation instance is bound to one web application on one
/// device session.
#[async_trait::async_trait]
pub trait IRpcTransport: Send + Sync {
    /// Announces a new file resource; the device answers with a ticket
    /// whose ticketing endpoint accepts the resource's bytes.
    async fn create_resource(
        &self,
        path: &ResourcePath,
        meta: &ResourceMeta,
    ) -> anyhow::Result<TicketId>;

    /// Requests a resource download; the device answers with a ticket
    /// whose ticketing endpoint serves the resource's bytes.
    async fn download_resource(&self, path: &ResourcePath) -> anyhow::Result<TicketId>;

    /// Deletes a file resource.
    async fn delete_resource(&self, path: &ResourcePath) -> anyhow::Result<()>;

    /// Creates an (empty) directory resource.
    async fn create_directory(&self, path: &ResourcePath) -> anyhow::Result<()>;

    /// Deletes a directory resource. The directory must already be empty;
    /// the deployment engine deletes contained files first.
    async fn delete_directory(&self, path: &ResourcePath) -> anyhow::Result<()>;

    /// Browses the application's resource structure.
    ///
    /// `path = None` browses the whole application. Fails with a
    /// [`TransportError::NotFound`] in the chain when the addressed entity
    /// does not exist (first-deploy detection).
    async fn browse_resource_tree(
        &self,
        path: Option<&ResourcePath>,
    ) -> anyhow::Result<ResourceTree>;

    /// Queries a single ticket's current state, provider, creation time
    /// and data payload.
    async fn browse_ticket(&self, id: &TicketId) -> anyhow::Result<Ticket>;

    /// Closes a ticket, freeing its device-side slot. Idempotent.
    async fn close_ticket(&self, id: &TicketId) -> anyhow::Result<()>;

    /// Fetches the byte payload bound to a download ticket.
    async fn download_ticket_content(&self, id: &TicketId) -> anyhow::Result<Vec<u8>>;

    /// Sends a byte payload to the endpoint bound to an upload ticket.
    async fn upload_ticket_content(&self, id: &TicketId, data: &[u8]) -> anyhow::Result<()>;
}
