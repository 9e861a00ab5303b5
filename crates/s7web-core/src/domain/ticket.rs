//! Ticket entity and lifecycle state machine
//!
//! A ticket is a device-issued handle for a pending byte transfer or other
//! long-running operation. The device creates it as a side effect of a
//! higher-level RPC (creating a resource, downloading a resource, restoring
//! a backup, ...), the client moves bytes through the ticketing endpoint,
//! and the device reports the outcome through the ticket's state.
//!
//! Tickets are a scarce, session-capped device resource: the client must
//! close every ticket it opened, on every exit path, and must never reuse
//! an id after close. That discipline lives in `s7web-transfer`; this module
//! only models the entity and its legal state transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::TicketId;

// ============================================================================
// TicketState
// ============================================================================

/// Processing state of a ticket as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    /// Issued, no data transferred yet
    Created,
    /// The client has started transferring data
    Active,
    /// The device is processing the transferred data
    Busy,
    /// Device-side processing finished successfully
    Completed,
    /// Device-side processing failed
    Failed,
}

impl TicketState {
    /// Whether the device may still change this state on its own
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Created | Self::Active | Self::Busy)
    }

    /// Whether a transition from `self` to `next` is legal
    ///
    /// Legal moves follow the transfer flow: Created → Active → Busy →
    /// Completed/Failed. Busy may be reported repeatedly while the device
    /// works, and any pending state may fail.
    #[must_use]
    pub fn can_transition_to(self, next: TicketState) -> bool {
        use TicketState::{Active, Busy, Completed, Created, Failed};
        match (self, next) {
            (Created, Active | Failed) => true,
            (Active, Busy | Completed | Failed) => true,
            (Busy, Busy | Completed | Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TicketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "Created",
            Self::Active => "Active",
            Self::Busy => "Busy",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// TicketProvider
// ============================================================================

/// The device-side operation that produced a ticket
///
/// The device reports the provider as a dotted method name
/// (e.g. `"WebApp.CreateResource"`). Unknown producers from newer firmware
/// are preserved verbatim in [`TicketProvider::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketProvider {
    /// `WebApp.CreateResource` - upload of a web application resource
    WebAppCreateResource,
    /// `WebApp.DownloadResource` - download of a web application resource
    WebAppDownloadResource,
    /// `Plc.CreateBackup` - download of a device backup image
    PlcCreateBackup,
    /// `Plc.RestoreBackup` - upload of a device backup image
    PlcRestoreBackup,
    /// `Files.Create` - upload of a file to the device filesystem
    FilesCreate,
    /// `Files.Download` - download of a file from the device filesystem
    FilesDownload,
    /// `Modules.DownloadServiceData` - service-data export (single-ticket kind)
    ModulesDownloadServiceData,
    /// A producer this client does not know about
    Other(String),
}

impl TicketProvider {
    /// The dotted wire name the device uses for this provider
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::WebAppCreateResource => "WebApp.CreateResource",
            Self::WebAppDownloadResource => "WebApp.DownloadResource",
            Self::PlcCreateBackup => "Plc.CreateBackup",
            Self::PlcRestoreBackup => "Plc.RestoreBackup",
            Self::FilesCreate => "Files.Create",
            Self::FilesDownload => "Files.Download",
            Self::ModulesDownloadServiceData => "Modules.DownloadServiceData",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for TicketProvider {
    fn from(s: String) -> Self {
        match s.as_str() {
            "WebApp.CreateResource" => Self::WebAppCreateResource,
            "WebApp.DownloadResource" => Self::WebAppDownloadResource,
            "Plc.CreateBackup" => Self::PlcCreateBackup,
            "Plc.RestoreBackup" => Self::PlcRestoreBackup,
            "Files.Create" => Self::FilesCreate,
            "Files.Download" => Self::FilesDownload,
            "Modules.DownloadServiceData" => Self::ModulesDownloadServiceData,
            _ => Self::Other(s),
        }
    }
}

impl From<TicketProvider> for String {
    fn from(p: TicketProvider) -> Self {
        p.as_wire().to_string()
    }
}

impl std::fmt::Display for TicketProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A ticket as reported by the device's browse-tickets call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// The 28-character ticket id
    pub id: TicketId,
    /// Current processing state
    pub state: TicketState,
    /// The operation that created this ticket
    pub provider: TicketProvider,
    /// When the device created the ticket
    pub created: DateTime<Utc>,
    /// Optional provider-specific payload attached by the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Ticket {
    /// Create a ticket in its initial state
    #[must_use]
    pub fn new(id: TicketId, provider: TicketProvider) -> Self {
        Self {
            id,
            state: TicketState::Created,
            provider,
            created: Utc::now(),
            data: None,
        }
    }

    /// Advance the ticket to `next`, validating the transition
    pub fn advance(&mut self, next: TicketState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidState {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Whether the device finished processing successfully
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state == TicketState::Completed
    }
}
