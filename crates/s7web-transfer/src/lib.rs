//! s7web Transfer - Ticket lifecycle and file transfer engine
//!
//! Provides:
//! - Guaranteed ticket close on every exit path
//! - Completion verification with per-construction check toggles
//! - Download/upload orchestration with collision-free local naming
//!
//! ## Modules
//!
//! - [`lifecycle`] - Ticket open/verify/close discipline
//! - [`transfer`] - File download/upload around a ticket

pub mod lifecycle;
pub mod transfer;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use s7web_core::domain::newtypes::TicketId;
use s7web_core::domain::ticket::{TicketProvider, TicketState};

pub use lifecycle::TicketLifecycle;
pub use transfer::{DownloadOutcome, FileTransfer};

/// Errors raised by transfer operations
#[derive(Debug, Error)]
pub enum TransferError {
    /// The device did not report the ticket as `Completed`
    ///
    /// Carries the ticket's full diagnostic context so the failure can be
    /// understood without re-running with tracing enabled.
    #[error(
        "Ticket {id} not completed: state {state}, provider {provider}, created {created}"
    )]
    TicketNotCompleted {
        /// The ticket in question
        id: TicketId,
        /// The state the device reported instead
        state: TicketState,
        /// The operation that created the ticket
        provider: TicketProvider,
        /// When the device created the ticket
        created: DateTime<Utc>,
    },

    /// The download target directory does not exist
    #[error("Target directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// The device served a zero-length payload
    #[error("Ticket {0} delivered empty content")]
    EmptyContent(TicketId),

    /// An I/O error during local file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A domain-level validation failure
    #[error("Domain error: {0}")]
    Domain(#[from] s7web_core::domain::errors::DomainError),
}
