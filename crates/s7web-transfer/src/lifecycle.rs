//! Ticket lifecycle discipline
//!
//! Tickets are a scarce device resource (the device caps concurrent tickets
//! per session), so the one hard rule of this module is: every opened ticket
//! is closed exactly once, on every exit path. Rust has no `finally`; the
//! discipline is expressed as [`TicketLifecycle::finish`], which takes the
//! primary operation's result, always performs the close, and resolves which
//! error wins: a close failure never masks a primary failure.
//!
//! Completion verification is optional per direction. Some firmwares
//! complete tickets asynchronously after the payload has been transferred;
//! for those, the constructor toggles skip the state assertion.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use s7web_core::config::TransferConfig;
use s7web_core::domain::newtypes::TicketId;
use s7web_core::domain::ticket::Ticket;
use s7web_core::ports::rpc_transport::IRpcTransport;

use crate::TransferError;

/// Direction of a transfer, selecting which completion-check toggle applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device to client
    Download,
    /// Client to device
    Upload,
}

/// Enforces the open/verify/close discipline around tickets
///
/// Check toggles are fixed at construction; there is no way to flip them
/// on a live instance.
pub struct TicketLifecycle {
    transport: Arc<dyn IRpcTransport>,
    check_after_download: bool,
    check_after_upload: bool,
}

impl TicketLifecycle {
    /// Creates a lifecycle manager with the given check toggles
    pub fn new(transport: Arc<dyn IRpcTransport>, config: &TransferConfig) -> Self {
        Self {
            transport,
            check_after_download: config.check_after_download,
            check_after_upload: config.check_after_upload,
        }
    }

    /// Awaits the RPC that creates a ticket as a side effect
    ///
    /// The returned id is already length-validated by the transport; from
    /// this point on the caller owes the device a close.
    pub async fn open(
        &self,
        provider_call: impl std::future::Future<Output = Result<TicketId>> + Send,
    ) -> Result<TicketId> {
        let id = provider_call.await?;
        debug!(ticket = %id, "Ticket opened");
        Ok(id)
    }

    /// Verifies the ticket reached `Completed`, honoring the direction's toggle
    ///
    /// Returns `Some(ticket)` when the check ran, `None` when it is disabled
    /// for this direction. A ticket in any other state fails with
    /// [`TransferError::TicketNotCompleted`] carrying the ticket's id, state,
    /// provider and creation time.
    pub async fn verify(
        &self,
        id: &TicketId,
        direction: Direction,
    ) -> Result<Option<Ticket>> {
        let enabled = match direction {
            Direction::Download => self.check_after_download,
            Direction::Upload => self.check_after_upload,
        };
        if !enabled {
            debug!(ticket = %id, ?direction, "Completion check disabled, skipping");
            return Ok(None);
        }

        let ticket = self.transport.browse_ticket(id).await?;
        if !ticket.is_completed() {
            return Err(TransferError::TicketNotCompleted {
                id: ticket.id.clone(),
                state: ticket.state,
                provider: ticket.provider.clone(),
                created: ticket.created,
            }
            .into());
        }
        Ok(Some(ticket))
    }

    /// Closes the ticket and resolves the operation's final result
    ///
    /// The close always runs, regardless of the primary result:
    /// - primary ok, close ok → ok
    /// - primary ok, close failed → the close error surfaces
    /// - primary failed, close ok → the primary error surfaces
    /// - both failed → the primary error surfaces, the close failure is logged
    pub async fn finish<T>(&self, id: &TicketId, primary: Result<T>) -> Result<T> {
        let close_result = self.transport.close_ticket(id).await;
        match close_result {
            Ok(()) => {
                debug!(ticket = %id, "Ticket closed");
                primary
            }
            Err(close_err) => match primary {
                Ok(_) => Err(close_err.context(format!("Failed to close ticket {id}"))),
                Err(primary_err) => {
                    warn!(
                        ticket = %id,
                        error = %close_err,
                        "Close failed after primary error, surfacing primary"
                    );
                    Err(primary_err)
                }
            },
        }
    }
}

impl std::fmt::Debug for TicketLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketLifecycle")
            .field("check_after_download", &self.check_after_download)
            .field("check_after_upload", &self.check_after_upload)
            .finish_non_exhaustive()
    }
}
