//! File transfer around a ticket
//!
//! Orchestrates one download or upload: ticket creation happens upstream
//! (the provider RPC), this module moves the bytes, verifies completion and
//! guarantees the close via [`TicketLifecycle::finish`]. Local naming never
//! clobbers existing files unless overwrite is configured; a colliding name
//! gets an incrementing counter suffix before the extension.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use s7web_core::config::TransferConfig;
use s7web_core::domain::newtypes::{ResourcePath, TicketId};
use s7web_core::domain::ticket::Ticket;
use s7web_core::ports::rpc_transport::IRpcTransport;

use crate::lifecycle::{Direction, TicketLifecycle};
use crate::TransferError;

/// Result of a completed download
#[derive(Debug)]
pub struct DownloadOutcome {
    /// The verified ticket, `None` when the completion check is disabled
    pub ticket: Option<Ticket>,
    /// Where the payload was written
    pub path: PathBuf,
}

/// Moves file content through the ticketing endpoint
pub struct FileTransfer {
    transport: Arc<dyn IRpcTransport>,
    lifecycle: TicketLifecycle,
    overwrite: bool,
}

impl FileTransfer {
    /// Creates a transfer engine sharing the lifecycle's transport
    pub fn new(transport: Arc<dyn IRpcTransport>, config: &TransferConfig) -> Self {
        Self {
            lifecycle: TicketLifecycle::new(transport.clone(), config),
            transport,
            overwrite: config.overwrite_downloads,
        }
    }

    /// The lifecycle manager backing this engine
    #[must_use]
    pub fn lifecycle(&self) -> &TicketLifecycle {
        &self.lifecycle
    }

    /// Downloads a ticket's payload into an existing directory
    ///
    /// The target directory must already exist; nothing is created
    /// implicitly on this path. The ticket is closed on every exit.
    pub async fn download_to_dir(
        &self,
        id: &TicketId,
        dir: &Path,
        file_name: &str,
    ) -> Result<DownloadOutcome> {
        let primary = async {
            if !tokio::fs::try_exists(dir).await.unwrap_or(false)
                || !tokio::fs::metadata(dir).await?.is_dir()
            {
                return Err(TransferError::DirectoryNotFound(dir.to_path_buf()).into());
            }
            self.fetch_and_write(id, dir, file_name).await
        }
        .await;
        self.lifecycle.finish(id, primary).await
    }

    /// Downloads a ticket's payload for a nested resource name
    ///
    /// Path-construction variant: intermediate directories for the path's
    /// parent segments are created below `base_dir` as needed.
    pub async fn download_nested(
        &self,
        id: &TicketId,
        base_dir: &Path,
        resource: &ResourcePath,
    ) -> Result<DownloadOutcome> {
        let primary = async {
            let dir = match resource.parent() {
                Some(parent) => base_dir.join(parent.as_str()),
                None => base_dir.to_path_buf(),
            };
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            self.fetch_and_write(id, &dir, resource.name()).await
        }
        .await;
        self.lifecycle.finish(id, primary).await
    }

    async fn fetch_and_write(
        &self,
        id: &TicketId,
        dir: &Path,
        file_name: &str,
    ) -> Result<DownloadOutcome> {
        let payload = self.transport.download_ticket_content(id).await?;
        if payload.is_empty() {
            return Err(TransferError::EmptyContent(id.clone()).into());
        }

        let target = if self.overwrite {
            dir.join(file_name)
        } else {
            next_free_path(dir, file_name)
        };
        tokio::fs::write(&target, &payload)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;
        debug!(ticket = %id, path = %target.display(), len = payload.len(), "Payload written");

        let ticket = self.lifecycle.verify(id, Direction::Download).await?;
        info!(ticket = %id, path = %target.display(), "Download finished");
        Ok(DownloadOutcome { ticket, path: target })
    }

    /// Uploads a local file's bytes to the ticket's endpoint
    ///
    /// The ticket is closed on every exit, including a missing local file.
    pub async fn upload_from(&self, id: &TicketId, file: &Path) -> Result<Option<Ticket>> {
        let primary = async {
            let data = tokio::fs::read(file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            self.send_and_verify(id, &data).await
        }
        .await;
        self.lifecycle.finish(id, primary).await
    }

    /// Uploads an in-memory payload to the ticket's endpoint
    ///
    /// Used by the deployment engine, which reads content through its
    /// local-source port. The ticket is closed on every exit.
    pub async fn upload_bytes(&self, id: &TicketId, data: &[u8]) -> Result<Option<Ticket>> {
        let primary = self.send_and_verify(id, data).await;
        self.lifecycle.finish(id, primary).await
    }

    async fn send_and_verify(&self, id: &TicketId, data: &[u8]) -> Result<Option<Ticket>> {
        self.transport.upload_ticket_content(id, data).await?;
        debug!(ticket = %id, len = data.len(), "Payload sent");
        let ticket = self.lifecycle.verify(id, Direction::Upload).await?;
        info!(ticket = %id, "Upload finished");
        Ok(ticket)
    }
}

impl std::fmt::Debug for FileTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTransfer")
            .field("overwrite", &self.overwrite)
            .finish_non_exhaustive()
    }
}

/// Picks a non-colliding path in `dir` for `file_name`
///
/// Tries the plain name first, then `name(0).ext`, `name(1).ext`, ...
fn next_free_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };

    for counter in 0u32.. {
        let name = match ext {
            Some(ext) => format!("{stem}({counter}).{ext}"),
            None => format!("{stem}({counter})"),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("counter space exhausted");
}
