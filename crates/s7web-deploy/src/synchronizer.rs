//! Bounded-round synchronization
//!
//! Drives the deploy loop: scan the local directory once, then repeatedly
//! probe the device, diff, and apply the plan until the diff comes back
//! empty or the round budget is exhausted. Every applied operation is
//! best-effort within a round; a failed file does not abort the round, it
//! shows up again in the next diff and gets retried. Only cancellation and
//! probe failures abort immediately.
//!
//! The round budget is a convergence bound, not a per-file retry count: a
//! device that keeps rejecting the same file burns one round per attempt.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use s7web_core::config::Config;
use s7web_core::domain::errors::DomainError;
use s7web_core::domain::newtypes::ResourcePath;
use s7web_core::domain::plan::SyncPlan;
use s7web_core::domain::resource::{FileAttrs, ResourceKind, ResourceTree};
use s7web_core::ports::local_source::{IgnoreConfig, ILocalSource};
use s7web_core::ports::progress::{IProgressObserver, NoopProgress};
use s7web_core::ports::rpc_transport::{is_not_found, IRpcTransport, ResourceMeta};
use s7web_transfer::FileTransfer;

use crate::differ::{diff, plan_fresh_deploy};
use crate::DeployError;

/// Outcome of a converged deployment
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// Rounds applied; 0 means the device was already in sync
    pub rounds: u32,
    /// Files created on the device
    pub files_added: u32,
    /// Files replaced on the device
    pub files_updated: u32,
    /// Files and directories removed from the device
    pub files_deleted: u32,
    /// Per-operation failures that were retried in later rounds
    pub errors: Vec<String>,
    /// Wall-clock duration of the whole run
    pub duration_ms: u64,
}

/// Deploys a local directory to the device and re-converges until the
/// structures match
pub struct Synchronizer {
    transport: Arc<dyn IRpcTransport>,
    source: Arc<dyn ILocalSource>,
    transfer: FileTransfer,
    retries: u32,
    ignore: IgnoreConfig,
    observer: Arc<dyn IProgressObserver>,
    cancel: CancellationToken,
}

impl Synchronizer {
    /// Creates a synchronizer from the application config
    ///
    /// Fails fast on a zero round budget; a synchronizer that can never
    /// apply a plan is a configuration error, not a runtime condition.
    pub fn new(
        transport: Arc<dyn IRpcTransport>,
        source: Arc<dyn ILocalSource>,
        config: &Config,
    ) -> Result<Self, DomainError> {
        if config.deploy.retries == 0 {
            return Err(DomainError::InvalidRetryCount(0));
        }
        Ok(Self {
            transfer: FileTransfer::new(transport.clone(), &config.transfer),
            transport,
            source,
            retries: config.deploy.retries,
            ignore: config.deploy.ignore.clone(),
            observer: Arc::new(NoopProgress),
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the progress observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn IProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Attaches a cancellation token checked between applied operations
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Synchronizes `local_root` onto the device's web application
    ///
    /// Returns a report once the device's reported structure matches the
    /// local snapshot. Fails with [`DeployError::DeploymentFailed`] when the
    /// structures still diverge after the configured number of rounds, and
    /// with [`DeployError::Cancelled`] when the token fires between
    /// operations.
    pub async fn deploy_or_update(&self, local_root: &Path) -> Result<DeployReport> {
        let start = Instant::now();
        let desired = self
            .source
            .scan(local_root, &self.ignore)
            .await
            .with_context(|| format!("Failed to scan {}", local_root.display()))?;
        info!(
            root = %local_root.display(),
            nodes = desired.len(),
            "Starting deployment"
        );

        let mut report = DeployReport::default();
        let (observed, mut plan) = self.probe_and_plan(&desired).await?;
        if plan.is_empty() {
            info!("Device already in sync, nothing to do");
            report.duration_ms = elapsed_ms(start);
            return Ok(report);
        }
        let mut observed = observed;

        for round in 1..=self.retries {
            report.rounds = round;
            debug!(round, operations = plan.len(), "Applying plan");
            self.apply(&plan, observed.as_ref(), &desired, local_root, &mut report)
                .await?;

            let (next_observed, next_plan) = self.probe_and_plan(&desired).await?;
            if next_plan.is_empty() {
                info!(rounds = round, "Deployment converged");
                report.duration_ms = elapsed_ms(start);
                return Ok(report);
            }
            warn!(
                round,
                remaining = next_plan.len(),
                "Structures still diverge after round"
            );
            observed = next_observed;
            plan = next_plan;
        }

        let mut still_missing = plan.to_add;
        still_missing.extend(plan.to_update);
        still_missing.sort();
        Err(DeployError::DeploymentFailed {
            rounds: self.retries,
            still_missing,
            unexpected: plan.to_delete,
        }
        .into())
    }

    /// Browses the device and diffs against the desired tree
    ///
    /// A missing application root is the fresh-deploy case: no observed
    /// tree, and the plan adds everything.
    async fn probe_and_plan(
        &self,
        desired: &ResourceTree,
    ) -> Result<(Option<ResourceTree>, SyncPlan)> {
        match self.transport.browse_resource_tree(None).await {
            Ok(observed) => {
                let plan = diff(desired, &observed);
                Ok((Some(observed), plan))
            }
            Err(err) if is_not_found(&err) => {
                debug!("Application not present on device, planning fresh deploy");
                Ok((None, plan_fresh_deploy(desired)))
            }
            Err(err) => Err(err.context("Failed to browse device resources")),
        }
    }

    /// Applies one round of the plan, best-effort per operation
    ///
    /// Deletes run leaves-first so directories are empty by the time their
    /// own delete comes up; adds run parents-first so directories exist
    /// before their contents.
    async fn apply(
        &self,
        plan: &SyncPlan,
        observed: Option<&ResourceTree>,
        desired: &ResourceTree,
        local_root: &Path,
        report: &mut DeployReport,
    ) -> Result<()> {
        let total = plan.len();
        let mut processed = 0usize;

        let mut deletes = plan.to_delete.clone();
        deletes.sort_by(|a, b| b.cmp(a));
        for path in &deletes {
            self.checkpoint()?;
            let outcome = self.apply_delete(path, observed).await;
            self.record(outcome, path, &mut report.files_deleted, &mut report.errors);
            processed += 1;
            self.report_progress(processed, total);
        }

        for path in &plan.to_add {
            self.checkpoint()?;
            let outcome = self.apply_add(path, desired, local_root).await;
            self.record(outcome, path, &mut report.files_added, &mut report.errors);
            processed += 1;
            self.report_progress(processed, total);
        }

        for path in &plan.to_update {
            self.checkpoint()?;
            let outcome = self.apply_update(path, desired, local_root).await;
            self.record(outcome, path, &mut report.files_updated, &mut report.errors);
            processed += 1;
            self.report_progress(processed, total);
        }

        Ok(())
    }

    async fn apply_delete(
        &self,
        path: &ResourcePath,
        observed: Option<&ResourceTree>,
    ) -> Result<bool> {
        let is_dir = match observed {
            Some(tree) => tree
                .find(path)
                .is_some_and(|idx| tree.node(idx).is_directory()),
            None => false,
        };
        if is_dir {
            self.transport
                .delete_directory(path)
                .await
                .with_context(|| format!("Failed to delete directory {path}"))?;
        } else {
            self.transport
                .delete_resource(path)
                .await
                .with_context(|| format!("Failed to delete {path}"))?;
        }
        debug!(path = %path, "Deleted");
        Ok(true)
    }

    async fn apply_add(
        &self,
        path: &ResourcePath,
        desired: &ResourceTree,
        local_root: &Path,
    ) -> Result<bool> {
        let idx = desired
            .find(path)
            .ok_or_else(|| anyhow::anyhow!("Planned path {path} not in local snapshot"))?;
        match &desired.node(idx).kind {
            ResourceKind::Directory => {
                self.transport
                    .create_directory(path)
                    .await
                    .with_context(|| format!("Failed to create directory {path}"))?;
                debug!(path = %path, "Directory created");
                Ok(false)
            }
            ResourceKind::File(attrs) => {
                self.push_file(path, attrs, local_root).await?;
                debug!(path = %path, size = attrs.size, "File created");
                Ok(true)
            }
        }
    }

    async fn apply_update(
        &self,
        path: &ResourcePath,
        desired: &ResourceTree,
        local_root: &Path,
    ) -> Result<bool> {
        let idx = desired
            .find(path)
            .ok_or_else(|| anyhow::anyhow!("Planned path {path} not in local snapshot"))?;
        let attrs = match &desired.node(idx).kind {
            ResourceKind::File(attrs) => attrs,
            // Updates are only planned for files
            ResourceKind::Directory => {
                return Err(anyhow::anyhow!("Planned update for directory {path}"));
            }
        };
        // No in-place replace on the device: remove, then recreate
        self.transport
            .delete_resource(path)
            .await
            .with_context(|| format!("Failed to delete stale {path}"))?;
        self.push_file(path, attrs, local_root).await?;
        debug!(path = %path, size = attrs.size, "File updated");
        Ok(true)
    }

    /// Creates a file resource and uploads its bytes through a ticket
    ///
    /// The bytes are read before the ticket is opened so a local read
    /// failure never leaves a ticket to clean up.
    async fn push_file(
        &self,
        path: &ResourcePath,
        attrs: &FileAttrs,
        local_root: &Path,
    ) -> Result<()> {
        let data = self
            .source
            .read(local_root, path)
            .await
            .with_context(|| format!("Failed to read local file {path}"))?;
        let meta = ResourceMeta {
            media_type: attrs.media_type.clone(),
            last_modified: attrs.last_modified,
            visibility: attrs.visibility,
            etag: attrs.etag.clone(),
        };
        let id = self
            .transport
            .create_resource(path, &meta)
            .await
            .with_context(|| format!("Failed to create resource {path}"))?;
        self.transfer
            .upload_bytes(&id, &data)
            .await
            .with_context(|| format!("Failed to upload {path}"))?;
        Ok(())
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(DeployError::Cancelled.into());
        }
        Ok(())
    }

    /// Folds one operation's outcome into the report counters
    ///
    /// `Ok(true)` counts as a file operation; directory operations succeed
    /// without bumping a counter. Failures are recorded and left for the
    /// next round's diff to pick up again.
    fn record(
        &self,
        outcome: Result<bool>,
        path: &ResourcePath,
        counter: &mut u32,
        errors: &mut Vec<String>,
    ) {
        match outcome {
            Ok(true) => *counter += 1,
            Ok(false) => {}
            Err(err) => {
                warn!(path = %path, error = %format!("{err:#}"), "Operation failed, will retry next round");
                errors.push(format!("{path}: {err:#}"));
            }
        }
    }

    fn report_progress(&self, processed: usize, total: usize) {
        if total == 0 {
            return;
        }
        let percent = (processed * 100 / total).min(100) as u8;
        self.observer.progress(percent);
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("retries", &self.retries)
            .field("ignore", &self.ignore)
            .finish_non_exhaustive()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
