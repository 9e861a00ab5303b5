//! s7web Deploy - Directory synchronization engine
//!
//! Deploys a local directory to a web application on the device and keeps
//! re-converging until the device's reported structure matches the local
//! snapshot or the configured round budget runs out.
//!
//! ## Modules
//!
//! - [`differ`] - Pure tree diffing into add/update/delete plans
//! - [`scanner`] - Local directory scanning into resource trees
//! - [`synchronizer`] - Bounded-round plan application

pub mod differ;
pub mod scanner;
pub mod synchronizer;

use thiserror::Error;

use s7web_core::domain::errors::DomainError;
use s7web_core::domain::newtypes::ResourcePath;

pub use scanner::DirScanner;
pub use synchronizer::{DeployReport, Synchronizer};

/// Errors raised by the deployment engine
#[derive(Debug, Error)]
pub enum DeployError {
    /// The device still diverged from the local snapshot after the last
    /// permitted round
    #[error(
        "Deployment did not converge after {rounds} round(s); \
         missing or stale: [{}], unexpected on device: [{}]",
        format_paths(still_missing),
        format_paths(unexpected)
    )]
    DeploymentFailed {
        /// How many rounds were applied
        rounds: u32,
        /// Paths the device is missing or holds stale content for
        still_missing: Vec<ResourcePath>,
        /// Paths present on the device but absent locally
        unexpected: Vec<ResourcePath>,
    },

    /// The operation was cancelled between two applied operations
    #[error("Deployment cancelled")]
    Cancelled,

    /// A domain-level validation failure
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

fn format_paths(paths: &[ResourcePath]) -> String {
    paths
        .iter()
        .map(ResourcePath::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
