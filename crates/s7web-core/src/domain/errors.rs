//! Domain error types
//!
//! This module defines error types for domain-level validation failures:
//! malformed ticket ids, invalid resource paths, illegal state transitions
//! and bad deployment configuration. These errors are raised before any
//! device I/O happens.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Ticket id has the wrong length (the device issues exactly 28 characters)
    #[error("Invalid ticket id: expected 28 characters, got {got} ({value:?})")]
    InvalidTicketId {
        /// The rejected value
        value: String,
        /// Its actual length
        got: usize,
    },

    /// Invalid resource path format or content
    #[error("Invalid resource path: {0}")]
    InvalidResourcePath(String),

    /// Deployment retry count must be at least 1
    #[error("Invalid retry count: {0} (minimum is 1)")]
    InvalidRetryCount(u32),

    /// Invalid ticket state transition attempt
    #[error("Invalid ticket state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// A file node was given children, or a directory node byte content
    #[error("Resource kind mismatch: {0}")]
    MixedResourceKind(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
