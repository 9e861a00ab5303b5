//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for device identifiers and resource paths.
//! Each newtype ensures validity at construction time, so that malformed
//! values are rejected before any network call is made.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// TicketId
// ============================================================================

/// Length of every ticket id issued by the device
pub const TICKET_ID_LEN: usize = 28;

/// A device-issued ticket identifier
///
/// The webserver issues opaque 28-character ids for every ticket. Any other
/// length is rejected client-side, before a request carrying the id is sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Create a TicketId, validating the 28-character length requirement
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.len() != TICKET_ID_LEN {
            return Err(DomainError::InvalidTicketId {
                got: value.len(),
                value,
            });
        }
        Ok(Self(value))
    }

    /// Get the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TicketId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ============================================================================
// ResourcePath
// ============================================================================

/// A relative, `/`-separated path identifying a resource below an application root
///
/// Invariants enforced at construction:
/// - not empty
/// - no leading or trailing `/`
/// - no empty segments (`a//b`)
/// - no `.` or `..` segments
/// - no backslashes (the device only understands forward slashes)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourcePath(String);

impl ResourcePath {
    /// Create a ResourcePath, validating format
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::InvalidResourcePath(
                "path must not be empty".to_string(),
            ));
        }
        if value.contains('\\') {
            return Err(DomainError::InvalidResourcePath(format!(
                "backslash in path: {value}"
            )));
        }
        if value.starts_with('/') || value.ends_with('/') {
            return Err(DomainError::InvalidResourcePath(format!(
                "leading or trailing slash: {value}"
            )));
        }
        for segment in value.split('/') {
            if segment.is_empty() {
                return Err(DomainError::InvalidResourcePath(format!(
                    "empty segment in path: {value}"
                )));
            }
            if segment == "." || segment == ".." {
                return Err(DomainError::InvalidResourcePath(format!(
                    "relative segment in path: {value}"
                )));
            }
        }
        Ok(Self(value))
    }

    /// Get the path as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path segment (the resource's own name)
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The parent path, or `None` for a top-level resource
    #[must_use]
    pub fn parent(&self) -> Option<ResourcePath> {
        self.0.rfind('/').map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Append a child segment, producing a nested path
    pub fn join(&self, segment: &str) -> Result<ResourcePath, DomainError> {
        Self::new(format!("{}/{segment}", self.0))
    }

    /// Iterate over the individual path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Number of segments (nesting depth, 1 for a top-level resource)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourcePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
