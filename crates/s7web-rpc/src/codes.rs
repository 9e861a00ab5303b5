//! Device error-code catalog
//!
//! The webserver reports failures as numeric JSON-RPC error codes. This
//! module is the exhaustive mapping from those codes onto the classified
//! [`TransportError`] variants the core reacts to; codes without a
//! classified meaning are preserved as [`TransportError::Device`] with
//! their number and message intact.

use s7web_core::ports::rpc_transport::TransportError;

/// Known numeric error codes reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // JSON-RPC envelope errors
    /// Request body was not valid JSON
    ParseError,
    /// Request envelope was malformed
    InvalidRequest,
    /// The method name is unknown to this firmware
    MethodNotFound,
    /// Parameters failed device-side validation
    InvalidParams,

    // General device errors
    /// Unspecified device-internal failure
    InternalError,
    /// The session lacks the required permission
    PermissionDenied,
    /// The device cannot take the request right now
    SystemIsBusy,
    /// No free device resources (e.g. ticket slots)
    NoResources,
    /// The device is in a read-only state
    SystemIsReadOnly,

    // Authentication
    /// Username/password rejected
    LoginFailed,
    /// The supplied password has expired
    PasswordExpired,

    // Web application / resource entities
    /// The addressed application does not exist
    ApplicationDoesNotExist,
    /// An application with that name already exists
    ApplicationAlreadyExists,
    /// The addressed resource does not exist
    ResourceDoesNotExist,
    /// A resource with that name already exists
    ResourceAlreadyExists,
    /// The transferred resource content failed the device's integrity check
    ResourceContentHasBeenCorrupted,
    /// The entity is locked by another operation
    EntityInUse,

    // Tickets
    /// The referenced ticket is unknown
    TicketNotFound,
}

impl ErrorCode {
    /// Resolve a numeric wire code, `None` for unknown codes
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        let known = match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            1 => Self::InternalError,
            2 => Self::PermissionDenied,
            4 => Self::SystemIsBusy,
            5 => Self::NoResources,
            6 => Self::SystemIsReadOnly,
            100 => Self::LoginFailed,
            102 => Self::PasswordExpired,
            200 => Self::ApplicationDoesNotExist,
            201 => Self::ApplicationAlreadyExists,
            203 => Self::ResourceDoesNotExist,
            204 => Self::ResourceAlreadyExists,
            205 => Self::ResourceContentHasBeenCorrupted,
            206 => Self::EntityInUse,
            300 => Self::TicketNotFound,
            _ => return None,
        };
        Some(known)
    }
}

/// Map a device error (code + message) onto the classified transport error
///
/// `subject` names the entity the failed call addressed; it ends up in the
/// diagnostic message of entity-scoped variants.
#[must_use]
pub fn classify(code: i64, message: &str, subject: &str) -> TransportError {
    match ErrorCode::from_code(code) {
        Some(ErrorCode::ApplicationDoesNotExist | ErrorCode::ResourceDoesNotExist) => {
            TransportError::NotFound(subject.to_string())
        }
        Some(ErrorCode::ApplicationAlreadyExists | ErrorCode::ResourceAlreadyExists) => {
            TransportError::AlreadyExists(subject.to_string())
        }
        Some(ErrorCode::EntityInUse) => TransportError::EntityInUse(subject.to_string()),
        Some(ErrorCode::PermissionDenied) => {
            TransportError::PermissionDenied(message.to_string())
        }
        Some(ErrorCode::SystemIsBusy) => TransportError::SystemBusy,
        Some(ErrorCode::NoResources) => TransportError::NoResources,
        Some(ErrorCode::TicketNotFound) => TransportError::TicketNotFound(subject.to_string()),
        _ => TransportError::Device {
            code,
            message: message.to_string(),
        },
    }
}

/// Whether a close call may swallow this error (idempotent close)
#[must_use]
pub fn ignorable_on_close(err: &TransportError) -> bool {
    matches!(err, TransportError::TicketNotFound(_) | TransportError::NotFound(_))
}
