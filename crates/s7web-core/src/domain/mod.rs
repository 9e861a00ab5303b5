//! Domain entities and value types
//!
//! Pure business types with no I/O: validated identifiers, the ticket
//! lifecycle entity, the arena-based resource tree, and the synchronization
//! plan DTO.

pub mod errors;
pub mod newtypes;
pub mod plan;
pub mod resource;
pub mod ticket;

pub use errors::DomainError;
pub use newtypes::{ResourcePath, TicketId, TICKET_ID_LEN};
pub use plan::SyncPlan;
pub use resource::{FileAttrs, NodeIndex, ResourceKind, ResourceNode, ResourceTree, Visibility};
pub use ticket::{Ticket, TicketProvider, TicketState};
