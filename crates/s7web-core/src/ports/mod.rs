//! Port definitions (trait interfaces for adapters)
//!
//! - [`rpc_transport`] - device Web API operations the core consumes
//! - [`local_source`] - local directory scanning / file reading
//! - [`progress`] - advisory deployment progress notification

pub mod local_source;
pub mod progress;
pub mod rpc_transport;

pub use local_source::{ILocalSource, IgnoreConfig};
pub use progress::{IProgressObserver, NoopProgress};
pub use rpc_transport::{is_not_found, IRpcTransport, ResourceMeta, TransportError};
