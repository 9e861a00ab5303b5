//! s7web RPC - JSON-RPC Web API adapter
//!
//! Implements the core's [`IRpcTransport`] port against the device's
//! JSON-RPC webserver interface.
//!
//! ## Modules
//!
//! - [`client`] - JSON-RPC envelope handling, session header, raw ticket endpoint
//! - [`auth`] - `Api.Login` / `Api.Logout`
//! - [`codes`] - device error-code catalog and classification
//! - [`transport`] - `IRpcTransport` implementation scoped to a web application
//!
//! [`IRpcTransport`]: s7web_core::ports::rpc_transport::IRpcTransport

pub mod auth;
pub mod client;
pub mod codes;
pub mod transport;

pub use client::RpcClient;
pub use transport::{browse_all_tickets, close_session_ticket, WebAppTransport};
