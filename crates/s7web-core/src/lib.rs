//! s7web Core - Domain logic and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Ticket`, `ResourceTree`, `SyncPlan`, validated
//!   newtypes (`TicketId`, `ResourcePath`)
//! - **Port definitions** - Traits for adapters: `IRpcTransport`,
//!   `ILocalSource`, `IProgressObserver`
//! - **Configuration** - YAML-backed settings consumed at construction time
//!
//! # Architecture
//!
//! The domain module contains pure business types with no I/O. Ports define
//! trait interfaces that adapter crates implement (`s7web-rpc` for the
//! device's JSON-RPC API, `s7web-deploy::scanner` for the local filesystem).
//! The transfer and deployment engines in `s7web-transfer` / `s7web-deploy`
//! orchestrate domain entities through the port interfaces only.

pub mod config;
pub mod domain;
pub mod ports;
