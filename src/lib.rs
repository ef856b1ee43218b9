//! # Fractal Registry Client
//!
//! A workload-driver binding for a cluster of registry nodes:
//! - Consistent-hash routing of record keys to nodes
//! - JSON-RPC `set` / `get` / `remove` calls over persistent TCP connections
//! - Percent-escaped JSON record payloads
//! - A read/insert/update/delete/scan facade with flat OK/ERROR results
//! - An in-memory registry node for local runs and tests
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Workload Driver                           │
//! │              (one FractalClient per worker)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ read / insert / update / delete
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Facade  +  Codec                            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ /table/key
//!          ┌────────────▼────────────┐
//!          │   Router (hash ring)    │
//!          └────────────┬────────────┘
//!                       │ node index
//!          ┌────────────▼────────────┐
//!          │  NodeClient (per node)  │
//!          └────────────┬────────────┘
//!                       │ JSON-RPC frames over TCP
//!                       ▼
//!              ┌─────────────────┐
//!              │  Registry Node  │
//!              └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod routing;
pub mod protocol;
pub mod network;
pub mod registry;
pub mod facade;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, FractalError, Result};
pub use config::{ClientConfig, Methods, ServerConfig};
pub use codec::{PartialRecord, Record};
pub use routing::{ClusterNode, Router, RoutingKey};
pub use network::{NodeClient, RegistryServer, ServerHandle};
pub use facade::{Db, FractalClient, Status};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
