//! Network Module
//!
//! TCP client and server for the registry protocol.
//!
//! ## Architecture
//! - Client: one `NodeClient` per cluster node, persistent connection,
//!   bounded timeouts
//! - Server: single acceptor thread, worker thread pool for connections,
//!   requests executed against a `RegistryStore`

mod client;
mod connection;
mod server;

pub use client::NodeClient;
pub use connection::Connection;
pub use server::{wake, RegistryServer, ServerHandle};
