//! Routing Module
//!
//! Maps a logical record key to the cluster node responsible for it.
//!
//! ## Responsibilities
//! - Derive the routing key `/{table}/{key}`
//! - Resolve configured hosts into a fixed, ordered node set
//! - Pick a node per key with a consistent-hash ring
//!
//! ## Ring Layout
//! ```text
//!        0 ──────────────────────────────────────── u32::MAX
//!        │   ▲A#0     ▲B#0   ▲A#1        ▲C#0   ▲B#1  │
//!        │                                            │
//!   key hash ──────▶ first point at or after it (wrapping)
//! ```
//! Every node owns `VIRTUAL_POINTS` positions so that small clusters still
//! spread keys across all members.

mod node;
mod ring;

pub use node::{ClusterNode, RoutingKey};
pub use ring::{Router, VIRTUAL_POINTS};
