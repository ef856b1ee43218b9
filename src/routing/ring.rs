//! Consistent-hash router

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::error::{FractalError, Result};
use super::{ClusterNode, RoutingKey};

/// Ring positions owned by each node
pub const VIRTUAL_POINTS: usize = 64;

/// Resolves routing keys to cluster nodes
///
/// The node set and ring are built once and never change, so a router can be
/// cloned into every worker and read concurrently without locking.
#[derive(Debug, Clone)]
pub struct Router {
    /// Node set in configured order (duplicates removed)
    nodes: Arc<[ClusterNode]>,

    /// Ring position -> index into `nodes`
    ring: Arc<BTreeMap<u32, usize>>,
}

impl Router {
    /// Resolve every host and build the router
    ///
    /// Fails on the first host that does not resolve.
    pub fn configure<S: AsRef<str>>(hosts: &[S], port: u16) -> Result<Self> {
        let nodes = hosts
            .iter()
            .map(|host| ClusterNode::resolve(host.as_ref(), port))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_nodes(nodes))
    }

    /// Build a router from already resolved nodes
    pub fn from_nodes(nodes: Vec<ClusterNode>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if seen.insert(node.socket_addr()) {
                unique.push(node);
            } else {
                tracing::warn!("Ignoring duplicate node {}", node);
            }
        }

        let mut ring = BTreeMap::new();
        for (index, node) in unique.iter().enumerate() {
            for point in 0..VIRTUAL_POINTS {
                let position = hash(format!("{}#{}", node.socket_addr(), point).as_bytes());
                // First owner keeps a colliding position
                ring.entry(position).or_insert(index);
            }
        }

        Self {
            nodes: unique.into(),
            ring: Arc::new(ring),
        }
    }

    /// Index (into [`Router::nodes`]) of the node responsible for `key`
    pub fn locate(&self, key: &RoutingKey) -> Result<usize> {
        let position = hash(key.as_str().as_bytes());

        self.ring
            .range(position..)
            .next()
            .or_else(|| self.ring.iter().next())
            .map(|(_, &index)| index)
            .ok_or_else(|| {
                FractalError::Routing(format!("no node available for key {}", key))
            })
    }

    /// Node responsible for `key`
    pub fn route(&self, key: &RoutingKey) -> Result<&ClusterNode> {
        let index = self.locate(key)?;
        Ok(&self.nodes[index])
    }

    /// The node set, in configured order
    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// CRC32 followed by the murmur3 finalizer
///
/// CRC alone is linear, so near-identical inputs (`host#1`, `host#2`) land in
/// clusters. The finalizer spreads them over the whole ring.
fn hash(bytes: &[u8]) -> u32 {
    let mut h = crc32fast::hash(bytes);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}
