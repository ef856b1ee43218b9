//! Shared helpers: stub registry nodes and clients wired to them

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use fractal_registry::{
    ClientConfig, ClusterNode, FractalClient, Methods, RegistryServer, Router, ServerConfig,
    ServerHandle,
};

/// Start a registry node on an ephemeral loopback port
pub fn spawn_node() -> ServerHandle {
    spawn_node_with(ServerConfig::builder())
}

/// Start a node that answers every call with an error
pub fn spawn_failing_node() -> ServerHandle {
    spawn_node_with(ServerConfig::builder().fail_all(true))
}

/// Start a node answering to custom method names
pub fn spawn_node_with_methods(methods: Methods) -> ServerHandle {
    spawn_node_with(ServerConfig::builder().methods(methods))
}

/// Start a node that drops connections idle for `ms`
pub fn spawn_node_with_idle_timeout(ms: u64) -> ServerHandle {
    spawn_node_with(ServerConfig::builder().read_timeout_ms(ms))
}

/// Start a node with `count` workers up front
pub fn spawn_node_with_workers(count: usize) -> ServerHandle {
    spawn_node_with(ServerConfig::builder().workers(count))
}

fn spawn_node_with(builder: fractal_registry::config::ServerConfigBuilder) -> ServerHandle {
    let config = builder.listen_addr("127.0.0.1:0").build();
    RegistryServer::spawn(config).unwrap()
}

/// Client config pointing at a single node
pub fn config_for(node: &ServerHandle) -> ClientConfig {
    ClientConfig::builder()
        .hosts(["127.0.0.1"])
        .port(node.port())
        .timeout_ms(2000)
        .build()
        .unwrap()
}

/// Facade talking to a single node
pub fn client_for(node: &ServerHandle) -> FractalClient {
    FractalClient::new(Arc::new(config_for(node))).unwrap()
}

/// Router over several nodes on different ports
pub fn router_for(nodes: &[&ServerHandle]) -> Router {
    Router::from_nodes(nodes.iter().map(|n| ClusterNode::from_addr(n.addr())).collect())
}

/// A loopback port with nothing listening on it
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
