//! Node Client Tests
//!
//! Registry calls against stub nodes, failure collapsing and timeouts.

use std::io::Write;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fractal_registry::protocol::{encode_response, read_request, RpcResponse};
use fractal_registry::{ClusterNode, ErrorKind, NodeClient, RoutingKey};
use serde_json::json;

use crate::common::{closed_port, spawn_failing_node, spawn_node, spawn_node_with_idle_timeout};

fn client_at(addr: SocketAddr, timeout_ms: u64) -> NodeClient {
    NodeClient::new(ClusterNode::from_addr(addr), Duration::from_millis(timeout_ms))
}

// =============================================================================
// Successful Calls
// =============================================================================

#[test]
fn test_set_get_remove() {
    let node = spawn_node();
    let client = client_at(node.addr(), 2000);
    let key = RoutingKey::new("usertable", "user1");

    assert!(client.set_registry("set_registry", &key, "payload"));
    assert_eq!(node.store().get("/usertable/user1").as_deref(), Some("payload"));

    assert!(client.get_registry("get_registry", &key));
    let response = client.response().unwrap();
    assert_eq!(response.result_val().unwrap(), "payload");
    assert_eq!(client.last_error(), None);

    assert!(client.remove_registry("remove_registry", &key));
    assert!(node.store().is_empty());
}

#[test]
fn test_connection_is_reused() {
    let node = spawn_node();
    let client = client_at(node.addr(), 2000);
    let key = RoutingKey::new("t", "k");

    assert!(!client.is_connected());
    for _ in 0..10 {
        assert!(client.set_registry("set_registry", &key, "v"));
        assert!(client.is_connected());
    }
    assert_eq!(node.store().calls("set_registry"), 10);
}

#[test]
fn test_concurrent_callers_share_client() {
    let node = spawn_node();
    let client = Arc::new(client_at(node.addr(), 2000));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for i in 0..50 {
                    let key = RoutingKey::new("t", &format!("{}-{}", t, i));
                    assert!(client.set_registry("set_registry", &key, "v"));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(node.store().len(), 200);
}

#[test]
fn test_call_registry_returns_own_response() {
    let node = spawn_node();
    let client = Arc::new(client_at(node.addr(), 2000));
    let mine = RoutingKey::new("t", "reader");
    assert!(client.set_registry("set_registry", &mine, "reader-payload"));

    let writer = {
        let client = Arc::clone(&client);
        thread::spawn(move || {
            for i in 0..500 {
                let key = RoutingKey::new("t", &format!("w{}", i));
                assert!(client.set_registry("set_registry", &key, "writer-payload"));
            }
        })
    };

    for _ in 0..500 {
        let response = client.call_registry("get_registry", &mine, None).unwrap();
        assert_eq!(response.result_val().unwrap(), "reader-payload");
    }

    writer.join().unwrap();
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_missing_key_is_remote_failure() {
    let node = spawn_node();
    let client = client_at(node.addr(), 2000);
    let key = RoutingKey::new("t", "missing");

    assert!(!client.get_registry("get_registry", &key));
    assert!(client.response().is_none());
    assert_eq!(client.last_error(), Some(ErrorKind::Remote));

    // Connection stays usable after a remote error
    assert!(client.is_connected());
    assert!(client.set_registry("set_registry", &key, "v"));
    assert_eq!(client.last_error(), None);
}

#[test]
fn test_unknown_method_is_remote_failure() {
    let node = spawn_node();
    let client = client_at(node.addr(), 2000);

    assert!(!client.set_registry("put", &RoutingKey::new("t", "k"), "v"));
    assert_eq!(client.last_error(), Some(ErrorKind::Remote));
    assert!(node.store().is_empty());
}

#[test]
fn test_failing_node() {
    let node = spawn_failing_node();
    let client = client_at(node.addr(), 2000);
    let key = RoutingKey::new("t", "k");

    assert!(!client.set_registry("set_registry", &key, "v"));
    assert!(!client.get_registry("get_registry", &key));
    assert!(!client.remove_registry("remove_registry", &key));
    assert_eq!(client.last_error(), Some(ErrorKind::Remote));
}

#[test]
fn test_connection_refused() {
    let addr: SocketAddr = format!("127.0.0.1:{}", closed_port()).parse().unwrap();
    let client = client_at(addr, 2000);

    assert!(!client.set_registry("set_registry", &RoutingKey::new("t", "k"), "v"));
    assert_eq!(client.last_error(), Some(ErrorKind::Transport));
    assert!(!client.is_connected());
}

#[test]
fn test_silent_node_times_out() {
    // Accepted by the kernel backlog, never answered
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = client_at(listener.local_addr().unwrap(), 200);

    let started = Instant::now();
    assert!(!client.get_registry("get_registry", &RoutingKey::new("t", "k")));
    let elapsed = started.elapsed();

    assert_eq!(client.last_error(), Some(ErrorKind::Timeout));
    assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
    assert!(!client.is_connected());

    drop(listener);
}

#[test]
fn test_trickling_node_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    // Answers correctly, one byte every 100ms
    let stub = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream).unwrap();
        let response = RpcResponse::success(
            Some(request.id),
            json!({ "key": request.params.key, "val": "slow" }),
        );
        for byte in encode_response(&response).unwrap() {
            thread::sleep(Duration::from_millis(100));
            if stream.write_all(&[byte]).is_err() {
                break;
            }
        }
    });

    let client = client_at(addr, 300);
    let started = Instant::now();
    assert!(!client.get_registry("get_registry", &RoutingKey::new("t", "k")));
    let elapsed = started.elapsed();

    assert_eq!(client.last_error(), Some(ErrorKind::Timeout));
    assert!(elapsed < Duration::from_millis(1000), "took {:?}", elapsed);
    assert!(!client.is_connected());

    drop(client);
    stub.join().unwrap();
}

#[test]
fn test_reconnects_after_connection_dropped() {
    let node = spawn_node_with_idle_timeout(100);
    let client = client_at(node.addr(), 2000);
    let key = RoutingKey::new("t", "k");

    assert!(client.set_registry("set_registry", &key, "v1"));

    // Node closes the idle connection
    thread::sleep(Duration::from_millis(400));

    // The stale connection fails once and is discarded
    assert!(!client.set_registry("set_registry", &key, "v2"));
    assert_eq!(client.last_error(), Some(ErrorKind::Transport));
    assert!(!client.is_connected());

    assert!(client.set_registry("set_registry", &key, "v3"));
    assert_eq!(node.store().get("/t/k").as_deref(), Some("v3"));
}
