//! Registry node client
//!
//! One [`NodeClient`] per cluster node. It keeps a persistent connection and
//! the outcome of the most recent call.
//!
//! The three registry calls never return errors: every failure collapses to
//! `false`, and [`NodeClient::last_error`] tells which kind of failure it was.
//! [`NodeClient::call_registry`] is the same call with the response and the
//! error handed back directly.

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{ErrorKind, FractalError, Result};
use crate::protocol::{read_response, write_request, RpcRequest, RpcResponse};
use crate::routing::{ClusterNode, RoutingKey};

/// Socket half bounded by the deadline of the call in flight
///
/// Every read and write re-arms the socket timeout with the time left, so a
/// peer that trickles bytes cannot stretch a call past its deadline.
struct DeadlineStream {
    stream: TcpStream,
    deadline: Option<Instant>,
}

impl DeadlineStream {
    fn new(stream: TcpStream) -> Self {
        Self { stream, deadline: None }
    }

    fn remaining(&self) -> io::Result<Option<Duration>> {
        let Some(deadline) = self.deadline else {
            return Ok(None);
        };
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "call deadline passed"));
        }
        Ok(Some(left))
    }
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let left = self.remaining()?;
        self.stream.set_read_timeout(left)?;
        self.stream.read(buf)
    }
}

impl Write for DeadlineStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let left = self.remaining()?;
        self.stream.set_write_timeout(left)?;
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// An open connection to a node
struct RpcConnection {
    reader: BufReader<DeadlineStream>,
    writer: BufWriter<DeadlineStream>,
}

impl RpcConnection {
    /// Connect within `timeout`
    fn open(node: &ClusterNode, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect_timeout(&node.socket_addr(), timeout)
            .map_err(|e| timeout_or_io(e, format!("connect to {}", node)))?;

        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(DeadlineStream::new(read_stream)),
            writer: BufWriter::new(DeadlineStream::new(stream)),
        })
    }

    /// One request/response round trip finished before `deadline`
    fn call(&mut self, request: &RpcRequest, deadline: Instant) -> Result<RpcResponse> {
        self.reader.get_mut().deadline = Some(deadline);
        self.writer.get_mut().deadline = Some(deadline);

        write_request(&mut self.writer, request)
            .map_err(|e| timeout_or_err(e, format!("send {}", request.method)))?;

        let response = read_response(&mut self.reader)
            .map_err(|e| timeout_or_err(e, format!("await {}", request.method)))?;

        if response.id != Some(request.id) {
            return Err(FractalError::Protocol(format!(
                "response id {:?} does not match request id {}",
                response.id, request.id
            )));
        }

        Ok(response)
    }
}

fn timeout_or_io(e: std::io::Error, what: String) -> FractalError {
    match e.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            FractalError::Timeout(what)
        }
        _ => FractalError::Io(e),
    }
}

fn timeout_or_err(e: FractalError, what: String) -> FractalError {
    match e {
        FractalError::Io(io) => timeout_or_io(io, what),
        other => other,
    }
}

/// Mutable per-node state
#[derive(Default)]
struct NodeState {
    connection: Option<RpcConnection>,
    response: Option<RpcResponse>,
    error: Option<ErrorKind>,
}

/// Client for the registry methods of a single node
pub struct NodeClient {
    node: ClusterNode,
    timeout: Duration,
    next_id: AtomicU64,

    /// Held for the whole round trip; concurrent callers on the same node
    /// are serialized
    state: Mutex<NodeState>,
}

impl NodeClient {
    pub fn new(node: ClusterNode, timeout: Duration) -> Self {
        Self {
            node,
            timeout,
            next_id: AtomicU64::new(1),
            state: Mutex::new(NodeState::default()),
        }
    }

    pub fn node(&self) -> &ClusterNode {
        &self.node
    }

    // =========================================================================
    // Registry Methods
    // =========================================================================

    /// Store `payload` under `key`; true iff the node acknowledged
    pub fn set_registry(&self, method: &str, key: &RoutingKey, payload: &str) -> bool {
        self.call_registry(method, key, Some(payload)).is_ok()
    }

    /// Fetch `key`; on success the answer is available from [`NodeClient::response`]
    pub fn get_registry(&self, method: &str, key: &RoutingKey) -> bool {
        self.call_registry(method, key, None).is_ok()
    }

    /// Remove `key`; true iff the node acknowledged
    pub fn remove_registry(&self, method: &str, key: &RoutingKey) -> bool {
        self.call_registry(method, key, None).is_ok()
    }

    /// Perform one registry call and return its own response
    ///
    /// Unlike the boolean methods followed by [`NodeClient::response`], the
    /// answer cannot be replaced by another caller's call in between.
    pub fn call_registry(
        &self,
        method: &str,
        key: &RoutingKey,
        val: Option<&str>,
    ) -> Result<RpcResponse> {
        let mut state = self.state.lock();
        let started = Instant::now();

        match self.call(&mut state, method, key, val.map(str::to_string)) {
            Ok(response) => {
                tracing::debug!(
                    "{} {} on {} ok in {:?}",
                    method,
                    key,
                    self.node,
                    started.elapsed()
                );
                state.response = Some(response.clone());
                state.error = None;
                Ok(response)
            }
            Err(e) => {
                tracing::warn!("{} {} on {} failed: {}", method, key, self.node, e);
                state.response = None;
                state.error = Some(e.kind());
                Err(e)
            }
        }
    }

    /// Response of the last successful call (None after a failure)
    pub fn response(&self) -> Option<RpcResponse> {
        self.state.lock().response.clone()
    }

    /// Kind of the last failure (None after a success)
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.state.lock().error
    }

    /// Whether a connection is currently open
    pub fn is_connected(&self) -> bool {
        self.state.lock().connection.is_some()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Perform a call, reusing or re-opening the connection
    ///
    /// Connect, send and receive share one deadline. A connection that failed
    /// mid-call is dropped; a remote error leaves it open since the stream is
    /// still in sync.
    fn call(
        &self,
        state: &mut NodeState,
        method: &str,
        key: &RoutingKey,
        val: Option<String>,
    ) -> Result<RpcResponse> {
        let deadline = Instant::now() + self.timeout;

        let mut connection = match state.connection.take() {
            Some(connection) => connection,
            None => {
                tracing::debug!("Connecting to {}", self.node);
                RpcConnection::open(&self.node, self.timeout)?
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, key.as_str(), val);

        let response = connection.call(&request, deadline)?;
        state.connection = Some(connection);

        response.into_result()
    }
}
