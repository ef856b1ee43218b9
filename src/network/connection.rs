//! Connection Handler
//!
//! Handles individual client connections on a registry node.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{FractalError, Result};
use crate::protocol::{
    read_frame, write_response, FrameKind, RpcRequest, RpcResponse, INVALID_REQUEST, PARSE_ERROR,
};
use crate::registry::RegistryStore;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Registry served by this node
    store: Arc<RegistryStore>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, store: Arc<RegistryStore>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and sends responses.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let (kind, body) = match read_frame(&mut self.reader) {
                Ok(frame) => frame,
                Err(FractalError::Io(e)) => match e.kind() {
                    std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted => {
                        tracing::debug!("Client {} disconnected", self.peer_addr);
                        return Ok(());
                    }
                    // Windows reports TimedOut where unix reports WouldBlock
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                        tracing::debug!("Read timeout for client {}", self.peer_addr);
                        return Ok(());
                    }
                    _ => {
                        tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                        return Err(e.into());
                    }
                },
                Err(e) => {
                    // Framing is lost, nothing after this can be trusted
                    tracing::warn!("Bad frame from {}: {}", self.peer_addr, e);
                    let _ = self.send_response(RpcResponse::error(None, INVALID_REQUEST, e.to_string()));
                    return Err(e);
                }
            };

            let response = self.dispatch(kind, &body);

            if let Err(e) = self.send_response(response) {
                if let FractalError::Io(ref io_err) = e {
                    match io_err.kind() {
                        std::io::ErrorKind::ConnectionAborted
                        | std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::BrokenPipe => {
                            tracing::debug!(
                                "Client {} disconnected before response could be sent: {}",
                                self.peer_addr, e
                            );
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Parse a frame body and execute it against the registry
    fn dispatch(&self, kind: FrameKind, body: &[u8]) -> RpcResponse {
        if kind != FrameKind::Request {
            return RpcResponse::error(None, INVALID_REQUEST, "expected a request frame");
        }

        let request: RpcRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => return RpcResponse::error(None, PARSE_ERROR, e.to_string()),
        };

        tracing::trace!(
            "Received {} for {} from {}",
            request.method,
            request.params.key,
            self.peer_addr
        );

        self.store.execute(request)
    }

    /// Send a response to the client
    fn send_response(&mut self, response: RpcResponse) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
