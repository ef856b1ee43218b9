//! Registry node server
//!
//! Accepts connections and dispatches them to worker threads.
//!
//! A worker serves one connection until its peer disconnects, and clients
//! keep their connections open. The pool therefore starts at
//! `ServerConfig::workers` and grows by one whenever a connection arrives
//! with no idle worker to take it.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel;

use crate::config::ServerConfig;
use crate::error::{FractalError, Result};
use crate::registry::RegistryStore;
use super::Connection;

/// TCP server for a registry node
pub struct RegistryServer {
    config: ServerConfig,
    store: Arc<RegistryStore>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
}

impl RegistryServer {
    /// Bind the listen address and create an empty registry
    pub fn bind(config: ServerConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(FractalError::Config("worker count must be non-zero".to_string()));
        }

        let listener = TcpListener::bind(&config.listen_addr)?;
        let local_addr = listener.local_addr()?;
        let store = Arc::new(RegistryStore::new(config.methods.clone(), config.fail_all));

        Ok(Self {
            config,
            store,
            listener,
            local_addr,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Bind and serve on a background thread
    pub fn spawn(config: ServerConfig) -> Result<ServerHandle> {
        let server = Self::bind(config)?;
        let addr = server.local_addr;
        let store = Arc::clone(&server.store);
        let shutdown = Arc::clone(&server.shutdown);

        let thread = thread::Builder::new()
            .name(format!("fractal-node-{}", addr.port()))
            .spawn(move || {
                if let Err(e) = server.run() {
                    tracing::error!("Registry node {} stopped: {}", addr, e);
                }
            })?;

        Ok(ServerHandle {
            addr,
            store,
            shutdown,
            thread: Some(thread),
        })
    }

    /// Start the server (blocking)
    ///
    /// Returns once [`RegistryServer::shutdown_flag`] is raised and the
    /// acceptor has been woken by a connection.
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Registry node listening on {} ({} initial workers, methods {})",
            self.local_addr,
            self.config.workers,
            self.config.methods
        );

        let (tx, rx) = channel::unbounded::<TcpStream>();
        let pool = WorkerPool {
            rx,
            idle: Arc::new(AtomicUsize::new(0)),
            spawned: AtomicUsize::new(0),
            store: Arc::clone(&self.store),
            read_ms: self.config.read_timeout_ms,
            write_ms: self.config.write_timeout_ms,
        };

        for _ in 0..self.config.workers {
            pool.spawn_worker(None)?;
        }

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    continue;
                }
            };

            if pool.claim_idle() {
                if tx.send(stream).is_err() {
                    break;
                }
            } else {
                tracing::debug!("No idle worker, growing pool to {}", pool.size() + 1);
                pool.spawn_worker(Some(stream))?;
            }
        }

        tracing::info!("Registry node {} shutting down", self.local_addr);
        Ok(())
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn store(&self) -> &Arc<RegistryStore> {
        &self.store
    }

    /// Flag that stops the accept loop when raised
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }
}

/// Connection workers fed by the acceptor
struct WorkerPool {
    rx: channel::Receiver<TcpStream>,

    /// Workers waiting on `rx` that the acceptor has not yet claimed
    idle: Arc<AtomicUsize>,

    spawned: AtomicUsize,
    store: Arc<RegistryStore>,
    read_ms: u64,
    write_ms: u64,
}

impl WorkerPool {
    fn size(&self) -> usize {
        self.spawned.load(Ordering::Acquire)
    }

    /// Reserve an idle worker for the next stream sent on the channel
    fn claim_idle(&self) -> bool {
        self.idle
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Start a worker, optionally handing it its first connection
    ///
    /// The worker exits once the acceptor drops the sending side.
    fn spawn_worker(&self, first: Option<TcpStream>) -> Result<()> {
        let id = self.spawned.fetch_add(1, Ordering::AcqRel);
        let rx = self.rx.clone();
        let idle = Arc::clone(&self.idle);
        let store = Arc::clone(&self.store);
        let (read_ms, write_ms) = (self.read_ms, self.write_ms);

        thread::Builder::new()
            .name(format!("fractal-worker-{}", id))
            .spawn(move || {
                if let Some(stream) = first {
                    run_connection(stream, &store, read_ms, write_ms);
                }
                loop {
                    idle.fetch_add(1, Ordering::AcqRel);
                    match rx.recv() {
                        Ok(stream) => run_connection(stream, &store, read_ms, write_ms),
                        Err(_) => break,
                    }
                }
            })?;
        Ok(())
    }
}

fn run_connection(stream: TcpStream, store: &Arc<RegistryStore>, read_ms: u64, write_ms: u64) {
    if let Err(e) = serve(stream, Arc::clone(store), read_ms, write_ms) {
        tracing::debug!("Connection ended with error: {}", e);
    }
}

fn serve(stream: TcpStream, store: Arc<RegistryStore>, read_ms: u64, write_ms: u64) -> Result<()> {
    let mut connection = Connection::new(stream, store)?;
    connection.set_timeouts(read_ms, write_ms)?;
    connection.handle()
}

/// Wake a blocked acceptor so it can observe the shutdown flag
pub fn wake(addr: SocketAddr) {
    let _ = TcpStream::connect(addr);
}

/// Handle to a node running on a background thread
///
/// Dropping the handle stops the node.
pub struct ServerHandle {
    addr: SocketAddr,
    store: Arc<RegistryStore>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn store(&self) -> &Arc<RegistryStore> {
        &self.store
    }

    /// Stop accepting connections and wait for the acceptor to exit
    ///
    /// Open connections are served until their peer disconnects.
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.shutdown.store(true, Ordering::Release);
            wake(self.addr);
            let _ = thread.join();
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
