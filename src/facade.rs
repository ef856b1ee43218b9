//! Record operation facade
//!
//! The surface consumed by the workload driver. Each operation runs
//! `route -> invoke -> encode/decode` and reports one of three outcomes.
//!
//! ## Per-operation flow
//! ```text
//! (table, key) ──▶ /table/key ──▶ Router ──▶ NodeClient ──▶ codec ──▶ Status
//! ```
//!
//! Every failure becomes `Status::Error`. The distinguishing [`ErrorKind`]
//! of the last failed operation stays available through
//! [`FractalClient::last_error`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::codec::{self, PartialRecord, Record};
use crate::config::ClientConfig;
use crate::error::{ErrorKind, FractalError, Result};
use crate::network::NodeClient;
use crate::routing::{Router, RoutingKey};

/// Outcome of a facade operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Error,
    NotImplemented,
}

impl Status {
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// Operations a workload driver issues against a database binding
pub trait Db {
    /// Read a record; the field filter is advisory
    fn read(&self, table: &str, key: &str, fields: Option<&BTreeSet<String>>) -> (Status, PartialRecord);

    /// Range scan starting at `start_key`
    fn scan(
        &self,
        table: &str,
        start_key: &str,
        record_count: usize,
        fields: Option<&BTreeSet<String>>,
    ) -> Status;

    /// Overwrite a record with `values`
    fn update(&self, table: &str, key: &str, values: &Record) -> Status;

    /// Write a new record
    fn insert(&self, table: &str, key: &str, values: &Record) -> Status;

    /// Delete a record
    fn delete(&self, table: &str, key: &str) -> Status;
}

/// Registry binding for one driver worker
///
/// Instances share the configuration and the router; each owns its node
/// connections.
pub struct FractalClient {
    config: Arc<ClientConfig>,
    router: Router,

    /// Parallel to `router.nodes()`
    clients: Vec<NodeClient>,

    last_error: Mutex<Option<ErrorKind>>,
}

impl FractalClient {
    /// Validate `config`, resolve every host and build the client
    ///
    /// Fails fast on bad configuration or an unresolvable host.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        config.validate()?;
        let router = Router::configure(config.hosts.as_slice(), config.port)?;

        if config.debug {
            for (i, node) in router.nodes().iter().enumerate() {
                tracing::info!("host [{}] : {} ({})", i + 1, node.host(), node.addr());
            }
            tracing::info!("port : {}", config.port);
            tracing::info!("methods : {}", config.methods);
        }

        Ok(Self::with_router(config, router))
    }

    /// Build a client over an already configured router
    ///
    /// Lets many workers share one resolution of the host list.
    pub fn with_router(config: Arc<ClientConfig>, router: Router) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);
        let clients = router
            .nodes()
            .iter()
            .map(|node| NodeClient::new(node.clone(), timeout))
            .collect();

        Self {
            config,
            router,
            clients,
            last_error: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Kind of the most recent failed operation on this client
    pub fn last_error(&self) -> Option<ErrorKind> {
        *self.last_error.lock()
    }

    // =========================================================================
    // Operations with error detail
    // =========================================================================

    /// Read the field names stored under `(table, key)`
    pub fn try_read(&self, table: &str, key: &str) -> Result<PartialRecord> {
        let routing_key = RoutingKey::new(table, key);
        let client = self.client_for(&routing_key)?;
        let method = &self.config.methods.get;

        let response = client
            .call_registry(method, &routing_key, None)
            .map_err(|e| call_failed(method, client, e))?;

        if self.config.debug {
            tracing::info!("read : {} {:?}", routing_key, response.result);
        }

        codec::decode(response.result_val()?)
    }

    /// Encode `values` and store them under `(table, key)`
    pub fn try_insert(&self, table: &str, key: &str, values: &Record) -> Result<()> {
        let routing_key = RoutingKey::new(table, key);
        let client = self.client_for(&routing_key)?;
        let payload = codec::encode(values)?;
        let method = &self.config.methods.set;

        if self.config.debug {
            tracing::info!("insert : {} {}", routing_key, payload);
        }

        client
            .call_registry(method, &routing_key, Some(payload.as_str()))
            .map_err(|e| call_failed(method, client, e))?;
        Ok(())
    }

    /// Remove `(table, key)`
    pub fn try_delete(&self, table: &str, key: &str) -> Result<()> {
        let routing_key = RoutingKey::new(table, key);
        let client = self.client_for(&routing_key)?;
        let method = &self.config.methods.remove;

        if self.config.debug {
            tracing::info!("delete : {}", routing_key);
        }

        client
            .call_registry(method, &routing_key, None)
            .map_err(|e| call_failed(method, client, e))?;
        Ok(())
    }

    fn client_for(&self, key: &RoutingKey) -> Result<&NodeClient> {
        let index = self.router.locate(key)?;
        self.clients
            .get(index)
            .ok_or_else(|| FractalError::Routing(format!("node #{} has no client", index)))
    }

    /// Flatten an outcome into a status, remembering the failure kind
    fn settle<T>(&self, operation: &str, outcome: Result<T>) -> (Status, Option<T>) {
        match outcome {
            Ok(value) => {
                *self.last_error.lock() = None;
                (Status::Ok, Some(value))
            }
            Err(e) => {
                tracing::debug!("{} failed: {}", operation, e);
                *self.last_error.lock() = Some(e.kind());
                (Status::Error, None)
            }
        }
    }
}

fn call_failed(method: &str, client: &NodeClient, cause: FractalError) -> FractalError {
    FractalError::CallFailed {
        method: method.to_string(),
        node: client.node().to_string(),
        kind: cause.kind(),
    }
}

impl Db for FractalClient {
    fn read(&self, table: &str, key: &str, _fields: Option<&BTreeSet<String>>) -> (Status, PartialRecord) {
        let (status, record) = self.settle("read", self.try_read(table, key));
        (status, record.unwrap_or_default())
    }

    fn scan(
        &self,
        _table: &str,
        _start_key: &str,
        _record_count: usize,
        _fields: Option<&BTreeSet<String>>,
    ) -> Status {
        Status::NotImplemented
    }

    /// Same as insert: the stored record is replaced as a whole
    fn update(&self, table: &str, key: &str, values: &Record) -> Status {
        self.insert(table, key, values)
    }

    fn insert(&self, table: &str, key: &str, values: &Record) -> Status {
        self.settle("insert", self.try_insert(table, key, values)).0
    }

    fn delete(&self, table: &str, key: &str) -> Status {
        self.settle("delete", self.try_delete(table, key)).0
    }
}
