//! Registry Module
//!
//! The in-memory key/value registry served by a node.
//!
//! ## Responsibilities
//! - Dispatch JSON-RPC requests to set/get/remove handlers by method name
//! - Store encoded records verbatim
//! - Keep per-method call counters and the last request for inspection
//!
//! ## Concurrency Model
//! Entries live behind a `RwLock`: lookups run concurrently, writes are
//! serialized. Counters and the last request sit behind separate mutexes.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use serde_json::json;

use crate::config::Methods;
use crate::protocol::{
    RpcRequest, RpcResponse, INVALID_REQUEST, METHOD_NOT_FOUND, NODE_UNAVAILABLE, NOT_FOUND,
};

/// Registry operation selected by a request's method name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Set,
    Get,
    Remove,
}

/// Node-side registry store
pub struct RegistryStore {
    /// Method names this node answers to
    methods: Methods,

    /// Answer every call with `NODE_UNAVAILABLE`
    fail_all: bool,

    /// Stored key -> encoded record
    entries: RwLock<HashMap<String, String>>,

    /// Calls handled per method name (unknown methods included)
    calls: Mutex<HashMap<String, u64>>,

    /// Most recent request received
    last_request: Mutex<Option<RpcRequest>>,
}

impl RegistryStore {
    /// Create an empty store
    pub fn new(methods: Methods, fail_all: bool) -> Self {
        Self {
            methods,
            fail_all,
            entries: RwLock::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            last_request: Mutex::new(None),
        }
    }

    /// Execute a request
    ///
    /// Routes requests to the handler matching their method name
    pub fn execute(&self, request: RpcRequest) -> RpcResponse {
        *self.calls.lock().entry(request.method.clone()).or_insert(0) += 1;
        *self.last_request.lock() = Some(request.clone());

        let id = Some(request.id);

        if request.jsonrpc != crate::protocol::JSONRPC_VERSION {
            return RpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("unsupported jsonrpc version '{}'", request.jsonrpc),
            );
        }

        let operation = match self.operation(&request.method) {
            Some(op) => op,
            None => {
                return RpcResponse::error(
                    id,
                    METHOD_NOT_FOUND,
                    format!("method '{}' not found", request.method),
                )
            }
        };

        if self.fail_all {
            return RpcResponse::error(id, NODE_UNAVAILABLE, "node unavailable");
        }

        let key = request.params.key;
        match operation {
            Operation::Set => match request.params.val {
                Some(val) => {
                    self.entries.write().insert(key.clone(), val.clone());
                    RpcResponse::success(id, json!({ "key": key, "val": val }))
                }
                None => RpcResponse::error(id, INVALID_REQUEST, "set requires 'val'"),
            },
            Operation::Get => match self.entries.read().get(&key) {
                Some(val) => RpcResponse::success(id, json!({ "key": key, "val": val })),
                None => RpcResponse::error(id, NOT_FOUND, format!("key '{}' not found", key)),
            },
            Operation::Remove => match self.entries.write().remove(&key) {
                Some(_) => RpcResponse::success(id, json!({ "key": key })),
                None => RpcResponse::error(id, NOT_FOUND, format!("key '{}' not found", key)),
            },
        }
    }

    fn operation(&self, method: &str) -> Option<Operation> {
        if method == self.methods.set {
            Some(Operation::Set)
        } else if method == self.methods.get {
            Some(Operation::Get)
        } else if method == self.methods.remove {
            Some(Operation::Remove)
        } else {
            None
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Stored value for `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Calls received for `method`
    pub fn calls(&self, method: &str) -> u64 {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    /// Total calls received
    pub fn total_calls(&self) -> u64 {
        self.calls.lock().values().sum()
    }

    /// Most recent request received
    pub fn last_request(&self) -> Option<RpcRequest> {
        self.last_request.lock().clone()
    }

    pub fn methods(&self) -> &Methods {
        &self.methods
    }
}
