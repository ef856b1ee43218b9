//! Configuration for the registry client and node
//!
//! Centralized configuration with sensible defaults. Everything here is read
//! once at startup and shared read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use crate::error::{FractalError, Result};

/// Default node address when no host list is configured
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default RPC port of a registry node
pub const DEFAULT_PORT: u16 = 4649;

/// Default method triple, in `set,get,remove` order
pub const DEFAULT_METHODS: &str = "set_registry,get_registry,remove_registry";

/// Default bound on a single remote call (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default number of node worker threads started up front
pub const DEFAULT_WORKERS: usize = 4;

// Property names understood by `ClientConfig::from_properties`
pub const HOST_PROPERTY: &str = "host";
pub const PORT_PROPERTY: &str = "port";
pub const METHODS_PROPERTY: &str = "methods";
pub const DEBUG_PROPERTY: &str = "debug";
pub const TIMEOUT_PROPERTY: &str = "timeout_ms";

// =============================================================================
// Method Names
// =============================================================================

/// Names of the three remote registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Methods {
    pub set: String,
    pub get: String,
    pub remove: String,
}

impl Methods {
    /// Build a method triple, rejecting empty names
    pub fn new(
        set: impl Into<String>,
        get: impl Into<String>,
        remove: impl Into<String>,
    ) -> Result<Self> {
        let methods = Self {
            set: set.into(),
            get: get.into(),
            remove: remove.into(),
        };

        for (role, name) in [("set", &methods.set), ("get", &methods.get), ("remove", &methods.remove)] {
            if name.trim().is_empty() {
                return Err(FractalError::Config(format!("{} method name is empty", role)));
            }
        }

        Ok(methods)
    }

    /// Parse a comma-separated `set,get,remove` triple
    ///
    /// Exactly three non-empty names are required.
    pub fn parse(list: &str) -> Result<Self> {
        let names: Vec<&str> = list.split(',').map(str::trim).collect();
        if names.len() != 3 {
            return Err(FractalError::Config(format!(
                "expected 3 method names (set,get,remove), got {}: '{}'",
                names.len(),
                list
            )));
        }
        Self::new(names[0], names[1], names[2])
    }
}

impl Default for Methods {
    fn default() -> Self {
        Self {
            set: "set_registry".to_string(),
            get: "get_registry".to_string(),
            remove: "remove_registry".to_string(),
        }
    }
}

impl fmt::Display for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.set, self.get, self.remove)
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration shared by every facade instance of a process
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Registry node hosts (names or literal addresses), in configured order
    pub hosts: Vec<String>,

    /// RPC port, identical for every node
    pub port: u16,

    /// Remote method names
    pub methods: Methods,

    /// Log routing keys and payloads for every operation
    pub debug: bool,

    /// Bound on connect, read and write of one remote call (milliseconds)
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hosts: vec![DEFAULT_HOST.to_string()],
            port: DEFAULT_PORT,
            methods: Methods::default(),
            debug: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Build a config from driver properties
    ///
    /// Recognized keys: `host`, `port`, `methods`, `debug`, `timeout_ms`.
    /// Missing keys fall back to defaults; malformed values are errors.
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(hosts) = props.get(HOST_PROPERTY) {
            builder = builder.hosts(hosts.split(',').map(|h| h.trim().to_string()));
        }

        if let Some(port) = props.get(PORT_PROPERTY) {
            let port = port.trim().parse::<u16>().map_err(|e| {
                FractalError::Config(format!("invalid port '{}': {}", port, e))
            })?;
            builder = builder.port(port);
        }

        if let Some(methods) = props.get(METHODS_PROPERTY) {
            builder = builder.methods(Methods::parse(methods)?);
        }

        if let Some(debug) = props.get(DEBUG_PROPERTY) {
            // Anything other than "true" disables debug output
            builder = builder.debug(debug.trim().eq_ignore_ascii_case("true"));
        }

        if let Some(timeout) = props.get(TIMEOUT_PROPERTY) {
            let ms = timeout.trim().parse::<u64>().map_err(|e| {
                FractalError::Config(format!("invalid timeout '{}': {}", timeout, e))
            })?;
            builder = builder.timeout_ms(ms);
        }

        builder.build()
    }

    /// Check invariants the rest of the crate relies on
    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            return Err(FractalError::Config("host list is empty".to_string()));
        }
        if let Some(pos) = self.hosts.iter().position(|h| h.trim().is_empty()) {
            return Err(FractalError::Config(format!("host #{} is empty", pos + 1)));
        }
        if self.port == 0 {
            return Err(FractalError::Config("port must be non-zero".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(FractalError::Config("timeout must be non-zero".to_string()));
        }
        // Re-check in case the struct was assembled by hand
        Methods::new(
            self.methods.set.as_str(),
            self.methods.get.as_str(),
            self.methods.remove.as_str(),
        )?;
        Ok(())
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the registry node hosts
    pub fn hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the RPC port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the remote method names
    pub fn methods(mut self, methods: Methods) -> Self {
        self.config.methods = methods;
        self
    }

    /// Enable per-operation diagnostic logging
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Set the remote call timeout (in milliseconds)
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// Node Configuration
// =============================================================================

/// Configuration of a registry node server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP listen address
    pub listen_addr: String,

    /// Connection worker threads started up front; the pool grows past
    /// this while every worker is busy
    pub workers: usize,

    /// Method names the node answers to
    pub methods: Methods,

    /// Answer every call with an error (failure simulation)
    pub fail_all: bool,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT),
            workers: DEFAULT_WORKERS,
            methods: Methods::default(),
            fail_all: false,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the method names
    pub fn methods(mut self, methods: Methods) -> Self {
        self.config.methods = methods;
        self
    }

    /// Make every call fail with a remote error
    pub fn fail_all(mut self, fail: bool) -> Self {
        self.config.fail_all = fail;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
