//! Config Tests
//!
//! Defaults, property parsing and validation.

use std::collections::HashMap;
use std::sync::Arc;

use fractal_registry::config::{DEFAULT_PORT, DEFAULT_TIMEOUT_MS};
use fractal_registry::{ClientConfig, ErrorKind, FractalClient, Methods};

fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn test_defaults() {
    let config = ClientConfig::from_properties(&HashMap::new()).unwrap();

    assert_eq!(config.hosts, vec!["127.0.0.1".to_string()]);
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.methods, Methods::default());
    assert_eq!(config.methods.set, "set_registry");
    assert_eq!(config.methods.get, "get_registry");
    assert_eq!(config.methods.remove, "remove_registry");
    assert!(!config.debug);
    assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_full_properties() {
    let config = ClientConfig::from_properties(&props(&[
        ("host", "10.0.0.1, 10.0.0.2,10.0.0.3"),
        ("port", "9999"),
        ("methods", "put,fetch,drop"),
        ("debug", "TRUE"),
        ("timeout_ms", "250"),
    ]))
    .unwrap();

    assert_eq!(config.hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    assert_eq!(config.port, 9999);
    assert_eq!(config.methods, Methods::new("put", "fetch", "drop").unwrap());
    assert!(config.debug);
    assert_eq!(config.timeout_ms, 250);
}

#[test]
fn test_debug_other_values_disable() {
    for value in ["false", "yes", "1", ""] {
        let config = ClientConfig::from_properties(&props(&[("debug", value)])).unwrap();
        assert!(!config.debug, "debug={:?}", value);
    }
}

#[test]
fn test_too_few_methods_rejected() {
    let err = ClientConfig::from_properties(&props(&[("methods", "set_registry,get_registry")]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_too_many_methods_rejected() {
    let err = Methods::parse("a,b,c,d").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_empty_method_rejected() {
    assert!(Methods::parse("set,,remove").is_err());
    assert!(Methods::parse(" ,get,remove").is_err());
    assert!(Methods::new("set", "get", "").is_err());
}

#[test]
fn test_bad_port_rejected() {
    for port in ["abc", "70000", "-1", "0"] {
        let err = ClientConfig::from_properties(&props(&[("port", port)])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration, "port={:?}", port);
    }
}

#[test]
fn test_bad_timeout_rejected() {
    assert!(ClientConfig::from_properties(&props(&[("timeout_ms", "soon")])).is_err());
    assert!(ClientConfig::from_properties(&props(&[("timeout_ms", "0")])).is_err());
}

#[test]
fn test_empty_host_rejected() {
    assert!(ClientConfig::from_properties(&props(&[("host", "")])).is_err());
    assert!(ClientConfig::from_properties(&props(&[("host", "10.0.0.1,,10.0.0.2")])).is_err());
}

// =============================================================================
// Builder / Client Construction
// =============================================================================

#[test]
fn test_builder_validates() {
    let err = ClientConfig::builder()
        .hosts(Vec::<String>::new())
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_client_rejects_hand_built_invalid_config() {
    let config = ClientConfig {
        methods: Methods {
            set: "set_registry".to_string(),
            get: String::new(),
            remove: "remove_registry".to_string(),
        },
        ..ClientConfig::default()
    };

    let err = FractalClient::new(Arc::new(config)).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_client_fails_fast_on_unresolvable_host() {
    let config = ClientConfig::builder()
        .hosts(["127.0.0.1", "no-such-host.invalid"])
        .build()
        .unwrap();

    let err = FractalClient::new(Arc::new(config)).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Resolution);
}

#[test]
fn test_client_builds_node_set() {
    let config = ClientConfig::builder()
        .hosts(["127.0.0.1", "127.0.0.2"])
        .port(9999)
        .build()
        .unwrap();

    let client = FractalClient::new(Arc::new(config)).unwrap();
    assert_eq!(client.router().len(), 2);
    assert_eq!(client.config().port, 9999);
}

#[test]
fn test_methods_display() {
    assert_eq!(Methods::default().to_string(), "set_registry,get_registry,remove_registry");
}
