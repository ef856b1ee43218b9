//! Fractal Registry Node Binary
//!
//! Runs an in-memory registry node speaking the client protocol.

use clap::Parser;
use fractal_registry::{Methods, RegistryServer, ServerConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// Fractal registry node
#[derive(Parser, Debug)]
#[command(name = "fractal-node")]
#[command(about = "In-memory registry node for the Fractal client")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:4649")]
    listen: String,

    /// Connection worker threads started up front
    #[arg(short, long, default_value_t = fractal_registry::config::DEFAULT_WORKERS)]
    workers: usize,

    /// Method names as set,get,remove
    #[arg(short, long, default_value = fractal_registry::config::DEFAULT_METHODS)]
    methods: String,

    /// Answer every call with an error
    #[arg(long)]
    fail_all: bool,

    /// Idle connection timeout in milliseconds (0 = none)
    #[arg(long, default_value = "30000")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fractal_registry=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Fractal registry node v{}", fractal_registry::VERSION);

    let methods = match Methods::parse(&args.methods) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    let config = ServerConfig::builder()
        .listen_addr(&args.listen)
        .workers(args.workers)
        .methods(methods)
        .fail_all(args.fail_all)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let server = match RegistryServer::bind(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
