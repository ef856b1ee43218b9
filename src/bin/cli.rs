//! Fractal CLI Client
//!
//! Issues a single facade operation against a registry cluster.

use std::collections::BTreeSet;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use fractal_registry::config::{DEFAULT_HOST, DEFAULT_METHODS, DEFAULT_PORT, DEFAULT_TIMEOUT_MS};
use fractal_registry::{ClientConfig, Db, FractalClient, Methods, Record, Status};
use tracing_subscriber::{fmt, EnvFilter};

/// Fractal CLI
#[derive(Parser, Debug)]
#[command(name = "fractal-cli")]
#[command(about = "CLI for a Fractal registry cluster")]
struct Args {
    /// Comma-separated node hosts
    #[arg(long, default_value = DEFAULT_HOST)]
    hosts: String,

    /// Node RPC port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Method names as set,get,remove
    #[arg(short, long, default_value = DEFAULT_METHODS)]
    methods: String,

    /// Log routing keys and payloads
    #[arg(short, long)]
    debug: bool,

    /// Remote call timeout in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Table name
    #[arg(long, default_value = "usertable")]
    table: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read the field names of a record
    Read {
        key: String,
    },

    /// Insert a record from field=value pairs
    Insert {
        key: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Overwrite a record from field=value pairs
    Update {
        key: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Delete a record
    Delete {
        key: String,
    },

    /// Range scan (not supported by the registry)
    Scan {
        start_key: String,
        #[arg(default_value = "10")]
        count: usize,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    let client = match build_client(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    let status = match &args.command {
        Commands::Read { key } => {
            let (status, record) = client.read(&args.table, key, None::<&BTreeSet<String>>);
            for field in record.keys() {
                println!("{}", field);
            }
            status
        }
        Commands::Insert { key, fields } => match parse_fields(fields) {
            Ok(record) => client.insert(&args.table, key, &record),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(2);
            }
        },
        Commands::Update { key, fields } => match parse_fields(fields) {
            Ok(record) => client.update(&args.table, key, &record),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(2);
            }
        },
        Commands::Delete { key } => client.delete(&args.table, key),
        Commands::Scan { start_key, count } => client.scan(&args.table, start_key, *count, None),
    };

    println!("{:?}", status);
    if let (Status::Error, Some(kind)) = (status, client.last_error()) {
        eprintln!("cause: {:?}", kind);
    }
    if status != Status::Ok {
        std::process::exit(1);
    }
}

fn build_client(args: &Args) -> fractal_registry::Result<FractalClient> {
    let config = ClientConfig::builder()
        .hosts(args.hosts.split(',').map(|h| h.trim().to_string()))
        .port(args.port)
        .methods(Methods::parse(&args.methods)?)
        .debug(args.debug)
        .timeout_ms(args.timeout_ms)
        .build()?;

    FractalClient::new(Arc::new(config))
}

fn parse_fields(pairs: &[String]) -> Result<Record, String> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(f, v)| (f.to_string(), v.to_string()))
                .ok_or_else(|| format!("expected field=value, got '{}'", pair))
        })
        .collect()
}
