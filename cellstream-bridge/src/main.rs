//! cellstream-bridge: cellular telemetry feed bridge.
//!
//! Reads newline-delimited JSON cell records from a phone-side feed,
//! decodes them into canonical device records, and serves capture frames
//! to host-side consumers over a UNIX socket.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use tokio::sync::watch;

mod forwarder;
mod logging;
mod reader;
mod server;

use forwarder::{Forwarder, LogDeviceSink};
use reader::{Endpoint, FeedReader};
use server::{FanoutConfig, FanoutServer};

const DEFAULT_CONNECT: &str = "tcp://127.0.0.1:8765";
const DEFAULT_SOCKET: &str = "/var/run/kismet/cell.sock";
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// cellstream-bridge - cellular telemetry feed bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Feed endpoint to read from (tcp://host:port or unix:/path)
    #[arg(short = 'c', long, default_value = DEFAULT_CONNECT)]
    connect: String,

    /// UNIX socket path served to host-side consumers
    #[arg(short, long, default_value = DEFAULT_SOCKET)]
    socket: PathBuf,

    /// Optional TCP listen address for host-side consumers (keep it on loopback)
    #[arg(long)]
    listen_tcp: Option<SocketAddr>,

    /// Print the capability descriptor as JSON and exit
    #[arg(long)]
    list: bool,

    /// Configuration file path
    #[arg(short = 'f', long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory where log files are stored
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Number of days to keep log files
    #[arg(long, default_value = "7")]
    log_retention_days: u64,
}

/// Configuration file format.
#[derive(Debug, serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    feed: FeedSection,
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, serde::Deserialize, Default)]
struct FeedSection {
    connect: Option<String>,
}

#[derive(Debug, serde::Deserialize, Default)]
struct ServerSection {
    socket: Option<String>,
    listen_tcp: Option<String>,
    queue_capacity: Option<usize>,
}

#[derive(Debug, serde::Deserialize, Default)]
struct LoggingSection {
    log_dir: Option<String>,
    retention_days: Option<u64>,
    level: Option<String>,
}

fn load_config(path: &PathBuf) -> Result<ConfigFile, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Capability descriptor for capture-source discovery.
fn capability_descriptor(socket: &std::path::Path) -> serde_json::Value {
    serde_json::json!({
        "sourcetype": "cell",
        "description": "Cellular capture (Android feeder)",
        "preferred_name": "cell",
        "default_source": format!("uds:{}", socket.display()),
        "supports_local": true,
        "supports_remote": true,
        "options": [
            {
                "name": "socket",
                "type": "string",
                "default": socket.display().to_string(),
                "description": "UNIX domain socket path",
            },
            {
                "name": "connect",
                "type": "string",
                "default": DEFAULT_CONNECT,
                "description": "Phone feed endpoint",
            },
            {
                "name": "listen_tcp",
                "type": "string",
                "default": "",
                "description": "Optional host:port TCP listener (disabled by default)",
            },
        ],
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.list {
        println!("{}", capability_descriptor(&args.socket));
        return Ok(());
    }

    // Load config file: explicit path > auto-detect > default
    let config_path = args.config.clone().or_else(|| {
        let default_path = PathBuf::from("cellstream-bridge.toml");
        if default_path.exists() {
            Some(default_path)
        } else {
            None
        }
    });
    let file_config = if let Some(config_path) = &config_path {
        match load_config(config_path) {
            Ok(c) => {
                eprintln!("Loaded config from: {}", config_path.display());
                c
            }
            Err(e) => {
                eprintln!("Failed to load config file: {}", e);
                return Err(e);
            }
        }
    } else {
        ConfigFile::default()
    };

    // Merge logging configs (command line takes precedence)
    let log_dir = if args.log_dir.to_string_lossy() != "logs" {
        args.log_dir.clone()
    } else {
        PathBuf::from(file_config.logging.log_dir.as_deref().unwrap_or("logs"))
    };
    let log_retention_days = if args.log_retention_days != 7 {
        args.log_retention_days
    } else {
        file_config.logging.retention_days.unwrap_or(7)
    };

    let log_level = file_config.logging.level.as_deref();
    logging::init_logging(&log_dir, log_retention_days, args.verbose, log_level)
        .expect("Failed to initialize logging");

    // Merge remaining settings the same way
    let connect = if args.connect != DEFAULT_CONNECT {
        args.connect.clone()
    } else {
        file_config.feed.connect.unwrap_or(args.connect)
    };
    let socket_path = if args.socket.to_string_lossy() != DEFAULT_SOCKET {
        args.socket.clone()
    } else {
        file_config
            .server
            .socket
            .map(PathBuf::from)
            .unwrap_or(args.socket)
    };
    let tcp_listen = match args.listen_tcp {
        Some(addr) => Some(addr),
        None => match file_config.server.listen_tcp.as_deref() {
            Some(s) => Some(s.parse::<SocketAddr>().map_err(|e| {
                error!("bad listen_tcp address '{}': {}", s, e);
                e
            })?),
            None => None,
        },
    };
    let queue_capacity = file_config
        .server
        .queue_capacity
        .unwrap_or(DEFAULT_QUEUE_CAPACITY);

    let endpoint = Endpoint::parse(&connect).map_err(|e| {
        error!("{}", e);
        e
    })?;

    info!("cellstream-bridge starting...");
    info!("  Feed endpoint: {}", endpoint);
    info!("  Serving socket: {}", socket_path.display());
    if let Some(addr) = &tcp_listen {
        info!("  TCP listener: {}", addr);
    }

    // A failed bind is fatal: exit non-zero instead of limping along.
    let fanout_config = FanoutConfig {
        socket_path,
        tcp_listen,
        queue_capacity,
    };
    let fanout = match FanoutServer::bind(&fanout_config).await {
        Ok(server) => server,
        Err(e) => {
            error!(
                "failed to bind {}: {}",
                fanout_config.socket_path.display(),
                e
            );
            return Err(e.into());
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sink = fanout.sink();
    let server_handle = tokio::spawn(fanout.run(shutdown_rx.clone()));

    let forwarder = Forwarder::new(Arc::new(sink), Arc::new(LogDeviceSink));
    let reader = FeedReader::new(endpoint, forwarder, shutdown_rx);
    let reader_handle = tokio::spawn(reader.run());

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);
    let _ = reader_handle.await;
    let _ = server_handle.await;

    Ok(())
}
