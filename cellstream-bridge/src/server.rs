//! Host-side fan-out server.
//!
//! Serves the capture frame stream to local consumers over a UNIX socket
//! (and optionally a TCP listener, meant for loopback). Frames go
//! through a broadcast channel; every connected client gets every frame,
//! and a client that cannot keep up is disconnected rather than allowed
//! to stall the feed.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use log::{error, info, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UnixListener};
use tokio::sync::{broadcast, watch};

use cellstream_protocol::ProtocolFrame;

use crate::forwarder::FrameSink;

pub struct FanoutConfig {
    pub socket_path: PathBuf,
    pub tcp_listen: Option<SocketAddr>,
    /// Frames a slow client may fall behind before being dropped.
    pub queue_capacity: usize,
}

pub struct FanoutServer {
    uds: UnixListener,
    tcp: Option<TcpListener>,
    tx: broadcast::Sender<String>,
    socket_path: PathBuf,
}

/// Frame sink handle held by the forwarder. Sending into an empty room
/// is fine; frames are simply not retained for late joiners.
#[derive(Clone)]
pub struct FanoutSink {
    tx: broadcast::Sender<String>,
}

impl FrameSink for FanoutSink {
    fn deliver(&self, frame: &ProtocolFrame) {
        let _ = self.tx.send(frame.to_wire());
    }
}

impl FanoutServer {
    /// Bind the listeners. Any failure here means the bridge cannot
    /// serve its one purpose, so the caller exits non-zero.
    pub async fn bind(config: &FanoutConfig) -> io::Result<Self> {
        // A stale socket from an unclean shutdown blocks bind.
        if config.socket_path.exists() {
            std::fs::remove_file(&config.socket_path)?;
        }
        if let Some(dir) = config.socket_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let uds = UnixListener::bind(&config.socket_path)?;
        let tcp = match config.tcp_listen {
            Some(addr) => Some(TcpListener::bind(addr).await?),
            None => None,
        };
        let (tx, _) = broadcast::channel(config.queue_capacity);
        Ok(Self {
            uds,
            tcp,
            tx,
            socket_path: config.socket_path.clone(),
        })
    }

    pub fn sink(&self) -> FanoutSink {
        FanoutSink {
            tx: self.tx.clone(),
        }
    }

    /// Accept loop. Runs until shutdown, then removes the socket file.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("serving frames on unix:{}", self.socket_path.display());
        if let Some(tcp) = &self.tcp {
            match tcp.local_addr() {
                Ok(addr) => info!("serving frames on tcp://{}", addr),
                Err(e) => warn!("tcp listener address unavailable: {}", e),
            }
        }

        let mut next_client = 0u64;
        loop {
            tokio::select! {
                res = self.uds.accept() => match res {
                    Ok((stream, _)) => {
                        next_client += 1;
                        tokio::spawn(serve_client(stream, self.tx.subscribe(), next_client, "unix"));
                    }
                    Err(e) => error!("unix accept failed: {}", e),
                },
                res = accept_tcp(self.tcp.as_ref()) => match res {
                    Ok((stream, peer)) => {
                        next_client += 1;
                        info!("[client {}] tcp peer {}", next_client, peer);
                        tokio::spawn(serve_client(stream, self.tx.subscribe(), next_client, "tcp"));
                    }
                    Err(e) => error!("tcp accept failed: {}", e),
                },
                _ = shutdown.changed() => break,
            }
        }

        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            warn!("failed to remove socket {}: {}", self.socket_path.display(), e);
        }
        info!("fan-out server stopped");
    }
}

async fn accept_tcp(listener: Option<&TcpListener>) -> io::Result<(TcpStream, SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}

/// Copy frames to one client until it disconnects or lags.
async fn serve_client<W>(mut stream: W, mut rx: broadcast::Receiver<String>, id: u64, kind: &str)
where
    W: AsyncWrite + Unpin,
{
    info!("[client {}] connected via {}", id, kind);
    loop {
        match rx.recv().await {
            Ok(mut line) => {
                line.push('\n');
                if let Err(e) = stream.write_all(line.as_bytes()).await {
                    info!("[client {}] write failed, disconnecting: {}", id, e);
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("[client {}] too slow, missed {} frames, disconnecting", id, n);
                break;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    info!("[client {}] disconnected", id);
}
