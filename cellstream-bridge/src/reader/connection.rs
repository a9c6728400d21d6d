//! Feed connection management.
//!
//! Owns the socket to the phone-side feed, reframes the byte stream into
//! lines, and hands each line to the forwarder with its capture
//! timestamp. The feed is transient by nature (the phone roams, the app
//! restarts), so the reader retries forever with a fixed backoff and
//! never treats a disconnect as fatal.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use log::{info, trace, warn};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpStream, UnixStream};
use tokio::sync::watch;

use cellstream_protocol::{LINE_BUFFER_SIZE, READ_CHUNK_SIZE};

use crate::forwarder::Forwarder;
use crate::reader::buffer::LineBuffer;

/// Delay between reconnect attempts.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Where the feed lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP `host:port`.
    Tcp(String),
    /// UNIX stream socket path.
    Unix(PathBuf),
}

impl Endpoint {
    /// Parse `tcp://host:port`, `unix:/path`, a bare absolute path, or a
    /// bare `host:port`.
    pub fn parse(s: &str) -> Result<Self, String> {
        if let Some(rest) = s.strip_prefix("tcp://") {
            if rest.contains(':') {
                return Ok(Endpoint::Tcp(rest.to_string()));
            }
            return Err(format!("tcp endpoint '{}' is missing a port", s));
        }
        if let Some(rest) = s.strip_prefix("unix:") {
            return Ok(Endpoint::Unix(PathBuf::from(rest)));
        }
        if s.starts_with('/') {
            return Ok(Endpoint::Unix(PathBuf::from(s)));
        }
        if s.contains(':') {
            return Ok(Endpoint::Tcp(s.to_string()));
        }
        Err(format!("unrecognized feed endpoint '{}'", s))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp://{}", addr),
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

enum FeedStream {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl FeedStream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FeedStream::Tcp(s) => s.read(buf).await,
            FeedStream::Unix(s) => s.read(buf).await,
        }
    }
}

/// Long-running reader task for one feed endpoint.
pub struct FeedReader {
    endpoint: Endpoint,
    state: ConnectionState,
    retries: u64,
    buffer: LineBuffer,
    forwarder: Forwarder,
    shutdown: watch::Receiver<bool>,
}

impl FeedReader {
    pub fn new(endpoint: Endpoint, forwarder: Forwarder, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            endpoint,
            state: ConnectionState::Disconnected,
            retries: 0,
            buffer: LineBuffer::new(LINE_BUFFER_SIZE),
            forwarder,
            shutdown,
        }
    }

    fn set_state(&mut self, next: ConnectionState) {
        trace!("feed state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Connect-read-reconnect loop. Returns only on shutdown.
    pub async fn run(mut self) {
        let endpoint = self.endpoint.clone();
        let mut shutdown = self.shutdown.clone();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            if *shutdown.borrow() {
                break;
            }
            self.set_state(ConnectionState::Connecting);
            let stream = tokio::select! {
                res = connect(&endpoint) => res,
                _ = shutdown.changed() => break,
            };
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    self.set_state(ConnectionState::Disconnected);
                    self.retries += 1;
                    warn!(
                        "connect to {} failed: {} (attempt {})",
                        endpoint, e, self.retries
                    );
                    if wait_backoff(&mut shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            info!("connected to feed at {}", endpoint);
            self.set_state(ConnectionState::Connected);
            self.retries = 0;
            self.buffer.clear();

            self.read_loop(stream, &mut chunk, &mut shutdown).await;

            // Dropping the stream closes the socket.
            self.set_state(ConnectionState::Disconnected);
            if *shutdown.borrow() || wait_backoff(&mut shutdown).await {
                break;
            }
        }

        info!(
            "feed reader stopped ({} frames forwarded, {} lines dropped)",
            self.forwarder.frames_forwarded(),
            self.forwarder.lines_dropped()
        );
    }

    async fn read_loop(
        &mut self,
        mut stream: FeedStream,
        chunk: &mut [u8],
        shutdown: &mut watch::Receiver<bool>,
    ) {
        loop {
            let space = self.buffer.space().min(chunk.len());
            let n = tokio::select! {
                res = stream.read(&mut chunk[..space]) => match res {
                    Ok(0) => {
                        info!("feed closed by peer");
                        return;
                    }
                    Ok(n) => n,
                    Err(e) => {
                        warn!("feed read error: {}", e);
                        return;
                    }
                },
                _ = shutdown.changed() => return,
            };

            self.buffer.push(&chunk[..n]);
            for line in self.buffer.take_lines() {
                let captured_us = Utc::now().timestamp_micros();
                self.forwarder.handle_line(&line, captured_us);
            }
            if let Some(dropped) = self.buffer.resync_on_overflow() {
                warn!(
                    "line exceeded {} bytes without a newline, discarded {} buffered bytes",
                    LINE_BUFFER_SIZE, dropped
                );
            }
        }
    }
}

async fn connect(endpoint: &Endpoint) -> io::Result<FeedStream> {
    match endpoint {
        Endpoint::Tcp(addr) => TcpStream::connect(addr.as_str()).await.map(FeedStream::Tcp),
        Endpoint::Unix(path) => UnixStream::connect(path).await.map(FeedStream::Unix),
    }
}

/// Sleep out the backoff window. Returns true if shutdown fired first.
async fn wait_backoff(shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(RECONNECT_BACKOFF) => false,
        _ = shutdown.changed() => true,
    }
}
