//! Peer connection lifecycle.
//!
//! Owns the TCP stream to the audio-execution peer. There is exactly one
//! logical peer, so connections are not pooled or multiplexed: the stream
//! is established lazily before the first command and re-established
//! reactively after the next command fails, never by a background health
//! check.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, error, info};

/// A lazily-established connection to the peer process.
///
/// Created without a live transport; [`Connection::connect`] fills it in,
/// and any transport-level failure during a command clears it again so the
/// next call starts from a clean reconnect.
#[derive(Debug)]
pub struct Connection {
    host: String,
    port: u16,
    connect_timeout: Duration,
    stream: Option<TcpStream>,
}

impl Connection {
    /// Create a connection targeting `(host, port)`; no transport is opened
    /// until [`Connection::connect`] is called.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
            stream: None,
        }
    }

    /// Whether a live transport is currently held.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the transport if not already open.
    ///
    /// Idempotent: returns `true` immediately when a live transport is
    /// held. On failure (refused, unreachable, timeout) the cause is
    /// logged, the transport stays absent, and `false` is returned —
    /// connect failures never propagate as errors past this boundary.
    pub async fn connect(&mut self) -> bool {
        if self.stream.is_some() {
            return true;
        }

        let target = (self.host.as_str(), self.port);
        match time::timeout(self.connect_timeout, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => {
                info!(host = %self.host, port = self.port, "connected to peer");
                self.stream = Some(stream);
                true
            }
            Ok(Err(err)) => {
                error!(host = %self.host, port = self.port, error = %err, "failed to connect to peer");
                false
            }
            Err(_) => {
                error!(host = %self.host, port = self.port, "connect attempt timed out");
                false
            }
        }
    }

    /// Close the transport if present and clear the stored handle.
    ///
    /// Best-effort: close errors are swallowed. Idempotent — safe to call
    /// when already disconnected.
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            debug!(host = %self.host, port = self.port, "disconnected from peer");
        }
    }

    /// Ensure a live transport exists, making at most one connect attempt.
    ///
    /// A `false` return is a dispatch-time failure for the caller; no retry
    /// happens here.
    pub async fn ensure_connected(&mut self) -> bool {
        if self.stream.is_some() {
            return true;
        }
        self.connect().await
    }

    /// Mutable access to the live transport, if any.
    pub fn stream_mut(&mut self) -> Option<&mut TcpStream> {
        self.stream.as_mut()
    }
}
