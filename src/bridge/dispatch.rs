//! Command dispatch over the peer bridge.
//!
//! Serializes a typed command envelope, writes it to the connection,
//! invokes the framing receiver, and decodes the response envelope into
//! either a result payload or one of the named failure kinds.
//!
//! The protocol is not multiplexed: at most one command is in flight on the
//! connection at a time. [`Bridge`] makes that guarantee explicit by
//! holding its [`Connection`] behind an async mutex for the whole exchange,
//! so overlapping callers queue instead of interleaving envelope bytes.
//!
//! ## Wire format
//!
//! Request, raw UTF-8 with no length prefix or delimiter:
//! ```json
//! {"type": "code.Execute", "parameters": "{\"...\"}"}
//! ```
//! `parameters` is the parameter value JSON-encoded *again* into a string
//! nested inside the outer envelope, defaulting to `"{}"`.
//!
//! Response, same no-delimiter convention:
//! ```json
//! {"success": true, "data": { ... }}
//! {"success": false, "error": "reason"}
//! ```

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time;
use tracing::{debug, error, warn};

use crate::bridge::connection::Connection;
use crate::bridge::framing;
use crate::config::BridgeConfig;
use crate::{BridgeError, Result};

/// Maximum raw bytes quoted when a response fails envelope decoding.
const EXCERPT_BYTES: usize = 200;

/// Response envelope received from the peer.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    /// Whether the peer executed the command.
    success: bool,
    /// Result payload, present on success.
    #[serde(default)]
    data: Option<Value>,
    /// Peer-supplied failure message, present when `success` is false.
    #[serde(default)]
    error: Option<String>,
}

/// Command/response bridge to the audio-execution peer.
///
/// Owns the lazily-connected [`Connection`] and serializes access to it:
/// concurrent [`Bridge::send_command`] calls on a shared bridge queue one
/// behind the other. The bridge is agnostic to command semantics — it is a
/// generic typed-envelope transport.
#[derive(Debug)]
pub struct Bridge {
    connection: Mutex<Connection>,
    chunk_size: usize,
    timeout: Duration,
}

impl Bridge {
    /// Create a bridge for the peer described by `config`; no connection is
    /// opened until the first command.
    #[must_use]
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            connection: Mutex::new(Connection::new(
                config.host.clone(),
                config.port,
                config.timeout(),
            )),
            chunk_size: config.chunk_size,
            timeout: config.timeout(),
        }
    }

    /// Whether a live transport to the peer is currently held.
    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_connected()
    }

    /// Close the transport, if any. The next command reconnects lazily.
    pub async fn disconnect(&self) {
        self.connection.lock().await.disconnect().await;
    }

    /// Send one command to the peer and return its result payload.
    ///
    /// Lazily connects, writes the command envelope, reads the response
    /// under the configured deadline, and decodes it. `params` defaults to
    /// an empty object; the returned `data` defaults to an empty object
    /// when the peer omits it. The command is never retried here — commands
    /// can trigger side-effecting execution on the peer, so resubmission is
    /// the caller's decision.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::NotConnected`] — no transport could be established.
    /// - [`BridgeError::Timeout`], [`BridgeError::Transport`],
    ///   [`BridgeError::NoData`], [`BridgeError::IncompleteMessage`] —
    ///   transport or framing failure; the stored connection is dropped so
    ///   the next call reconnects.
    /// - [`BridgeError::InvalidResponse`] — the response is not a
    ///   well-formed envelope (connection kept).
    /// - [`BridgeError::Remote`] — the peer reported `success: false`
    ///   (connection kept).
    pub async fn send_command(&self, command_type: &str, params: Option<Value>) -> Result<Value> {
        let mut connection = self.connection.lock().await;

        if !connection.ensure_connected().await {
            return Err(BridgeError::NotConnected);
        }

        let payload = encode_command(command_type, params);
        debug!(command = command_type, bytes = payload.len(), "sending command");

        let response = match exchange(&mut connection, &payload, self.chunk_size, self.timeout).await
        {
            Ok(bytes) => bytes,
            Err(err) => {
                // The transport is in an unknown framing state; drop it so
                // the next command starts from a clean reconnect.
                warn!(command = command_type, error = %err, "exchange failed, dropping connection");
                connection.disconnect().await;
                return Err(err);
            }
        };

        debug!(command = command_type, bytes = response.len(), "response received");
        decode_response(command_type, &response)
    }
}

/// Write `payload` and read back one complete message.
///
/// Every error returned here is transport- or framing-level and obliges the
/// caller to drop the connection.
async fn exchange(
    connection: &mut Connection,
    payload: &[u8],
    chunk_size: usize,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let Some(stream) = connection.stream_mut() else {
        return Err(BridgeError::NotConnected);
    };

    // write_all retries short writes until every byte is sent or the
    // transport fails.
    match time::timeout(timeout, stream.write_all(payload)).await {
        Err(_) => return Err(BridgeError::Timeout),
        Ok(Err(err)) => return Err(BridgeError::Transport(err.to_string())),
        Ok(Ok(())) => {}
    }

    framing::read_message(stream, chunk_size, timeout).await
}

/// Encode a command envelope as raw UTF-8 bytes.
///
/// `params` is JSON-encoded into a string carried by the `parameters`
/// field, defaulting to `"{}"` when the caller supplies none.
#[must_use]
pub fn encode_command(command_type: &str, params: Option<Value>) -> Vec<u8> {
    let parameters = params.unwrap_or_else(|| json!({})).to_string();
    let envelope = json!({
        "type": command_type,
        "parameters": parameters,
    });
    envelope.to_string().into_bytes()
}

/// Decode raw response bytes into the command's result payload.
///
/// # Errors
///
/// - [`BridgeError::InvalidResponse`] — `bytes` is not a well-formed
///   response envelope; the error carries a bounded excerpt of the raw
///   bytes for diagnosis.
/// - [`BridgeError::Remote`] — the envelope reports `success: false`; the
///   peer's `error` string is preserved verbatim, with a generic
///   placeholder when absent.
pub fn decode_response(command_type: &str, bytes: &[u8]) -> Result<Value> {
    let envelope: ResponseEnvelope = serde_json::from_slice(bytes).map_err(|err| {
        let excerpt = String::from_utf8_lossy(&bytes[..bytes.len().min(EXCERPT_BYTES)]).into_owned();
        error!(command = command_type, error = %err, excerpt = %excerpt, "response is not a well-formed envelope");
        BridgeError::InvalidResponse(excerpt)
    })?;

    if !envelope.success {
        let message = envelope
            .error
            .unwrap_or_else(|| "unknown error from peer".to_owned());
        error!(command = command_type, error = %message, "peer rejected command");
        return Err(BridgeError::Remote(message));
    }

    Ok(envelope.data.unwrap_or_else(|| json!({})))
}
