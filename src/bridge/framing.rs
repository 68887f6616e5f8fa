//! Message boundary detection for the peer's wire convention.
//!
//! The wire format carries no length prefix, delimiter, or content-length
//! header. The only boundary signal is that the bytes received so far parse
//! as one complete JSON value, so the receiver accumulates chunks and
//! re-attempts a full-buffer parse after each read. The peer relies on this
//! convention, so it is reproduced as-is; a more robust framing scheme on
//! the receive side alone would desynchronize the two ends. Isolating the
//! convention in this module keeps the dispatcher framing-agnostic.
//!
//! # Outcomes
//!
//! | Condition                                   | Result                 |
//! |---------------------------------------------|------------------------|
//! | Accumulated bytes parse as JSON             | `Ok(buffer)`           |
//! | Peer closed before sending anything         | `Err(NoData)`          |
//! | Deadline reached, nothing received          | `Err(NoData)`          |
//! | Deadline or close with unparsable partial   | `Err(IncompleteMessage)` |
//! | Reset, broken pipe, other hard I/O failure  | `Err(Transport)`       |

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::{BridgeError, Result};

/// Default maximum bytes requested per read.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Default deadline for one whole receive call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Read one complete JSON message from `transport`.
///
/// Reads up to `chunk_size` bytes at a time under a single deadline of
/// `overall_timeout` covering the whole call, returning the accumulated
/// buffer the moment it parses as one complete JSON value (the fast path:
/// most responses arrive in a single chunk). A read deadline expiring
/// mid-receive is not itself a failure — the buffer gets one final parse
/// attempt before the call is judged.
///
/// # Errors
///
/// - [`BridgeError::NoData`] — the peer closed, or the deadline passed,
///   before any bytes arrived.
/// - [`BridgeError::IncompleteMessage`] — bytes arrived but never formed a
///   complete JSON value before the deadline or peer close. The transport
///   did not fail here; only framing did.
/// - [`BridgeError::Timeout`] — the transport itself reported a timeout.
/// - [`BridgeError::Transport`] — hard I/O failure (reset, broken pipe),
///   with the cause propagated.
pub async fn read_message<S>(
    transport: &mut S,
    chunk_size: usize,
    overall_timeout: Duration,
) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let deadline = Instant::now() + overall_timeout;
    let mut buffer = BytesMut::with_capacity(chunk_size);
    let mut chunk = vec![0u8; chunk_size];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            warn!(received = buffer.len(), "receive deadline reached");
            break;
        }

        match time::timeout(remaining, transport.read(&mut chunk)).await {
            Err(_) => {
                warn!(received = buffer.len(), "receive deadline reached mid-read");
                break;
            }
            Ok(Ok(0)) => {
                if buffer.is_empty() {
                    return Err(BridgeError::NoData);
                }
                debug!(received = buffer.len(), "peer closed after sending data");
                break;
            }
            Ok(Ok(n)) => {
                buffer.extend_from_slice(&chunk[..n]);
                if is_complete(&buffer) {
                    debug!(bytes = buffer.len(), "received complete message");
                    return Ok(buffer.to_vec());
                }
                // Incomplete so far; keep reading.
            }
            Ok(Err(err)) => {
                return Err(map_read_error(&err));
            }
        }
    }

    // Deadline or peer-close-with-data: one final parse attempt.
    if buffer.is_empty() {
        return Err(BridgeError::NoData);
    }
    if is_complete(&buffer) {
        debug!(bytes = buffer.len(), "message completed at receive end");
        Ok(buffer.to_vec())
    } else {
        Err(BridgeError::IncompleteMessage)
    }
}

/// Whether `buffer` holds exactly one complete, well-formed JSON value.
fn is_complete(buffer: &[u8]) -> bool {
    serde_json::from_slice::<serde::de::IgnoredAny>(buffer).is_ok()
}

/// Map a read-side I/O error onto the failure taxonomy.
fn map_read_error(err: &io::Error) -> BridgeError {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => BridgeError::Timeout,
        _ => BridgeError::Transport(err.to_string()),
    }
}
