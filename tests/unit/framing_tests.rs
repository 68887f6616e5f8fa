//! Unit tests for the framing receiver.
//!
//! Covers the boundary-detection contract: fast-path return the moment the
//! accumulated buffer parses, chunked reassembly, peer-close and deadline
//! edge cases, and the mapping of hard I/O failures.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};

use webchuck_bridge::bridge::framing::{read_message, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT};
use webchuck_bridge::BridgeError;

/// A transport whose first read fails with the given error kind.
struct FailingTransport(io::ErrorKind);

impl AsyncRead for FailingTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(self.0, "injected failure")))
    }
}

/// A complete JSON message available in one chunk is returned immediately,
/// without waiting for the peer to close or the deadline to pass.
#[tokio::test]
async fn complete_message_returns_on_fast_path() {
    let (mut peer, mut transport) = tokio::io::duplex(1024);
    let message = br#"{"success":true,"data":{"shred":1}}"#;

    peer.write_all(message).await.expect("peer write must succeed");
    // The peer stays open: only the successful parse can end the call.

    let received = read_message(&mut transport, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT)
        .await
        .expect("a complete message must be returned");

    assert_eq!(
        received, message,
        "the returned buffer must be exactly the bytes the peer sent"
    );
}

/// A message split across several writes with delays under the deadline is
/// reconstructed and returned exactly once.
#[tokio::test]
async fn chunked_message_is_reassembled() {
    let (mut peer, mut transport) = tokio::io::duplex(1024);
    let message = br#"{"success":true,"data":{"files":["kick.wav","snare.wav"]}}"#;

    let writer = tokio::spawn(async move {
        for piece in message.chunks(7) {
            peer.write_all(piece).await.expect("peer write must succeed");
            peer.flush().await.expect("peer flush must succeed");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        // Keep the peer open past the last write so only framing ends the read.
        tokio::time::sleep(Duration::from_millis(50)).await;
    });

    let received = read_message(&mut transport, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT)
        .await
        .expect("the split message must be reconstructed");

    assert_eq!(received, message, "reassembly must be byte-exact");
    writer.await.expect("writer task must not panic");
}

/// A chunk size smaller than the message forces multiple reads but still
/// yields the complete message.
#[tokio::test]
async fn small_chunk_size_still_completes() {
    let message: &[u8] = br#"{"success":true,"data":{"status":"stopped"}}"#;
    let mut transport = message;

    let received = read_message(&mut transport, 8, DEFAULT_TIMEOUT)
        .await
        .expect("message must complete across many small reads");

    assert_eq!(received, message);
}

/// A zero-byte read with nothing accumulated is a hard failure, not a
/// silent empty success.
#[tokio::test]
async fn immediate_close_fails_with_no_data() {
    let mut transport: &[u8] = b"";

    let result = read_message(&mut transport, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT).await;

    assert!(
        matches!(result, Err(BridgeError::NoData)),
        "peer closing before any data must be NoData, got: {result:?}"
    );
}

/// A peer that closes after sending an unparsable fragment yields
/// `IncompleteMessage` — the transport did not fail, framing did.
#[tokio::test]
async fn close_with_partial_data_fails_incomplete() {
    let mut transport: &[u8] = br#"{"success": tr"#;

    let result = read_message(&mut transport, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT).await;

    assert!(
        matches!(result, Err(BridgeError::IncompleteMessage)),
        "partial data at close must be IncompleteMessage, got: {result:?}"
    );
}

/// The deadline passing with an unparsable buffer and the peer still open
/// is reported as `IncompleteMessage`, distinct from a transport error.
#[tokio::test]
async fn deadline_with_partial_data_fails_incomplete() {
    let (mut peer, mut transport) = tokio::io::duplex(1024);

    peer.write_all(br#"{"success":"#)
        .await
        .expect("peer write must succeed");

    let result = read_message(&mut transport, DEFAULT_CHUNK_SIZE, Duration::from_millis(100)).await;

    assert!(
        matches!(result, Err(BridgeError::IncompleteMessage)),
        "deadline with partial data must be IncompleteMessage, got: {result:?}"
    );
}

/// The deadline passing before any byte arrives is reported as `NoData`.
#[tokio::test]
async fn deadline_with_no_data_fails_no_data() {
    let (_peer, mut transport) = tokio::io::duplex(1024);

    let result = read_message(&mut transport, DEFAULT_CHUNK_SIZE, Duration::from_millis(100)).await;

    assert!(
        matches!(result, Err(BridgeError::NoData)),
        "deadline with empty buffer must be NoData, got: {result:?}"
    );
}

/// Trailing bytes after a JSON value keep the buffer unparsable as a single
/// message, so the call ends in `IncompleteMessage` rather than returning a
/// message plus garbage.
#[tokio::test]
async fn trailing_garbage_never_completes() {
    let mut transport: &[u8] = b"{}garbage";

    let result = read_message(&mut transport, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT).await;

    assert!(
        matches!(result, Err(BridgeError::IncompleteMessage)),
        "a buffer with trailing garbage must not be returned, got: {result:?}"
    );
}

/// A hard transport error (connection reset) fails immediately with
/// `Transport`, propagating the cause.
#[tokio::test]
async fn hard_error_fails_with_transport() {
    let mut transport = FailingTransport(io::ErrorKind::ConnectionReset);

    let result = read_message(&mut transport, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT).await;

    match result {
        Err(BridgeError::Transport(msg)) => assert!(
            msg.contains("injected failure"),
            "the cause must be propagated, got: {msg}"
        ),
        other => panic!("expected Err(BridgeError::Transport), got: {other:?}"),
    }
}

/// An I/O error of timeout kind maps to `Timeout`, not `Transport`.
#[tokio::test]
async fn timed_out_error_kind_maps_to_timeout() {
    let mut transport = FailingTransport(io::ErrorKind::TimedOut);

    let result = read_message(&mut transport, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT).await;

    assert!(
        matches!(result, Err(BridgeError::Timeout)),
        "io timeout kind must map to Timeout, got: {result:?}"
    );
}
