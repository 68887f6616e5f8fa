//! Error types shared across the bridge.

use std::fmt::{Display, Formatter};

/// Shared bridge result type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Bridge error enumeration covering every failure mode of a command
/// exchange with the peer, plus configuration failures in the owning
/// process.
///
/// The command-exchange variants form a closed taxonomy: transport and
/// framing failures (`Transport`, `Timeout`, `NoData`, `IncompleteMessage`)
/// force the stored connection to be dropped so the next call reconnects,
/// while protocol-level failures (`InvalidResponse`, `Remote`) leave the
/// connection usable.
#[derive(Debug)]
pub enum BridgeError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// No transport to the peer could be established before sending.
    NotConnected,
    /// Hard I/O failure on the transport (reset, broken pipe, write failure).
    Transport(String),
    /// The deadline elapsed with the peer slow or unresponsive.
    Timeout,
    /// The peer closed the connection before sending any data.
    NoData,
    /// The deadline was reached with partial data that never parsed.
    IncompleteMessage,
    /// Response bytes are not a well-formed response envelope; carries a
    /// bounded excerpt of the raw bytes for diagnosis.
    InvalidResponse(String),
    /// The peer rejected the command; carries the peer's message verbatim.
    Remote(String),
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::NotConnected => write!(f, "not connected: peer unreachable"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Timeout => write!(f, "timeout: no response from peer within the deadline"),
            Self::NoData => write!(f, "no data: peer closed the connection before responding"),
            Self::IncompleteMessage => {
                write!(f, "incomplete message: deadline reached with a partial response")
            }
            Self::InvalidResponse(excerpt) => {
                write!(f, "invalid response from peer: {excerpt}")
            }
            Self::Remote(msg) => write!(f, "peer error: {msg}"),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
