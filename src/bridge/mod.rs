//! Point-to-point command/response bridge to the audio-execution peer.
//!
//! Three collaborating pieces: [`connection`] owns the socket lifecycle,
//! [`framing`] detects message boundaries on the undelimited byte stream,
//! and [`dispatch`] ties them together into a typed command exchange.

pub mod connection;
pub mod dispatch;
pub mod framing;

pub use connection::Connection;
pub use dispatch::Bridge;
