#![forbid(unsafe_code)]

//! Command/response bridge to a WebChucK audio-execution peer over raw TCP
//! JSON with parse-until-success framing.

pub mod bridge;
pub mod config;
pub mod errors;

pub use config::BridgeConfig;
pub use errors::{BridgeError, Result};
