#![forbid(unsafe_code)]

//! `webchuck-bridge` — command-line front-end for the peer bridge.
//!
//! Loads configuration, applies host/port overrides, and dispatches a
//! single command to the audio-execution peer, printing the result payload
//! or rendering the failure as a user-facing message.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use webchuck_bridge::bridge::Bridge;
use webchuck_bridge::{BridgeConfig, BridgeError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "webchuck-bridge", about = "Send commands to a WebChucK peer", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the peer host from the config.
    #[arg(long)]
    host: Option<String>,

    /// Override the peer port from the config.
    #[arg(long)]
    port: Option<u16>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute a ChucK source file on the peer.
    Execute {
        /// Path to the source file to run.
        file: PathBuf,
    },

    /// Stop the peer's current execution.
    Stop,

    /// List the audio files available to executed code.
    ListAudio,
}

fn main() {
    let args = Cli::parse();

    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    let outcome = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| BridgeError::Config(format!("failed to build tokio runtime: {err}")))
        .and_then(|runtime| runtime.block_on(run(args)));

    if let Err(err) = outcome {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<()> {
    let mut config = match args.config {
        Some(ref path) => BridgeConfig::load_from_path(path)?,
        None => BridgeConfig::default(),
    };

    // CLI overrides re-target the peer without touching the config file.
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    info!(host = %config.host, port = config.port, "dispatching to peer");

    let (command_type, params) = build_command(&args.command)?;
    let bridge = Bridge::new(&config);
    let data = bridge.send_command(command_type, params).await?;
    bridge.disconnect().await;

    println!("{}", serde_json::to_string_pretty(&data).unwrap_or_default());
    Ok(())
}

/// Map a CLI subcommand onto the peer's command type and parameters.
fn build_command(command: &Command) -> Result<(&'static str, Option<Value>)> {
    match command {
        Command::Execute { file } => {
            let code = std::fs::read_to_string(file).map_err(|err| {
                BridgeError::Config(format!("cannot read source file {}: {err}", file.display()))
            })?;
            Ok(("code.Execute", Some(Value::String(code))))
        }
        Command::Stop => Ok(("code.Stop", None)),
        Command::ListAudio => Ok(("audio.List", None)),
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| BridgeError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| BridgeError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
