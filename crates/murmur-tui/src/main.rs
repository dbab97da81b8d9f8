//! Murmur TUI entry point.

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::{Parser, ValueEnum};
use murmur_app::{RuntimeConfig, View};
use murmur_client::{ClientConfig, ConnectionConfig, RenameMatching};
use murmur_proto::http::{DEFAULT_WS_PATH, DEFAULT_WS_PORT};
use murmur_tui::{Runtime, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How a rename finds the messages to relabel.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Matching {
    /// Messages shown under the old display name
    Label,
    /// Messages authored by the renamed account
    Sender,
}

impl From<Matching> for RenameMatching {
    fn from(matching: Matching) -> Self {
        match matching {
            Matching::Label => Self::Label,
            Matching::Sender => Self::Sender,
        }
    }
}

/// Murmur terminal chat client
#[derive(Parser, Debug)]
#[command(name = "murmur-tui")]
#[command(about = "Terminal client for Murmur chat servers")]
#[command(version)]
struct Args {
    /// Base URL of the server's HTTP endpoints
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Port of the WebSocket endpoint
    #[arg(long, default_value_t = DEFAULT_WS_PORT)]
    ws_port: u16,

    /// Path of the WebSocket endpoint
    #[arg(long, default_value = DEFAULT_WS_PATH)]
    ws_path: String,

    /// How display name changes relabel existing messages
    #[arg(long, value_enum, default_value_t = Matching::Label)]
    rename_matching: Matching,

    /// Log filter, e.g. `info` or `murmur_client=debug`
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to this file. Nothing is logged without it, since the
    /// terminal is taken over by the UI.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = RuntimeConfig {
        client: ClientConfig { rename_matching: args.rename_matching.into() },
        connection: ConnectionConfig { ws_port: args.ws_port, ws_path: args.ws_path.clone() },
        ..Default::default()
    };

    let driver = TerminalDriver::new(&args.server)?;
    let driver = Runtime::new(driver, config).run().await?;
    let view = driver.view();
    // Restore the terminal before reporting
    drop(driver);

    if view == View::Login {
        return Err(format!("session ended, log in again at {}/login", args.server).into());
    }
    Ok(())
}
