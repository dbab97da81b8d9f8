//! Terminal UI for Murmur
//!
//! A thin shell over [`murmur_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`murmur_app::Runtime`].
//!
//! This crate handles terminal rendering, slash commands and the network
//! transports.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod http;
pub mod terminal;
pub mod transport;
pub mod ui;

pub use commands::{Command, CommandError};
pub use http::HttpClient;
pub use murmur_app::{App, AppAction, AppEvent, Bridge, Driver, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
pub use transport::{TransportError, WsConnection};
