//! Client
//!
//! Action-based client state machine for the Murmur chat protocol. Holds the
//! session identity and user directory, and reconciles optimistically rendered
//! local messages against the authoritative frames delivered by the server.
//!
//! # Architecture
//!
//! The client is Sans-IO. The caller feeds [`ClientEvent`]s (inbound text
//! frames, local intents) into [`Client::handle`] and executes the returned
//! [`ClientAction`]s: envelopes to send and [`TranscriptOp`]s to render.
//! Sends go through the [`Connection`] state machine, which only releases
//! frames while the connection is open.
//!
//! # Components
//!
//! - [`Client`]: top-level state machine and frame dispatcher
//! - [`Session`] / [`UserDirectory`]: identity and display names
//! - [`Reconciler`] / [`Transcript`]: echo correlation, renames, deletions
//! - [`Connection`]: persistent connection lifecycle and send guard

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
mod connection;
mod directory;
mod dispatch;
mod error;
mod event;
mod reconciler;
mod session;
mod transcript;

pub use client::Client;
pub use config::{ClientConfig, RenameMatching};
pub use connection::{CloseOutcome, Connection, ConnectionConfig, ConnectionState};
pub use directory::{DELETED_ACCOUNT, DirectoryEntry, UserDirectory};
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent};
pub use reconciler::Reconciler;
pub use session::Session;
pub use transcript::{Direction, LocalId, MessageView, Transcript, TranscriptOp};
