//! Application layer for Murmur
//!
//! Pure state machines and a generic runtime for UI and protocol
//! orchestration, so simulation tests exercise the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: UI state machine (composer, delete mode, notices, navigation)
//! - [`Bridge`]: Protocol bridge (translates App actions to Client events)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod driver;
mod event;
mod input;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::{App, AppConfig};
pub use bridge::Bridge;
pub use driver::{Driver, Inbound};
pub use event::{AppEvent, RequestOutcome};
pub use input::KeyInput;
pub use runtime::{Runtime, RuntimeConfig};
pub use state::{ConnectionState, Notice, NoticeKind, NoticePhase, View};
