//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each front end implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, time::Instant};

use murmur_proto::http::{UploadRequest, UsernameChangeRequest};

use crate::{App, AppAction, RequestOutcome, View};

/// Inbound traffic on the persistent connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text frame.
    Text(String),
    /// The connection closed.
    Closed {
        /// Whether the close handshake completed normally.
        clean: bool,
    },
}

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal client and in
/// simulation.
///
/// # Implementations
///
/// - **Terminal**: crossterm input, WebSocket via tokio-tungstenite, HTTP via
///   reqwest
/// - **Simulation**: in-process chat server with a virtual clock
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Poll for the next input event and feed it to the app.
    ///
    /// Returns the app's actions, empty if no input was ready.
    fn poll_event(
        &mut self,
        app: &mut App,
    ) -> impl Future<Output = Result<Vec<AppAction>, Self::Error>> + Send;

    /// Ask the discovery endpoint which host to connect to.
    fn discover_endpoint(&mut self) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Open the persistent connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn connect(&mut self, url: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send a text frame.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive inbound traffic.
    ///
    /// Returns `None` if nothing is ready. Must not block indefinitely.
    fn recv(&mut self) -> impl Future<Output = Option<Inbound>> + Send;

    /// Execute a username change request.
    fn change_username(
        &mut self,
        request: &UsernameChangeRequest,
    ) -> impl Future<Output = RequestOutcome> + Send;

    /// Execute an upload request.
    fn upload(&mut self, request: &UploadRequest) -> impl Future<Output = RequestOutcome> + Send;

    /// Switch to another view.
    fn navigate(&mut self, view: View);

    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Current wall clock in milliseconds since the Unix epoch.
    fn unix_millis(&self) -> u64;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
