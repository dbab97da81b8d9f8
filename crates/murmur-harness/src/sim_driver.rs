//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`murmur_app::Runtime`] orchestration code runs in both production and
//! simulation. Time is virtual: every poll advances the clock by a fixed
//! step.

use std::{
    collections::VecDeque,
    sync::{MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use murmur_app::{App, AppAction, AppEvent, Driver, Inbound, KeyInput, RequestOutcome, View};
use murmur_proto::http::{UploadRequest, UsernameChangeRequest};

use crate::{
    invariants::{ClientSnapshot, InvariantRegistry, SystemSnapshot, Violation},
    sim_server::{SharedSimServer, SimServer},
};

/// Wall clock at virtual time zero, in Unix milliseconds.
pub const SIM_EPOCH_MILLIS: u64 = 1_700_000_000_000;

/// Default virtual time advanced per poll.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Error type for simulation driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimDriverError {
    /// The server does not know the account.
    UnknownUser(String),
    /// A frame was sent before `connect`.
    NotConnected,
}

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUser(user_id) => write!(f, "unknown user {user_id}"),
            Self::NotConnected => f.write_str("not connected"),
        }
    }
}

impl std::error::Error for SimDriverError {}

/// Scripted user input.
#[derive(Debug, Clone)]
pub enum SimInput {
    /// Raw app event.
    Event(AppEvent),
    /// Type `text` into the composer and press Enter.
    Compose(String),
    /// Request a display name change.
    ChangeUsername(String),
    /// Upload a file.
    Upload {
        /// File name.
        filename: String,
        /// File contents.
        bytes: Vec<u8>,
    },
    /// Enter or leave delete mode.
    ToggleDeleteMode,
    /// Toggle selection of a message in delete mode.
    Select(String),
    /// Delete the selection.
    DeleteSelected,
    /// Quit.
    Quit,
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] so the same [`murmur_app::Runtime`] orchestration
/// code runs in both the terminal client and simulation tests.
pub struct SimDriver {
    server: SharedSimServer,
    user_id: String,
    ws_id: Option<String>,
    connected_url: Option<String>,
    inputs: VecDeque<SimInput>,
    start: Instant,
    elapsed: Duration,
    tick: Duration,
    navigations: Vec<View>,
    renders: usize,
    stopped: bool,
    invariants: Option<InvariantRegistry>,
    violations: Vec<Violation>,
}

impl SimDriver {
    /// Create a driver that logs in as `user_id` on `server`.
    pub fn new(server: SharedSimServer, user_id: impl Into<String>) -> Self {
        Self {
            server,
            user_id: user_id.into(),
            ws_id: None,
            connected_url: None,
            inputs: VecDeque::new(),
            start: Instant::now(),
            elapsed: Duration::ZERO,
            tick: DEFAULT_TICK,
            navigations: Vec::new(),
            renders: 0,
            stopped: false,
            invariants: None,
            violations: Vec::new(),
        }
    }

    /// Check invariants against the App on every render.
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Set the virtual time advanced per poll.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Queue scripted input.
    pub fn push_input(&mut self, input: SimInput) {
        self.inputs.push_back(input);
    }

    /// Advance the virtual clock.
    pub fn advance(&mut self, by: Duration) {
        self.elapsed += by;
    }

    /// Connection id assigned by the server.
    pub fn ws_id(&self) -> Option<&str> {
        self.ws_id.as_deref()
    }

    /// URL passed to `connect`.
    pub fn connected_url(&self) -> Option<&str> {
        self.connected_url.as_deref()
    }

    /// Views navigated to, in order.
    pub fn navigations(&self) -> &[View] {
        &self.navigations
    }

    /// Number of renders.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Whether `stop` was called.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Invariant violations observed at render time.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether scripted input remains.
    pub fn has_input(&self) -> bool {
        !self.inputs.is_empty()
    }

    fn server(&self) -> MutexGuard<'_, SimServer> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_input(app: &mut App, input: SimInput) -> Vec<AppAction> {
        match input {
            SimInput::Event(event) => app.handle(event),
            SimInput::Compose(text) => {
                let mut actions = Vec::new();
                for c in text.chars() {
                    actions.extend(app.handle(AppEvent::Key(KeyInput::Char(c))));
                }
                actions.extend(app.handle(AppEvent::Key(KeyInput::Enter)));
                actions
            },
            SimInput::ChangeUsername(name) => app.change_username(&name),
            SimInput::Upload { filename, bytes } => app.upload(filename, bytes),
            SimInput::ToggleDeleteMode => app.toggle_delete_mode(),
            SimInput::Select(message_id) => app.toggle_selection(&message_id),
            SimInput::DeleteSelected => app.delete_selected(),
            SimInput::Quit => app.quit(),
        }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        self.elapsed += self.tick;
        Ok(self.inputs.pop_front().map(|input| Self::apply_input(app, input)).unwrap_or_default())
    }

    async fn discover_endpoint(&mut self) -> Result<String, Self::Error> {
        Ok(self.server().ip().to_string())
    }

    async fn connect(&mut self, url: &str) -> Result<(), Self::Error> {
        let ws_id = self
            .server()
            .connect(&self.user_id)
            .ok_or_else(|| SimDriverError::UnknownUser(self.user_id.clone()))?;
        self.ws_id = Some(ws_id);
        self.connected_url = Some(url.to_string());
        Ok(())
    }

    async fn send_text(&mut self, text: String) -> Result<(), Self::Error> {
        let ws_id = self.ws_id.as_deref().ok_or(SimDriverError::NotConnected)?;
        self.server().handle_text(ws_id, &text);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Inbound> {
        let ws_id = self.ws_id.as_deref()?;
        self.server().recv(ws_id)
    }

    async fn change_username(&mut self, request: &UsernameChangeRequest) -> RequestOutcome {
        self.server().change_username(request)
    }

    async fn upload(&mut self, request: &UploadRequest) -> RequestOutcome {
        self.server().upload(request)
    }

    fn navigate(&mut self, view: View) {
        self.navigations.push(view);
    }

    fn now(&self) -> Instant {
        self.start + self.elapsed
    }

    fn unix_millis(&self) -> u64 {
        SIM_EPOCH_MILLIS.saturating_add(u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX))
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.renders += 1;

        if let Some(registry) = &self.invariants {
            let snapshot = SystemSnapshot::single(ClientSnapshot::from_app(&self.user_id, app));
            if let Err(violations) = registry.check_all(&snapshot) {
                for violation in &violations {
                    tracing::error!(%violation, "invariant violated");
                }
                self.violations.extend(violations);
            }
        }

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(ws_id) = &self.ws_id {
            self.server().close(ws_id, true);
        }
        self.stopped = true;
    }
}
