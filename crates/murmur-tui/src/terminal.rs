//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. The persistent connection is a
//! WebSocket and the collaborator endpoints are plain HTTP.

use std::{
    io::{self, Stdout, stdout},
    path::Path,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use murmur_app::{App, AppAction, AppEvent, Driver, Inbound, NoticeKind, RequestOutcome, View};
use murmur_proto::http::{UploadRequest, UsernameChangeRequest};
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;

use crate::{
    KeyInput,
    commands::Command,
    http::HttpClient,
    transport::{self, TransportError, WsConnection},
    ui,
};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Sending on a connection that is not open.
    #[error("not connected")]
    NotConnected,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui) and network
/// communication (tokio-tungstenite, reqwest). Slash commands typed into
/// the composer are intercepted here before they reach the app.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    connection: Option<WsConnection>,
    http: HttpClient,
    view: View,
}

impl TerminalDriver {
    /// Create a new terminal driver for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let event_stream = EventStream::new();

        Ok(Self {
            terminal,
            event_stream,
            connection: None,
            http: HttpClient::new(base_url),
            view: View::Chat,
        })
    }

    /// The last view navigated to.
    pub fn view(&self) -> View {
        self.view
    }

    /// HTTP client for the collaborator endpoints.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Convert a crossterm key event to `KeyInput`.
    fn convert_key(key: KeyEvent) -> Option<KeyInput> {
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                Some(KeyInput::ShiftEnter)
            },
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Esc => Some(KeyInput::Esc),
            _ => None,
        }
    }

    fn handle_key(app: &mut App, key: KeyEvent) -> KeyOutcome {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return KeyOutcome::Actions(app.quit());
        }

        match Self::convert_key(key) {
            Some(KeyInput::Enter) if app.input().trim_start().starts_with('/') => {
                let line = app.take_input();
                match Command::parse(&line) {
                    Some(Ok(command)) => KeyOutcome::Command(command),
                    Some(Err(e)) => {
                        app.show_notice(e.to_string(), NoticeKind::Error);
                        KeyOutcome::Actions(vec![AppAction::Render])
                    },
                    None => KeyOutcome::Actions(app.send_message(line)),
                }
            },
            Some(input) => KeyOutcome::Actions(app.handle(AppEvent::Key(input))),
            None => KeyOutcome::Actions(vec![]),
        }
    }

    async fn run_command(app: &mut App, command: Command) -> Vec<AppAction> {
        let mut actions = match command {
            Command::Name(name) => app.change_username(&name),
            Command::Delete => app.toggle_delete_mode(),
            Command::Select(message_id) => app.toggle_selection(&message_id),
            Command::Confirm => app.delete_selected(),
            Command::Quit => app.quit(),
            Command::Upload(path) => match tokio::fs::read(&path).await {
                Ok(bytes) => app.upload(upload_name(&path), bytes),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot read upload");
                    app.show_notice(format!("Cannot read {}: {e}", path.display()), NoticeKind::Error);
                    vec![]
                },
            },
        };
        // The composer was cleared either way
        actions.push(AppAction::Render);
        actions
    }
}

enum KeyOutcome {
    Actions(Vec<AppAction>),
    Command(Command),
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        tokio::select! {
            biased;

            // Terminal events
            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        match Self::handle_key(app, key) {
                            KeyOutcome::Actions(actions) => Ok(actions),
                            KeyOutcome::Command(command) => Ok(Self::run_command(app, command).await),
                        }
                    },
                    Some(Ok(Event::Resize(..))) => Ok(vec![AppAction::Render]),
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    _ => Ok(vec![]),
                }
            }

            // Tick timeout
            () = tokio::time::sleep(TICK_INTERVAL) => {
                Ok(app.handle(AppEvent::Tick { now: Instant::now() }))
            }
        }
    }

    async fn discover_endpoint(&mut self) -> Result<String, Self::Error> {
        Ok(self.http.server_ip().await?)
    }

    async fn connect(&mut self, url: &str) -> Result<(), Self::Error> {
        let connection = transport::connect(url).await?;
        self.connection = Some(connection);
        Ok(())
    }

    async fn send_text(&mut self, text: String) -> Result<(), Self::Error> {
        let connection = self.connection.as_ref().ok_or(TerminalError::NotConnected)?;
        // A dead socket drops the frame; its pending close ends the session
        connection.send(text).await;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Inbound> {
        self.connection.as_mut().and_then(|conn| conn.from_server.try_recv().ok())
    }

    async fn change_username(&mut self, request: &UsernameChangeRequest) -> RequestOutcome {
        self.http.change_username(request).await
    }

    async fn upload(&mut self, request: &UploadRequest) -> RequestOutcome {
        self.http.upload(request).await
    }

    fn navigate(&mut self, view: View) {
        tracing::info!(?view, "navigating");
        self.view = view;
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| {
            ui::render(frame, app);
        })?;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.stop();
        }
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
