//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the
//! interactive state of the client completely decoupled from I/O and protocol
//! mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Mirrors the client's transcript by applying the same transcript ops.
//! - Owns the composer buffer, delete mode and its selection.
//! - Shows transient notices and expires them on clock ticks.
//! - Tracks connection state and the current view for navigation.

use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};

use murmur_client::{MessageView, Transcript, TranscriptOp};

use crate::{
    AppAction, AppEvent, ConnectionState, KeyInput, Notice, NoticeKind, NoticePhase,
    RequestOutcome, View,
};

/// How long a notice stays fully visible.
pub const DEFAULT_NOTICE_VISIBLE: Duration = Duration::from_secs(5);

/// How long a notice takes to fade out.
pub const DEFAULT_NOTICE_FADE: Duration = Duration::from_millis(500);

/// App configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Time a notice is fully visible.
    pub notice_visible: Duration,
    /// Fade duration after the visible period.
    pub notice_fade: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { notice_visible: DEFAULT_NOTICE_VISIBLE, notice_fade: DEFAULT_NOTICE_FADE }
    }
}

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies, fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    config: AppConfig,
    /// Connection state.
    state: ConnectionState,
    /// Current view.
    view: View,
    /// Our display name. `None` before Initialization.
    display_name: Option<String>,
    /// Mirror of the client transcript.
    transcript: Transcript,
    /// Composer buffer.
    input: String,
    /// Whether message selection for deletion is active.
    delete_mode: bool,
    /// Durable ids selected for deletion.
    selected: BTreeSet<String>,
    /// Transient status notice. `None` if no notice.
    notice: Option<Notice>,
    /// Time of the most recent tick.
    clock: Option<Instant>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl App {
    /// Create a new App.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
            view: View::Chat,
            display_name: None,
            transcript: Transcript::new(),
            input: String::new(),
            delete_mode: false,
            selected: BTreeSet::new(),
            notice: None,
            clock: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick { now } => self.handle_tick(now),
            AppEvent::Connecting | AppEvent::Connected => {
                self.state = ConnectionState::Connecting;
                vec![AppAction::Render]
            },
            AppEvent::SessionStarted { user_id, display_name } => {
                self.state = ConnectionState::Connected { user_id };
                self.display_name = Some(display_name);
                vec![AppAction::Render]
            },
            AppEvent::DisplayNameChanged { display_name } => {
                self.display_name = Some(display_name);
                vec![AppAction::Render]
            },
            AppEvent::Transcript(op) => {
                self.apply_transcript_op(&op);
                vec![AppAction::Render]
            },
            AppEvent::ConnectionClosed { clean } => self.handle_closed(clean),
            AppEvent::UsernameChangeFinished(outcome) => {
                self.show_outcome(outcome, "Username changed", "Username change failed");
                vec![AppAction::Render]
            },
            AppEvent::UploadFinished(outcome) => {
                self.show_outcome(outcome, "Upload complete", "Upload failed");
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.show_notice(format!("Error: {message}"), NoticeKind::Error);
                vec![AppAction::Render]
            },
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Char(c) => {
                self.input.push(c);
                vec![AppAction::Render]
            },
            KeyInput::ShiftEnter => {
                self.input.push('\n');
                vec![AppAction::Render]
            },
            KeyInput::Backspace => {
                self.input.pop();
                vec![AppAction::Render]
            },
            KeyInput::Enter => self.submit(),
            KeyInput::Esc if self.delete_mode => self.toggle_delete_mode(),
            KeyInput::Esc => self.quit(),
        }
    }

    fn submit(&mut self) -> Vec<AppAction> {
        if self.input.trim().is_empty() {
            return vec![];
        }
        let content = std::mem::take(&mut self.input);
        self.send_message(content)
    }

    fn handle_tick(&mut self, now: Instant) -> Vec<AppAction> {
        self.clock = Some(now);

        let Some(notice) = self.notice.as_mut() else {
            return vec![];
        };

        let shown_at = *notice.shown_at.get_or_insert(now);
        let elapsed = now.saturating_duration_since(shown_at);

        if elapsed >= self.config.notice_visible + self.config.notice_fade {
            self.notice = None;
            vec![AppAction::Render]
        } else if elapsed >= self.config.notice_visible && notice.phase == NoticePhase::Visible {
            notice.phase = NoticePhase::Fading;
            vec![AppAction::Render]
        } else {
            vec![]
        }
    }

    fn handle_closed(&mut self, clean: bool) -> Vec<AppAction> {
        self.state = ConnectionState::Closed { clean };
        self.delete_mode = false;
        self.selected.clear();

        if clean {
            vec![AppAction::Render, AppAction::Quit]
        } else {
            self.view = View::Login;
            vec![AppAction::Navigate(View::Login), AppAction::Render, AppAction::Quit]
        }
    }

    fn apply_transcript_op(&mut self, op: &TranscriptOp) {
        if let TranscriptOp::Remove { local_id } = op
            && let Some(message_id) =
                self.transcript.get(*local_id).and_then(|v| v.message_id.as_ref())
        {
            self.selected.remove(message_id);
        }
        self.transcript.apply(op);
    }

    fn show_outcome(&mut self, outcome: RequestOutcome, success: &str, failure: &str) {
        match outcome {
            RequestOutcome::Succeeded => self.show_notice(success, NoticeKind::Success),
            RequestOutcome::Failed { reason } => {
                self.show_notice(format!("{failure}: {reason}"), NoticeKind::Error);
            },
        }
    }

    /// Show a transient notice, replacing any current one.
    pub fn show_notice(&mut self, text: impl Into<String>, kind: NoticeKind) {
        let mut notice = Notice::new(text, kind);
        notice.shown_at = self.clock;
        self.notice = Some(notice);
    }

    /// Send a chat message.
    pub fn send_message(&self, content: String) -> Vec<AppAction> {
        vec![AppAction::SendMessage { content }, AppAction::Render]
    }

    /// Enter or leave delete mode. Leaving clears the selection.
    pub fn toggle_delete_mode(&mut self) -> Vec<AppAction> {
        self.delete_mode = !self.delete_mode;
        if !self.delete_mode {
            self.selected.clear();
        }
        vec![AppAction::Render]
    }

    /// Toggle selection of a message in delete mode.
    ///
    /// Only our own confirmed messages can be selected.
    pub fn toggle_selection(&mut self, message_id: &str) -> Vec<AppAction> {
        if !self.delete_mode {
            return vec![];
        }

        let selectable =
            self.transcript.by_message_id(message_id).is_some_and(MessageView::is_confirmed_own);
        if !selectable {
            return vec![];
        }

        if !self.selected.remove(message_id) {
            self.selected.insert(message_id.to_string());
        }
        vec![AppAction::Render]
    }

    /// Delete the selected messages and leave delete mode.
    pub fn delete_selected(&mut self) -> Vec<AppAction> {
        if !self.delete_mode {
            return vec![];
        }

        self.delete_mode = false;
        let message_ids: Vec<String> = std::mem::take(&mut self.selected).into_iter().collect();

        if message_ids.is_empty() {
            vec![AppAction::Render]
        } else {
            vec![AppAction::DeleteMessages { message_ids }, AppAction::Render]
        }
    }

    /// Request a display name change. Blank names are ignored.
    pub fn change_username(&self, new_username: &str) -> Vec<AppAction> {
        let new_username = new_username.trim();
        if new_username.is_empty() {
            return vec![];
        }
        vec![AppAction::ChangeUsername { new_username: new_username.to_string() }]
    }

    /// Upload a file.
    pub fn upload(&self, filename: String, bytes: Vec<u8>) -> Vec<AppAction> {
        vec![AppAction::Upload { filename, bytes }]
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Current connection state.
    pub fn connection_state(&self) -> &ConnectionState {
        &self.state
    }

    /// Current view.
    pub fn view(&self) -> View {
        self.view
    }

    /// Our display name. `None` before Initialization.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Rendered transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Composer contents.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Clear the composer and return what it held.
    ///
    /// Front ends use this to handle a submitted line themselves, such as a
    /// command, instead of sending it as a message.
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    /// Whether delete mode is active.
    pub fn delete_mode(&self) -> bool {
        self.delete_mode
    }

    /// Message ids selected for deletion.
    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// Current notice. `None` if nothing is shown.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }
}
