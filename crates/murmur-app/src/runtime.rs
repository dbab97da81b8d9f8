//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Bridge`]: Protocol bridge to Client
//! - [`Driver`]: Platform-specific I/O
//!
//! HTTP requests are awaited in place. Their results become notices, shown
//! once and never retried.

use murmur_client::{ClientConfig, ConnectionConfig};
use murmur_proto::http::UploadRequest;

use crate::{App, AppAction, AppConfig, AppEvent, Bridge, Driver, Inbound};

/// Runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Client configuration.
    pub client: ClientConfig,
    /// Connection configuration.
    pub connection: ConnectionConfig,
    /// App configuration.
    pub app: AppConfig,
}

/// Generic runtime that orchestrates App, Bridge, and Driver.
pub struct Runtime<D: Driver> {
    driver: D,
    app: App,
    bridge: Bridge,
}

impl<D: Driver> Runtime<D> {
    /// Create a new runtime with the given driver.
    pub fn new(driver: D, config: RuntimeConfig) -> Self {
        let app = App::new(config.app);
        let bridge = Bridge::new(config.client, config.connection);
        Self { driver, app, bridge }
    }

    /// Run the main event loop until the app quits or the connection closes.
    ///
    /// Returns the stopped driver so the caller can inspect where the
    /// session ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<D, D::Error> {
        self.driver.render(&self.app)?;

        if !self.start().await? {
            while !self.step().await? {}
        }

        self.driver.stop();
        Ok(self.driver)
    }

    /// Discover the endpoint and open the connection.
    ///
    /// Returns `true` if the application should quit.
    pub async fn start(&mut self) -> Result<bool, D::Error> {
        let events = self.bridge.begin_discovery();
        if self.process_bridge_events(events).await? {
            return Ok(true);
        }

        let ip = self.driver.discover_endpoint().await?;
        let url = match self.bridge.endpoint_resolved(&ip) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "cannot connect");
                let events = vec![AppEvent::Error { message: e.to_string() }];
                return self.process_bridge_events(events).await;
            },
        };

        tracing::info!(%url, "connecting");
        self.driver.connect(&url).await?;

        let events = self.bridge.connection_opened();
        self.process_bridge_events(events).await
    }

    /// Process one cycle of the event loop.
    ///
    /// 1. Polls for input and executes the app's actions
    /// 2. Drains inbound traffic through the bridge, up to a close
    /// 3. Ticks the app clock
    ///
    /// Returns `true` if the application should quit.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        let actions = self.driver.poll_event(&mut self.app).await?;
        if !actions.is_empty() && self.process_actions(actions).await? {
            return Ok(true);
        }

        while let Some(inbound) = self.driver.recv().await {
            let closed = matches!(inbound, Inbound::Closed { .. });
            let events = match inbound {
                Inbound::Text(text) => self.bridge.handle_text(&text),
                Inbound::Closed { clean } => self.bridge.connection_closed(clean),
            };
            self.send_outgoing().await?;
            if self.process_bridge_events(events).await? {
                return Ok(true);
            }
            if closed {
                break;
            }
        }

        let now = self.driver.now();
        let actions = self.app.handle(AppEvent::Tick { now });
        self.process_actions(actions).await
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),
                    AppAction::Navigate(view) => self.driver.navigate(view),
                    AppAction::ChangeUsername { new_username } => {
                        let event = match self.bridge.username_change_request(&new_username) {
                            Some(request) => AppEvent::UsernameChangeFinished(
                                self.driver.change_username(&request).await,
                            ),
                            None => AppEvent::Error {
                                message: "cannot change username before the session starts"
                                    .to_string(),
                            },
                        };
                        pending_actions.extend(self.app.handle(event));
                    },
                    AppAction::Upload { filename, bytes } => {
                        let request = UploadRequest::from_bytes(filename, &bytes);
                        let outcome = self.driver.upload(&request).await;
                        pending_actions.extend(self.app.handle(AppEvent::UploadFinished(outcome)));
                    },

                    // Protocol operations go through the bridge
                    AppAction::SendMessage { .. } | AppAction::DeleteMessages { .. } => {
                        let timestamp = self.driver.unix_millis();
                        let events = self.bridge.process_app_action(action, timestamp);
                        for event in events {
                            pending_actions.extend(self.app.handle(event));
                        }
                        self.send_outgoing().await?;
                    },
                }
            }
        }
        Ok(false)
    }

    /// Process events from Bridge back to App.
    async fn process_bridge_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Send all pending outgoing frames to the server.
    async fn send_outgoing(&mut self) -> Result<(), D::Error> {
        for text in self.bridge.take_outgoing() {
            self.driver.send_text(text).await?;
        }
        Ok(())
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Get a reference to the Bridge
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
