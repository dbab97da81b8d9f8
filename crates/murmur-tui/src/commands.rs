//! Slash commands typed into the composer.
//!
//! A submitted line starting with `/` is a command rather than a message.
//! Commands drive the same [`murmur_app::App`] operations a graphical front
//! end would bind to buttons.

use std::path::PathBuf;

use thiserror::Error;

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/name <new>`: request a display name change.
    Name(String),
    /// `/delete`: toggle delete mode.
    Delete,
    /// `/select <id>`: toggle selection of a message in delete mode.
    Select(String),
    /// `/confirm`: delete the selected messages.
    Confirm,
    /// `/upload <path>`: upload a file.
    Upload(PathBuf),
    /// `/quit`: leave the application.
    Quit,
}

/// Command parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The command name is not known.
    #[error("Unknown command: /{0}")]
    Unknown(String),

    /// A required argument is missing.
    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl Command {
    /// Parse a submitted line.
    ///
    /// Returns `None` if the line is not a command.
    pub fn parse(line: &str) -> Option<Result<Self, CommandError>> {
        let rest = line.trim().strip_prefix('/')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match name {
            "name" if arg.is_empty() => Err(CommandError::Usage("/name <new name>")),
            "name" => Ok(Self::Name(arg.to_string())),
            "delete" => Ok(Self::Delete),
            "select" => match arg.split_whitespace().next() {
                Some(id) => Ok(Self::Select(id.to_string())),
                None => Err(CommandError::Usage("/select <message id>")),
            },
            "confirm" => Ok(Self::Confirm),
            "upload" if arg.is_empty() => Err(CommandError::Usage("/upload <path>")),
            "upload" => Ok(Self::Upload(PathBuf::from(arg))),
            "quit" | "q" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        };
        Some(command)
    }
}
