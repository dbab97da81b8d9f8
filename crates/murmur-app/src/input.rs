//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples application logic from the front end so the composer can be
/// driven deterministically in simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter without Shift (submit).
    Enter,
    /// Enter with Shift (newline).
    ShiftEnter,
    /// Backspace key (delete last character).
    Backspace,
    /// Escape key (leave delete mode, otherwise quit).
    Esc,
}
