//! User directory.
//!
//! Maps account ids to display names. The directory is replaced wholesale by
//! the Initialization snapshot and patched afterwards by NewUser and
//! UsernameChange frames.
//!
//! # Entry lifecycle
//!
//! ```text
//!            NewUser / Initialization            UsernameChange
//! Unknown ─────────────────────────────> Active ───────────────> Renamed ─┐
//!                                          │                        ^     │
//!                                          │ null / empty name      └─────┘
//!                                          v
//!                                       Deleted
//! ```
//!
//! There is no explicit account deletion frame: a `null` name in the snapshot
//! (or an empty one in a patch) is the only signal. Unknown and deleted
//! accounts always render as [`DELETED_ACCOUNT`].

use std::collections::HashMap;

/// Label rendered for unknown or deleted accounts.
pub const DELETED_ACCOUNT: &str = "DeletedAccount";

/// Directory state of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEntry {
    /// Account with its original display name.
    Active {
        /// Display name.
        name: String,
    },
    /// Account that changed its display name at least once.
    Renamed {
        /// Current display name.
        name: String,
        /// Display name before the most recent change.
        previous: String,
    },
    /// Deleted account.
    Deleted,
}

impl DirectoryEntry {
    fn from_name(name: Option<String>) -> Self {
        match name {
            Some(name) if !name.is_empty() => Self::Active { name },
            _ => Self::Deleted,
        }
    }

    /// Current display name. `None` for deleted accounts.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Active { name } | Self::Renamed { name, .. } => Some(name),
            Self::Deleted => None,
        }
    }
}

/// Account id to display name mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDirectory {
    entries: HashMap<String, DirectoryEntry>,
}

impl UserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a snapshot. `None` names are deleted accounts.
    pub fn from_snapshot(snapshot: HashMap<String, Option<String>>) -> Self {
        let entries = snapshot
            .into_iter()
            .map(|(user_id, name)| (user_id, DirectoryEntry::from_name(name)))
            .collect();
        Self { entries }
    }

    /// Replace every entry with the snapshot.
    pub fn replace_from_snapshot(&mut self, snapshot: HashMap<String, Option<String>>) {
        *self = Self::from_snapshot(snapshot);
    }

    /// Insert or overwrite one account.
    pub fn insert_user(&mut self, user_id: impl Into<String>, name: impl Into<String>) {
        let entry = DirectoryEntry::from_name(Some(name.into()));
        self.entries.insert(user_id.into(), entry);
    }

    /// Apply a display name change.
    ///
    /// Returns the display name in effect before the change, or `None` if the
    /// account was unknown or deleted.
    pub fn rename(&mut self, user_id: &str, new_name: impl Into<String>) -> Option<String> {
        let new_name = new_name.into();
        let previous = self.name_of(user_id).map(str::to_owned);

        let entry = match (&previous, new_name.is_empty()) {
            (_, true) => DirectoryEntry::Deleted,
            (Some(previous), false) => {
                DirectoryEntry::Renamed { name: new_name, previous: previous.clone() }
            },
            (None, false) => DirectoryEntry::Active { name: new_name },
        };
        self.entries.insert(user_id.to_owned(), entry);

        previous
    }

    /// Directory entry for an account. `None` if unknown.
    pub fn entry(&self, user_id: &str) -> Option<&DirectoryEntry> {
        self.entries.get(user_id)
    }

    /// Display name for an account. `None` if unknown or deleted.
    pub fn name_of(&self, user_id: &str) -> Option<&str> {
        self.entries.get(user_id).and_then(DirectoryEntry::name)
    }

    /// Display name to render for an account.
    ///
    /// Never blank: unknown and deleted accounts yield [`DELETED_ACCOUNT`].
    pub fn display_name(&self, user_id: &str) -> &str {
        self.name_of(user_id).unwrap_or(DELETED_ACCOUNT)
    }

    /// Number of known accounts, deleted ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, Option<&str>)]) -> HashMap<String, Option<String>> {
        entries.iter().map(|(id, name)| ((*id).to_string(), name.map(str::to_string))).collect()
    }

    #[test]
    fn unknown_and_deleted_render_placeholder() {
        let directory = UserDirectory::from_snapshot(snapshot(&[("u1", Some("alice")), ("u2", None)]));

        assert_eq!(directory.display_name("u1"), "alice");
        assert_eq!(directory.display_name("u2"), DELETED_ACCOUNT);
        assert_eq!(directory.display_name("nobody"), DELETED_ACCOUNT);
        assert_eq!(directory.entry("u2"), Some(&DirectoryEntry::Deleted));
    }

    #[test]
    fn empty_name_is_deleted() {
        let mut directory = UserDirectory::new();
        directory.insert_user("u1", "");

        assert_eq!(directory.display_name("u1"), DELETED_ACCOUNT);
    }

    #[test]
    fn snapshot_replaces_rather_than_merges() {
        let mut directory = UserDirectory::from_snapshot(snapshot(&[("u1", Some("alice"))]));
        directory.insert_user("u9", "zed");

        directory.replace_from_snapshot(snapshot(&[("u2", Some("bob"))]));

        assert_eq!(directory.len(), 1);
        assert_eq!(directory.name_of("u9"), None);
        assert_eq!(directory.name_of("u2"), Some("bob"));
    }

    #[test]
    fn rename_tracks_previous_name() {
        let mut directory = UserDirectory::new();
        directory.insert_user("u1", "A");

        assert_eq!(directory.rename("u1", "B"), Some("A".to_string()));
        assert_eq!(
            directory.entry("u1"),
            Some(&DirectoryEntry::Renamed { name: "B".into(), previous: "A".into() })
        );

        assert_eq!(directory.rename("u1", "C"), Some("B".to_string()));
        assert_eq!(directory.display_name("u1"), "C");
    }

    #[test]
    fn rename_of_unknown_account_activates_it() {
        let mut directory = UserDirectory::new();

        assert_eq!(directory.rename("u7", "late"), None);
        assert_eq!(directory.entry("u7"), Some(&DirectoryEntry::Active { name: "late".into() }));
    }

    #[test]
    fn rename_to_empty_deletes() {
        let mut directory = UserDirectory::new();
        directory.insert_user("u1", "A");

        directory.rename("u1", "");
        assert_eq!(directory.entry("u1"), Some(&DirectoryEntry::Deleted));
    }
}
