//! Client configuration.

/// How a display name change finds the transcript entries to relabel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenameMatching {
    /// Relabel entries whose author label equals the old display name.
    ///
    /// Two accounts sharing a display name are relabelled together. Whether
    /// that is acceptable is an open product question, so this remains the
    /// default.
    #[default]
    Label,
    /// Relabel entries authored by the renamed account id.
    Sender,
}

/// Client configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Rename propagation strategy.
    pub rename_matching: RenameMatching,
}
