//! Transcript checks run by the simulation scenarios.
//!
//! A scenario captures each client into a [`ClientSnapshot`] after every
//! harness operation and on every render. The snapshots of all clients form
//! one [`SystemSnapshot`], and an [`InvariantRegistry`] runs its checks over
//! that frozen picture so a live client cannot change underneath a pass.
//!
//! ```ignore
//! let snapshot = SystemSnapshot::single(ClientSnapshot::capture("alice", &app, &bridge));
//! InvariantRegistry::standard().assert_all(&snapshot, "after alice sends");
//! ```

mod checks;
mod snapshot;

pub use checks::{
    ConfirmedMessagesAgree, MirrorMatchesClient, NonBlankLabels, PendingOnlySent,
    SelectionIsOwnConfirmed, UniqueMessageIds,
};
pub use snapshot::{ClientSnapshot, SystemSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A rule over the captured transcripts of every client.
pub trait Invariant: Send + Sync {
    /// Short snake_case label carried by violations.
    fn name(&self) -> &'static str;

    /// Reports the first offending client, if any.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// The set of rules a scenario enforces.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// A registry with no rules.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Every transcript rule the scenarios rely on:
    /// - [`MirrorMatchesClient`]: the rendered transcript equals the
    ///   reconciled one
    /// - [`UniqueMessageIds`]: no durable id appears twice
    /// - [`NonBlankLabels`]: every entry has an author label
    /// - [`PendingOnlySent`]: only local sends are pending
    /// - [`SelectionIsOwnConfirmed`]: delete mode targets own confirmed
    ///   messages
    /// - [`ConfirmedMessagesAgree`]: clients agree on confirmed messages
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(MirrorMatchesClient);
        registry.add(UniqueMessageIds);
        registry.add(NonBlankLabels);
        registry.add(PendingOnlySent);
        registry.add(SelectionIsOwnConfirmed);
        registry.add(ConfirmedMessagesAgree);
        registry
    }

    /// Registers one more rule.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Runs every rule and collects one violation per broken rule.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        for rule in &self.invariants {
            if let Err(violation) = rule.check(state) {
                violations.push(violation);
            }
        }

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Like [`check_all`](Self::check_all), but panics with `context` and
    /// every violation listed.
    #[allow(clippy::panic, reason = "test assertion helper")]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let lines: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("transcript broken {context}:\n  {}", lines.join("\n  "));
        }
    }

    /// Rules registered so far.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// True before any rule is added.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
