//! Deterministic simulation harness for Murmur client testing.
//!
//! An in-process [`SimServer`] stands in for the chat server. Clients talk
//! to it either through [`SimDriver`], which runs the real
//! [`murmur_app::Runtime`] on a virtual clock, or through [`SimClient`],
//! which delivers frames one at a time so tests control every interleaving.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and real clients, and
//! their observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the
//! transcript invariants.

#![forbid(unsafe_code)]

pub mod invariants;
pub mod model;
pub mod sim_client;
pub mod sim_driver;
pub mod sim_server;

pub use invariants::{
    ClientSnapshot, ConfirmedMessagesAgree, Invariant, InvariantRegistry, InvariantResult,
    MirrorMatchesClient, NonBlankLabels, PendingOnlySent, SelectionIsOwnConfirmed, SystemSnapshot,
    UniqueMessageIds, Violation,
};
pub use model::{ClientId, ModelMessage, ModelWorld, ObservableMessage, Operation};
pub use sim_client::SimClient;
pub use sim_driver::{DEFAULT_TICK, SIM_EPOCH_MILLIS, SimDriver, SimDriverError, SimInput};
pub use sim_server::{SharedSimServer, SimServer, SimServerConfig, create_shared_server};
