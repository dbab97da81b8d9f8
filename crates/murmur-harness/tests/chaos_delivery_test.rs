//! Reordered delivery tests.
//!
//! The simulated server holds every broadcast and releases them in a seeded
//! random order, modelling a transport that does not preserve ordering.
//! With correlation tokens echoed back, reconciliation stays exact. Without
//! them, it degrades: every send is still confirmed exactly once, but ids
//! may land on the wrong local entry.

use std::collections::HashSet;

use murmur_client::ClientConfig;
use murmur_harness::{
    InvariantRegistry, MirrorMatchesClient, NonBlankLabels, PendingOnlySent, SimClient, SimServer,
    SimServerConfig, SystemSnapshot, UniqueMessageIds,
};
use proptest::prelude::*;

const SENDS: usize = 6;

fn setup(server_config: SimServerConfig) -> (SimServer, SimClient, SimClient) {
    let mut server = SimServer::new(server_config);
    server.add_user("u1", "alice");
    server.add_user("u2", "bob");

    let mut alice = SimClient::new("u1", ClientConfig::default());
    let mut bob = SimClient::new("u2", ClientConfig::default());
    assert!(alice.connect(&mut server));
    assert!(bob.connect(&mut server));
    alice.deliver_all(&mut server);
    bob.deliver_all(&mut server);

    (server, alice, bob)
}

fn burst(server: &mut SimServer, alice: &mut SimClient) {
    server.hold_deliveries();
    for i in 0..SENDS {
        alice.compose(server, &format!("msg{i}"));
    }
    server.release_held();
}

/// Invariants that hold for one client in isolation.
fn per_client_registry() -> InvariantRegistry {
    let mut registry = InvariantRegistry::new();
    registry.add(MirrorMatchesClient);
    registry.add(UniqueMessageIds);
    registry.add(NonBlankLabels);
    registry.add(PendingOnlySent);
    registry
}

proptest! {
    #[test]
    fn tokens_keep_reordered_echoes_exact(seed in any::<u64>()) {
        let (mut server, mut alice, mut bob) =
            setup(SimServerConfig { seed, ..Default::default() });

        burst(&mut server, &mut alice);
        alice.deliver_all(&mut server);
        bob.deliver_all(&mut server);

        for (i, entry) in alice.app().transcript().entries().iter().enumerate() {
            prop_assert_eq!(entry.message_id.clone(), Some(format!("m{}", i + 1)));
            prop_assert_eq!(&entry.content, &format!("msg{i}"));
        }

        let snapshot = SystemSnapshot::from_clients(vec![alice.snapshot(), bob.snapshot()]);
        InvariantRegistry::standard().assert_all(&snapshot, "after reordered burst");
    }

    #[test]
    fn missing_tokens_degrade_gracefully(seed in any::<u64>()) {
        let (mut server, mut alice, _bob) =
            setup(SimServerConfig { seed, echo_correlation: false, ..Default::default() });

        burst(&mut server, &mut alice);
        alice.deliver_all(&mut server);

        let entries = alice.app().transcript().entries();
        prop_assert_eq!(entries.len(), SENDS);
        prop_assert!(entries.iter().all(|e| !e.pending));
        let ids: HashSet<_> = entries.iter().filter_map(|e| e.message_id.clone()).collect();
        prop_assert_eq!(ids.len(), SENDS);

        let snapshot = SystemSnapshot::single(alice.snapshot());
        per_client_registry().assert_all(&snapshot, "after reordered burst");
    }
}

#[test]
fn other_clients_see_reordered_messages_correctly() {
    let (mut server, mut alice, mut bob) =
        setup(SimServerConfig { seed: 42, echo_correlation: false, ..Default::default() });

    burst(&mut server, &mut alice);
    bob.deliver_all(&mut server);

    let mut seen: Vec<_> = bob
        .app()
        .transcript()
        .entries()
        .iter()
        .map(|e| (e.message_id.clone().unwrap_or_default(), e.content.clone()))
        .collect();
    seen.sort();

    let mut expected: Vec<_> =
        (0..SENDS).map(|i| (format!("m{}", i + 1), format!("msg{i}"))).collect();
    expected.sort();
    assert_eq!(seen, expected);
}
