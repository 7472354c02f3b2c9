//! End-to-end wiring: a component scope on the peer side, a host/peer
//! bus pair over in-memory channels, and the event monitor fed from the
//! bus's event stream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use axon_bus::{memory_link, HostBus, PeerBus, PeerId, PeerSelector};
use axon_runtime::components::EventMonitor;
use axon_runtime::{Component, ComponentDescriptor, ComponentScope, MemorySettings, SettingsStore};

/// Connects one host and one peer over two in-memory channels and
/// spawns the receive loop for each direction.
fn wire(host: &Arc<HostBus>) -> Arc<PeerBus> {
    let peer_id = PeerId::new();
    let (to_peer, mut from_host) = memory_link();
    let (to_host, mut from_peer) = memory_link();

    host.attach_peer(peer_id, Arc::new(to_peer));
    let peer = Arc::new(PeerBus::new(Arc::new(to_host)));

    {
        let host = Arc::clone(host);
        tokio::spawn(async move {
            while let Some(envelope) = from_peer.recv().await {
                host.receive(peer_id, envelope);
            }
        });
    }
    {
        let peer = Arc::clone(&peer);
        tokio::spawn(async move {
            while let Some(envelope) = from_host.recv().await {
                peer.receive(envelope);
            }
        });
    }
    peer
}

#[tokio::test]
async fn scope_bus_and_monitor_work_together() {
    // Peer-side scope owning the monitor, rules persisted in memory.
    let settings = Arc::new(MemorySettings::new());
    let mut scope = ComponentScope::new();
    {
        let settings = Arc::clone(&settings);
        scope
            .register(
                ComponentDescriptor::new("event-monitor", move |_| {
                    Ok(Arc::new(EventMonitor::new(
                        settings as Arc<dyn SettingsStore>,
                    )) as Arc<dyn Component>)
                })
                .with_namespace("event-monitor"),
            )
            .expect("register should succeed");
    }
    scope.start().await.expect("start should succeed");

    let monitor = scope
        .resolve_as::<EventMonitor>("event-monitor")
        .expect("monitor should resolve");
    monitor
        .add_rule("/lol-gameflow/*")
        .expect("rule should add");

    // Host and peer over in-memory channels.
    let host = Arc::new(HostBus::new());
    let peer = wire(&host);

    host.on_call("league-client", "get-phase", |_| async {
        Ok(json!("ChampSelect"))
    });

    // Request/response across the pair.
    let phase = peer
        .call("league-client", "get-phase", json!(null))
        .await
        .expect("call should succeed");
    assert_eq!(phase, json!("ChampSelect"));

    // Event feed: the peer forwards each event into the monitor.
    let matched = Arc::new(AtomicUsize::new(0));
    {
        let monitor = Arc::clone(&monitor);
        let matched = Arc::clone(&matched);
        peer.on_event("client-events", "lcu-event", move |payload| {
            let path = payload["uri"].as_str().unwrap_or_default();
            let hits = monitor.ingest(path, &payload["data"]);
            matched.fetch_add(hits, Ordering::SeqCst);
        });
    }

    let delivered = host.send_event(
        "client-events",
        "lcu-event",
        json!({"uri": "/lol-gameflow/v1/phase", "data": "InProgress"}),
        &PeerSelector::All,
    );
    assert_eq!(delivered, 1);
    let delivered = host.send_event(
        "client-events",
        "lcu-event",
        json!({"uri": "/lol-chat/v1/me", "data": null}),
        &PeerSelector::All,
    );
    assert_eq!(delivered, 1);

    // Let the receive loop drain both events.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(matched.load(Ordering::SeqCst), 1);

    // The rule made it to the settings store for the next run.
    assert_eq!(
        settings.get("event-monitor", "rules"),
        Some(json!([{"pattern": "/lol-gameflow/*", "enabled": true}]))
    );

    scope.stop().await.expect("stop should succeed");
    assert!(!scope.is_running());
}

#[tokio::test]
async fn monitor_restores_rules_in_a_fresh_scope() {
    let settings = Arc::new(MemorySettings::new());

    // First run: add a rule, then tear the scope down.
    {
        let mut scope = ComponentScope::new();
        let s = Arc::clone(&settings);
        scope
            .register(ComponentDescriptor::new("event-monitor", move |_| {
                Ok(Arc::new(EventMonitor::new(s as Arc<dyn SettingsStore>))
                    as Arc<dyn Component>)
            }))
            .expect("register should succeed");
        scope.start().await.expect("start should succeed");
        scope
            .resolve_as::<EventMonitor>("event-monitor")
            .expect("monitor should resolve")
            .add_rule("/lol-champ-select/*")
            .expect("rule should add");
        scope.stop().await.expect("stop should succeed");
    }

    // Second run: the rule is live again without re-adding it.
    let mut scope = ComponentScope::new();
    let s = Arc::clone(&settings);
    scope
        .register(ComponentDescriptor::new("event-monitor", move |_| {
            Ok(Arc::new(EventMonitor::new(s as Arc<dyn SettingsStore>))
                as Arc<dyn Component>)
        }))
        .expect("register should succeed");
    scope.start().await.expect("start should succeed");

    let monitor = scope
        .resolve_as::<EventMonitor>("event-monitor")
        .expect("monitor should resolve");
    assert_eq!(
        monitor.ingest("/lol-champ-select/v1/session", &json!({})),
        1
    );
}
