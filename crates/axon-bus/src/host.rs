//! Host side of the bus.
//!
//! The host owns the method handlers and the peer roster. It never
//! initiates calls: peers call in, the host responds and broadcasts
//! events out. Handlers run on spawned tasks so a slow method never
//! stalls envelope intake, which is also why responses may leave in a
//! different order than their calls arrived.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::envelope::{CallOutcome, Envelope, EventEnvelope, FailureKind, ResponseEnvelope};
use crate::error::BusError;
use crate::link::EnvelopeSink;
use axon_types::PeerId;

/// Boxed async method handler. Takes the call payload, returns the
/// response value or an error message to relay to the caller.
type CallHandler =
    Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<Value, String>> + Send>> + Send + Sync>;

/// Event listener invoked on the receiving process.
type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Which attached peers an outbound event goes to.
#[derive(Debug, Clone)]
pub enum PeerSelector {
    /// Every currently attached peer.
    All,
    /// Only the listed peers. Unattached ids are skipped silently.
    Peers(Vec<PeerId>),
}

#[derive(Default)]
struct HostState {
    call_handlers: HashMap<(String, String), CallHandler>,
    event_handlers: HashMap<(String, String), Vec<EventHandler>>,
    peers: HashMap<PeerId, Arc<dyn EnvelopeSink>>,
}

/// The host endpoint: method handlers, event listeners and the peer
/// roster behind one lock.
///
/// All methods take `&self`; wrap in an [`Arc`] to share with the
/// receive loop. The lock is held only to look up or mutate the maps,
/// never across a handler invocation.
#[derive(Default)]
pub struct HostBus {
    inner: Mutex<HostState>,
}

impl HostBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a peer's outbound channel under its id.
    ///
    /// Responses to that peer's calls and events selected for it go
    /// through this sink. Re-attaching an id replaces the old sink,
    /// which is how a reconnecting peer swaps in its fresh channel.
    pub fn attach_peer(&self, peer: PeerId, sink: Arc<dyn EnvelopeSink>) {
        let mut inner = self.inner.lock();
        if inner.peers.insert(peer, sink).is_some() {
            debug!(%peer, "replaced sink for re-attached peer");
        }
    }

    /// Detaches a peer. Returns `false` if the id was not attached.
    ///
    /// In-flight handlers for that peer's calls keep running; their
    /// responses go to the (now dropped) old sink and vanish.
    pub fn detach_peer(&self, peer: PeerId) -> bool {
        self.inner.lock().peers.remove(&peer).is_some()
    }

    /// Registers the handler for `(namespace, method)`.
    ///
    /// At most one handler per method: registering over an existing one
    /// replaces it and logs a warning. Calls already dispatched to the
    /// old handler complete under it.
    pub fn on_call<F, Fut>(&self, namespace: impl Into<String>, method: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        let namespace = namespace.into();
        let method = method.into();
        let handler: CallHandler = Arc::new(move |payload| Box::pin(handler(payload)));

        let mut inner = self.inner.lock();
        if inner
            .call_handlers
            .insert((namespace.clone(), method.clone()), handler)
            .is_some()
        {
            warn!(%namespace, %method, "replaced existing call handler");
        }
    }

    /// Adds a listener for `(namespace, event)` arriving from peers.
    ///
    /// Unlike call handlers, any number of listeners may coexist; they
    /// run in registration order on the receive path.
    pub fn on_event<F>(&self, namespace: impl Into<String>, event: impl Into<String>, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner
            .lock()
            .event_handlers
            .entry((namespace.into(), event.into()))
            .or_default()
            .push(Arc::new(handler));
    }

    /// Broadcasts an event to the selected peers.
    ///
    /// Returns how many peers the event was actually handed to their
    /// channel. A closed channel counts as not delivered and is logged,
    /// not propagated: broadcast never fails the sender.
    pub fn send_event(
        &self,
        namespace: impl Into<String>,
        event: impl Into<String>,
        payload: Value,
        selector: &PeerSelector,
    ) -> usize {
        let envelope = EventEnvelope {
            namespace: namespace.into(),
            event: event.into(),
            payload,
        };

        let targets: Vec<(PeerId, Arc<dyn EnvelopeSink>)> = {
            let inner = self.inner.lock();
            match selector {
                PeerSelector::All => inner
                    .peers
                    .iter()
                    .map(|(id, sink)| (*id, Arc::clone(sink)))
                    .collect(),
                PeerSelector::Peers(ids) => ids
                    .iter()
                    .filter_map(|id| inner.peers.get(id).map(|sink| (*id, Arc::clone(sink))))
                    .collect(),
            }
        };

        let mut delivered = 0;
        for (peer, sink) in targets {
            match sink.send(Envelope::Event(envelope.clone())) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(%peer, error = %e, "event not delivered, peer channel closed"),
            }
        }
        delivered
    }

    /// Sends an event to exactly one peer.
    ///
    /// Unlike [`send_event`](Self::send_event), addressing a single peer
    /// surfaces delivery problems to the caller.
    ///
    /// # Errors
    ///
    /// - [`BusError::PeerNotFound`] if `peer` is not attached.
    /// - [`BusError::LinkClosed`] if its channel is closed.
    pub fn send_event_to(
        &self,
        peer: PeerId,
        namespace: impl Into<String>,
        event: impl Into<String>,
        payload: Value,
    ) -> Result<(), BusError> {
        let sink = self
            .inner
            .lock()
            .peers
            .get(&peer)
            .map(Arc::clone)
            .ok_or(BusError::PeerNotFound(peer))?;
        sink.send(Envelope::Event(EventEnvelope {
            namespace: namespace.into(),
            event: event.into(),
            payload,
        }))
    }

    /// Feeds one inbound envelope from `peer` into the host.
    ///
    /// The embedder's receive loop calls this in arrival order. Calls
    /// are dispatched to a spawned task; events run their listeners
    /// inline; responses should never reach the host and are discarded
    /// with a diagnostic.
    pub fn receive(&self, peer: PeerId, envelope: Envelope) {
        match envelope {
            Envelope::Call(call) => {
                let (handler, sink) = {
                    let inner = self.inner.lock();
                    (
                        inner
                            .call_handlers
                            .get(&(call.namespace.clone(), call.method.clone()))
                            .map(Arc::clone),
                        inner.peers.get(&peer).map(Arc::clone),
                    )
                };

                let Some(sink) = sink else {
                    warn!(%peer, namespace = %call.namespace, method = %call.method,
                        "dropping call from unattached peer");
                    return;
                };

                let Some(handler) = handler else {
                    let response = ResponseEnvelope {
                        call_id: call.call_id,
                        outcome: CallOutcome::Failure {
                            kind: FailureKind::NoSuchMethod,
                            message: format!("{}.{}", call.namespace, call.method),
                        },
                    };
                    if let Err(e) = sink.send(Envelope::Response(response)) {
                        warn!(%peer, error = %e, "failed to send no-such-method response");
                    }
                    return;
                };

                tokio::spawn(async move {
                    let outcome = match handler(call.payload).await {
                        Ok(value) => CallOutcome::Success { value },
                        Err(message) => CallOutcome::Failure {
                            kind: FailureKind::HandlerError,
                            message,
                        },
                    };
                    let response = ResponseEnvelope {
                        call_id: call.call_id,
                        outcome,
                    };
                    if let Err(e) = sink.send(Envelope::Response(response)) {
                        warn!(%peer, call_id = %call.call_id, error = %e,
                            "failed to send response, peer channel closed");
                    }
                });
            }
            Envelope::Event(event) => {
                let handlers: Vec<EventHandler> = {
                    let inner = self.inner.lock();
                    inner
                        .event_handlers
                        .get(&(event.namespace.clone(), event.event.clone()))
                        .map(|hs| hs.iter().map(Arc::clone).collect())
                        .unwrap_or_default()
                };
                for handler in handlers {
                    handler(&event.payload);
                }
            }
            Envelope::Response(resp) => {
                warn!(%peer, call_id = %resp.call_id,
                    "host received a response envelope, discarding");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::CallEnvelope;
    use crate::link::memory_link;
    use axon_types::CallId;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn call(namespace: &str, method: &str, payload: Value) -> (CallId, Envelope) {
        let id = CallId::new();
        (
            id,
            Envelope::Call(CallEnvelope {
                namespace: namespace.into(),
                method: method.into(),
                call_id: id,
                payload,
            }),
        )
    }

    #[tokio::test]
    async fn call_dispatches_to_handler_and_responds() {
        let host = HostBus::new();
        let (tx, mut rx) = memory_link();
        let peer = PeerId::new();
        host.attach_peer(peer, Arc::new(tx));

        host.on_call("math", "double", |payload: Value| async move {
            let n = payload.as_i64().ok_or_else(|| "not a number".to_string())?;
            Ok(json!(n * 2))
        });

        let (id, envelope) = call("math", "double", json!(21));
        host.receive(peer, envelope);

        match rx.recv().await.expect("response should arrive") {
            Envelope::Response(resp) => {
                assert_eq!(resp.call_id, id);
                match resp.outcome {
                    CallOutcome::Success { value } => assert_eq!(value, json!(42)),
                    CallOutcome::Failure { message, .. } => panic!("unexpected failure: {message}"),
                }
            }
            _ => panic!("expected response envelope"),
        }
    }

    #[tokio::test]
    async fn unknown_method_fails_immediately() {
        let host = HostBus::new();
        let (tx, mut rx) = memory_link();
        let peer = PeerId::new();
        host.attach_peer(peer, Arc::new(tx));

        let (id, envelope) = call("math", "missing", json!(null));
        host.receive(peer, envelope);

        match rx.recv().await.expect("response should arrive") {
            Envelope::Response(resp) => {
                assert_eq!(resp.call_id, id);
                match resp.outcome {
                    CallOutcome::Failure { kind, message } => {
                        assert_eq!(kind, FailureKind::NoSuchMethod);
                        assert_eq!(message, "math.missing");
                    }
                    CallOutcome::Success { .. } => panic!("expected failure"),
                }
            }
            _ => panic!("expected response envelope"),
        }
    }

    #[tokio::test]
    async fn handler_error_becomes_failure_response() {
        let host = HostBus::new();
        let (tx, mut rx) = memory_link();
        let peer = PeerId::new();
        host.attach_peer(peer, Arc::new(tx));

        host.on_call("math", "fail", |_| async { Err("boom".to_string()) });

        let (_, envelope) = call("math", "fail", json!(null));
        host.receive(peer, envelope);

        match rx.recv().await.expect("response should arrive") {
            Envelope::Response(resp) => match resp.outcome {
                CallOutcome::Failure { kind, message } => {
                    assert_eq!(kind, FailureKind::HandlerError);
                    assert_eq!(message, "boom");
                }
                CallOutcome::Success { .. } => panic!("expected failure"),
            },
            _ => panic!("expected response envelope"),
        }
    }

    #[tokio::test]
    async fn replacing_call_handler_last_wins() {
        let host = HostBus::new();
        let (tx, mut rx) = memory_link();
        let peer = PeerId::new();
        host.attach_peer(peer, Arc::new(tx));

        host.on_call("ns", "m", |_| async { Ok(json!("first")) });
        host.on_call("ns", "m", |_| async { Ok(json!("second")) });

        let (_, envelope) = call("ns", "m", json!(null));
        host.receive(peer, envelope);

        match rx.recv().await.expect("response should arrive") {
            Envelope::Response(resp) => match resp.outcome {
                CallOutcome::Success { value } => assert_eq!(value, json!("second")),
                CallOutcome::Failure { message, .. } => panic!("unexpected failure: {message}"),
            },
            _ => panic!("expected response envelope"),
        }
    }

    #[tokio::test]
    async fn send_event_counts_delivered_peers() {
        let host = HostBus::new();

        let (tx_a, mut rx_a) = memory_link();
        let (tx_b, rx_b) = memory_link();
        let (tx_c, mut rx_c) = memory_link();
        let a = PeerId::new();
        let b = PeerId::new();
        let c = PeerId::new();
        host.attach_peer(a, Arc::new(tx_a));
        host.attach_peer(b, Arc::new(tx_b));
        host.attach_peer(c, Arc::new(tx_c));

        // One closed channel: that peer counts as not delivered.
        drop(rx_b);

        let delivered = host.send_event("client-events", "phase", json!("InProgress"), &PeerSelector::All);
        assert_eq!(delivered, 2);

        for rx in [&mut rx_a, &mut rx_c] {
            match rx.recv().await.expect("event should arrive") {
                Envelope::Event(ev) => {
                    assert_eq!(ev.namespace, "client-events");
                    assert_eq!(ev.event, "phase");
                }
                _ => panic!("expected event envelope"),
            }
        }
    }

    #[tokio::test]
    async fn selector_targets_subset_and_skips_unattached() {
        let host = HostBus::new();
        let (tx_a, mut rx_a) = memory_link();
        let (tx_b, mut rx_b) = memory_link();
        let a = PeerId::new();
        let b = PeerId::new();
        host.attach_peer(a, Arc::new(tx_a));
        host.attach_peer(b, Arc::new(tx_b));

        let ghost = PeerId::new();
        let delivered = host.send_event(
            "ns",
            "ev",
            json!(1),
            &PeerSelector::Peers(vec![a, ghost]),
        );
        assert_eq!(delivered, 1);

        assert!(matches!(
            rx_a.recv().await,
            Some(Envelope::Event(_))
        ));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn events_from_peer_reach_all_listeners_in_order() {
        let host = HostBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let order = Arc::clone(&order);
            host.on_event("ns", "ev", move |_: &Value| {
                order.lock().push(tag);
            });
        }

        host.receive(
            PeerId::new(),
            Envelope::Event(EventEnvelope {
                namespace: "ns".into(),
                event: "ev".into(),
                payload: json!(null),
            }),
        );

        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn targeted_send_surfaces_delivery_errors() {
        let host = HostBus::new();
        let (tx, mut rx) = memory_link();
        let peer = PeerId::new();
        host.attach_peer(peer, Arc::new(tx));

        host.send_event_to(peer, "ns", "ev", json!(1))
            .expect("attached peer should receive");
        assert!(matches!(rx.recv().await, Some(Envelope::Event(_))));

        let ghost = PeerId::new();
        assert!(matches!(
            host.send_event_to(ghost, "ns", "ev", json!(1)),
            Err(BusError::PeerNotFound(id)) if id == ghost
        ));

        drop(rx);
        assert!(matches!(
            host.send_event_to(peer, "ns", "ev", json!(1)),
            Err(BusError::LinkClosed)
        ));
    }

    #[tokio::test]
    async fn detach_stops_future_events() {
        let host = HostBus::new();
        let (tx, mut rx) = memory_link();
        let peer = PeerId::new();
        host.attach_peer(peer, Arc::new(tx));

        assert!(host.detach_peer(peer));
        assert!(!host.detach_peer(peer));

        let delivered = host.send_event("ns", "ev", json!(null), &PeerSelector::All);
        assert_eq!(delivered, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn handlers_run_concurrently_without_blocking_intake() {
        let host = Arc::new(HostBus::new());
        let (tx, mut rx) = memory_link();
        let peer = PeerId::new();
        host.attach_peer(peer, Arc::new(tx));

        let started = Arc::new(AtomicUsize::new(0));
        {
            let started = Arc::clone(&started);
            host.on_call("ns", "slow", move |_| {
                let started = Arc::clone(&started);
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    Ok(json!("done"))
                }
            });
        }

        let (_, first) = call("ns", "slow", json!(null));
        let (_, second) = call("ns", "slow", json!(null));
        host.receive(peer, first);
        host.receive(peer, second);

        // Both handlers start before either response arrives.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(started.load(Ordering::SeqCst), 2);

        for _ in 0..2 {
            assert!(matches!(
                rx.recv().await,
                Some(Envelope::Response(_))
            ));
        }
    }
}
