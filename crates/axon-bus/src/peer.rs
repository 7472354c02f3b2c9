//! Peer side of the bus.
//!
//! A peer makes calls into the host and listens for events. Every
//! outstanding call is one entry in the pending map keyed by its
//! [`CallId`]; the matching response, whenever it arrives and in
//! whatever order, resolves exactly that entry. A timeout removes the
//! entry first, so a response that shows up afterwards finds nothing to
//! resolve and is discarded with a diagnostic.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

use crate::envelope::{CallEnvelope, CallOutcome, Envelope, FailureKind};
use crate::error::BusError;
use crate::link::EnvelopeSink;
use axon_types::CallId;

/// Timeout applied by [`PeerBus::call`].
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
struct PeerState {
    pending: HashMap<CallId, oneshot::Sender<CallOutcome>>,
    event_handlers: HashMap<(String, String), Vec<EventHandler>>,
}

/// The peer endpoint: outbound calls with correlation, inbound events.
///
/// Calls suspend only the calling task; any number may be outstanding
/// at once. Wrap in an [`Arc`] to share with the receive loop.
pub struct PeerBus {
    sink: Arc<dyn EnvelopeSink>,
    state: Mutex<PeerState>,
    default_timeout: Duration,
}

impl PeerBus {
    /// Creates a peer over the given outbound channel, using
    /// [`DEFAULT_CALL_TIMEOUT`] for [`call`](Self::call).
    #[must_use]
    pub fn new(sink: Arc<dyn EnvelopeSink>) -> Self {
        Self::with_default_timeout(sink, DEFAULT_CALL_TIMEOUT)
    }

    /// Creates a peer with a custom default call timeout.
    #[must_use]
    pub fn with_default_timeout(sink: Arc<dyn EnvelopeSink>, timeout: Duration) -> Self {
        Self {
            sink,
            state: Mutex::new(PeerState::default()),
            default_timeout: timeout,
        }
    }

    /// Calls `(namespace, method)` on the host with the default timeout.
    ///
    /// # Errors
    ///
    /// See [`call_with_timeout`](Self::call_with_timeout).
    pub async fn call(
        &self,
        namespace: impl Into<String>,
        method: impl Into<String>,
        payload: Value,
    ) -> Result<Value, BusError> {
        self.call_with_timeout(namespace, method, payload, self.default_timeout)
            .await
    }

    /// Calls `(namespace, method)` on the host, waiting up to `timeout`
    /// for the response.
    ///
    /// # Errors
    ///
    /// - [`BusError::NoSuchMethod`] if the host has no handler registered.
    /// - [`BusError::Handler`] if the handler ran and failed.
    /// - [`BusError::Timeout`] if no response arrived in time. The call's
    ///   pending entry is removed, so a later response has no effect.
    /// - [`BusError::LinkClosed`] if the channel went away.
    pub async fn call_with_timeout(
        &self,
        namespace: impl Into<String>,
        method: impl Into<String>,
        payload: Value,
        timeout: Duration,
    ) -> Result<Value, BusError> {
        let namespace = namespace.into();
        let method = method.into();
        let call_id = CallId::new();

        let (tx, rx) = oneshot::channel();
        self.state.lock().pending.insert(call_id, tx);

        let envelope = Envelope::Call(CallEnvelope {
            namespace: namespace.clone(),
            method: method.clone(),
            call_id,
            payload,
        });
        if let Err(e) = self.sink.send(envelope) {
            self.state.lock().pending.remove(&call_id);
            return Err(e);
        }

        let outcome = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            // Receive loop dropped the sender without resolving the call.
            Ok(Err(_)) => {
                self.state.lock().pending.remove(&call_id);
                return Err(BusError::LinkClosed);
            }
            Err(_) => {
                self.state.lock().pending.remove(&call_id);
                return Err(BusError::Timeout(call_id));
            }
        };

        match outcome {
            CallOutcome::Success { value } => Ok(value),
            CallOutcome::Failure { kind, message } => match kind {
                FailureKind::NoSuchMethod => Err(BusError::NoSuchMethod { namespace, method }),
                FailureKind::HandlerError => Err(BusError::Handler(message)),
            },
        }
    }

    /// Adds a listener for `(namespace, event)` arriving from the host.
    pub fn on_event<F>(&self, namespace: impl Into<String>, event: impl Into<String>, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.state
            .lock()
            .event_handlers
            .entry((namespace.into(), event.into()))
            .or_default()
            .push(Arc::new(handler));
    }

    /// Feeds one inbound envelope into the peer.
    ///
    /// The embedder's receive loop calls this in arrival order. A
    /// response for an unknown call id (late after timeout, or a
    /// duplicate) is discarded with a diagnostic; a call envelope
    /// should never reach a peer and is discarded likewise.
    pub fn receive(&self, envelope: Envelope) {
        match envelope {
            Envelope::Response(resp) => {
                let sender = self.state.lock().pending.remove(&resp.call_id);
                match sender {
                    Some(tx) => {
                        // Caller gave up between removal and here; nothing to do.
                        let _ = tx.send(resp.outcome);
                    }
                    None => {
                        warn!(call_id = %resp.call_id,
                            "discarding response for unknown call (late or duplicate)");
                    }
                }
            }
            Envelope::Event(event) => {
                let handlers: Vec<EventHandler> = {
                    let state = self.state.lock();
                    state
                        .event_handlers
                        .get(&(event.namespace.clone(), event.event.clone()))
                        .map(|hs| hs.iter().map(Arc::clone).collect())
                        .unwrap_or_default()
                };
                for handler in handlers {
                    handler(&event.payload);
                }
            }
            Envelope::Call(call) => {
                warn!(namespace = %call.namespace, method = %call.method,
                    "peer received a call envelope, discarding");
            }
        }
    }

    /// Number of calls currently awaiting a response.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.state.lock().pending.len()
    }
}
