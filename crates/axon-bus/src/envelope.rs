//! Wire envelopes.
//!
//! The channel between host and peer is supplied externally; the bus
//! only requires that these envelopes round-trip with their identity
//! fields (namespace, method/event name, correlation id) intact. All
//! envelopes derive serde so any framing layer can carry them.

use axon_types::CallId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything that travels over one host/peer channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// A request expecting exactly one response.
    Call(CallEnvelope),
    /// The response to a previously sent call.
    Response(ResponseEnvelope),
    /// A fire-and-forget notification.
    Event(EventEnvelope),
}

/// A namespaced method call.
///
/// The correlation id is generated by the caller and must be unique
/// among the caller's currently outstanding calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEnvelope {
    /// Logical service the method belongs to.
    pub namespace: String,
    /// Method name within the namespace.
    pub method: String,
    /// Correlation id pairing this call with its response.
    pub call_id: CallId,
    /// Opaque call argument.
    pub payload: Value,
}

/// The single response to a call.
///
/// Exactly one response is ever sent per call id. A second response for
/// the same id is a protocol violation; receivers discard it with a
/// diagnostic instead of propagating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Correlation id copied from the originating call.
    pub call_id: CallId,
    /// Success or typed failure.
    pub outcome: CallOutcome,
}

/// Outcome carried by a [`ResponseEnvelope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallOutcome {
    /// The handler completed and produced a value.
    Success {
        /// Handler return value.
        value: Value,
    },
    /// The call failed on the receiving side.
    Failure {
        /// What went wrong, coarsely.
        kind: FailureKind,
        /// Original message from the receiving side.
        message: String,
    },
}

/// Failure classification carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No handler is registered for `(namespace, method)`.
    NoSuchMethod,
    /// The handler ran and failed; the message carries its error.
    HandlerError,
}

/// A namespaced broadcast event. No correlation id, no response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Logical service the event belongs to.
    pub namespace: String,
    /// Event name within the namespace.
    pub event: String,
    /// Opaque event payload.
    pub payload: Value,
}
