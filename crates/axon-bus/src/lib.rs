//! Messaging bus - namespaced calls and events across a process pair.
//!
//! The bus sits on top of an externally supplied, ordered, reliable
//! envelope channel and adds namespaced request/response with
//! correlation and timeouts, plus fire-and-forget broadcast events.
//!
//! ```text
//!            Host process                         Peer process
//! ┌───────────────────────────────┐    ┌──────────────────────────────┐
//! │            HostBus            │    │            PeerBus           │
//! │  on_call(ns, method, h)       │    │  call(ns, method, payload)   │
//! │  on_event(ns, event, h)       │    │  on_event(ns, event, h)      │
//! │  send_event(ns, event, ..)    │    │                              │
//! └──────────────┬────────────────┘    └──────────────┬───────────────┘
//!                │  EnvelopeSink / receive()           │
//!                ▼                                     ▼
//!        ═══════════════ external ordered channel ═══════════════
//! ```
//!
//! # Message types
//!
//! | Envelope | Direction | Response | Delivery |
//! |----------|-----------|----------|----------|
//! | [`CallEnvelope`] | peer → host | exactly one | correlated by [`CallId`] |
//! | [`ResponseEnvelope`] | host → peer | n/a | at most one per call id |
//! | [`EventEnvelope`] | either | none | at-most-once, multicast |
//!
//! # Call semantics
//!
//! The caller mints a fresh [`CallId`], sends a [`CallEnvelope`] and
//! suspends only its own task until the matching [`ResponseEnvelope`]
//! arrives or the timeout fires. On timeout the pending entry is removed,
//! so a late response has no observable effect on the caller. A call to
//! an unregistered `(namespace, method)` resolves immediately with
//! [`BusError::NoSuchMethod`]; a handler failure resolves with
//! [`BusError::Handler`] and never crashes the receiving process.
//!
//! Handlers complete asynchronously and concurrently, so responses may
//! arrive out of order relative to other calls' sends; the correlation
//! id is mandatory, never optional. Events are unordered relative to
//! calls but ordered relative to other events from the same sender.
//!
//! [`CallId`]: axon_types::CallId

mod envelope;
mod error;
mod host;
mod link;
mod peer;

pub use envelope::{CallEnvelope, CallOutcome, Envelope, EventEnvelope, FailureKind, ResponseEnvelope};
pub use error::BusError;
pub use host::{HostBus, PeerSelector};
pub use link::{memory_link, EnvelopeSink};
pub use peer::{PeerBus, DEFAULT_CALL_TIMEOUT};

// Re-export the wire-visible id types for convenience.
pub use axon_types::{CallId, PeerId};
