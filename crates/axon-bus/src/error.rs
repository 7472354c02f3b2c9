//! Bus errors.
//!
//! All bus errors use the `BUS_` prefix and implement
//! [`ErrorCode`](axon_types::ErrorCode).
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`NoSuchMethod`](BusError::NoSuchMethod) | `BUS_NO_SUCH_METHOD` | Yes |
//! | [`Handler`](BusError::Handler) | `BUS_HANDLER_FAILED` | Yes |
//! | [`Timeout`](BusError::Timeout) | `BUS_TIMEOUT` | Yes |
//! | [`LinkClosed`](BusError::LinkClosed) | `BUS_LINK_CLOSED` | No |
//! | [`PeerNotFound`](BusError::PeerNotFound) | `BUS_PEER_NOT_FOUND` | No |

use axon_types::{CallId, ErrorCode, PeerId};
use thiserror::Error;

/// Messaging bus error.
///
/// Per-call errors resolve only the one pending call as a failure; they
/// never abort the bus or the process. Retry policy, if any, belongs to
/// the caller.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// No handler is registered for the called `(namespace, method)`.
    ///
    /// **Recoverable** - the caller decides its fallback; the target
    /// handler may be registered later (hot reload).
    #[error("no such method: {namespace}.{method}")]
    NoSuchMethod {
        /// Namespace the caller addressed.
        namespace: String,
        /// Method the caller addressed.
        method: String,
    },

    /// The remote handler ran and failed.
    ///
    /// Carries the handler's original error message.
    ///
    /// **Recoverable** - retry may succeed.
    #[error("handler failed: {0}")]
    Handler(String),

    /// No response arrived within the caller's timeout.
    ///
    /// The pending correlation entry has been removed; a response
    /// arriving later is discarded.
    ///
    /// **Recoverable** - caller-defined retry/backoff.
    #[error("call timed out: {0}")]
    Timeout(CallId),

    /// The underlying envelope channel is closed.
    ///
    /// **Not recoverable** - the peer is gone; re-attach first.
    #[error("message link closed")]
    LinkClosed,

    /// The addressed peer is not attached to this bus.
    ///
    /// **Not recoverable** - programmer error or stale peer id.
    #[error("peer not attached: {0}")]
    PeerNotFound(PeerId),
}

impl ErrorCode for BusError {
    fn code(&self) -> &'static str {
        match self {
            Self::NoSuchMethod { .. } => "BUS_NO_SUCH_METHOD",
            Self::Handler(_) => "BUS_HANDLER_FAILED",
            Self::Timeout(_) => "BUS_TIMEOUT",
            Self::LinkClosed => "BUS_LINK_CLOSED",
            Self::PeerNotFound(_) => "BUS_PEER_NOT_FOUND",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::NoSuchMethod { .. } => true,
            Self::Handler(_) => true,
            Self::Timeout(_) => true,
            Self::LinkClosed => false,
            Self::PeerNotFound(_) => false,
        }
    }
}
