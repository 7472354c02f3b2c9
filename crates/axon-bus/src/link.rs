//! The message-channel contract.
//!
//! The transport between host and peer is an external collaborator: the
//! bus only needs a way to fire envelopes into it. Inbound delivery is
//! the embedder's job - its receive loop feeds
//! [`HostBus::receive`](crate::HostBus::receive) /
//! [`PeerBus::receive`](crate::PeerBus::receive) in arrival order, which
//! is what preserves the channel's send-order guarantee end to end.

use crate::envelope::Envelope;
use crate::error::BusError;
use tokio::sync::mpsc;

/// Outbound half of an ordered, reliable envelope channel.
///
/// `send` must not block: delivery is fire-and-forget from the bus's
/// point of view. Implementations report a closed channel with
/// [`BusError::LinkClosed`]; the bus never retries.
pub trait EnvelopeSink: Send + Sync {
    /// Fires an envelope into the channel.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::LinkClosed`] if the channel can no longer
    /// accept envelopes.
    fn send(&self, envelope: Envelope) -> Result<(), BusError>;
}

impl EnvelopeSink for mpsc::UnboundedSender<Envelope> {
    fn send(&self, envelope: Envelope) -> Result<(), BusError> {
        mpsc::UnboundedSender::send(self, envelope).map_err(|_| BusError::LinkClosed)
    }
}

/// Creates an in-process envelope channel.
///
/// The sender half satisfies [`EnvelopeSink`]; the receiver half is
/// drained by the embedder's receive loop. Used by tests and same-process
/// embeddings; real deployments wrap their IPC transport instead.
#[must_use]
pub fn memory_link() -> (
    mpsc::UnboundedSender<Envelope>,
    mpsc::UnboundedReceiver<Envelope>,
) {
    mpsc::unbounded_channel()
}
