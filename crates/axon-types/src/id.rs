//! Identifier types for axon.
//!
//! All identifiers are UUID-based so they stay unique across the host
//! process and any number of attached peer processes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one attached peer (one UI surface / process).
///
/// The host side of the messaging bus keys its sink table by `PeerId`;
/// every inbound envelope is attributed to the peer whose receive loop
/// delivered it.
///
/// # Example
///
/// ```
/// use axon_types::PeerId;
///
/// let a = PeerId::new();
/// let b = PeerId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    /// Creates a new [`PeerId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer:{}", self.0)
    }
}

/// Correlation identifier pairing a call with its eventual response.
///
/// A `CallId` is generated by the caller, carried on the wire in both
/// directions, and must be unique among *currently outstanding* calls on
/// one channel. Uniqueness among live calls is what UUID v4 buys here;
/// the pending-call table enforces the rest.
///
/// # Example
///
/// ```
/// use axon_types::CallId;
///
/// let id = CallId::new();
/// println!("outstanding: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

#[allow(clippy::new_without_default)] // Default intentionally not implemented - see below
impl CallId {
    /// Creates a new [`CallId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

// NOTE: CallId intentionally does NOT implement Default.
// A defaulted id would never be tracked in any pending-call table and
// its response would be silently dropped. Ids are minted by the caller
// at send time, nowhere else.

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "call:{}", self.0)
    }
}
