//! Pattern Router - hierarchical path-pattern event routing.
//!
//! The router fans a high-frequency stream of path-keyed events out to
//! dynamically registered listeners. Patterns are `/`-separated paths
//! whose segments are either literals or the `*` wildcard, indexed in a
//! segment tree so matching cost is proportional to the *path's* segment
//! count, not to the number of registered patterns.
//!
//! ```text
//! register("/lol-champ-select/*")          dispatch("/lol-champ-select/timer")
//! register("/lol-champ-select/session")                 │
//!            │                                          ▼
//!            ▼                               root ── "lol-champ-select"
//!      segment tree                                  ├── "session"  (listener)
//!                                                    └── "*"        (listener)  ◄ fires
//! ```
//!
//! # Multicast, not first-match
//!
//! A single path may match several overlapping patterns; **all** matching
//! enabled listeners fire, in registration order. This is deliberate:
//! the intended use is observing overlapping subsets of one event stream,
//! never exclusive request routing.
//!
//! # Synchronous dispatch
//!
//! [`PatternRouter::dispatch`] never suspends. A slow listener delays
//! delivery to the listeners after it; listeners must be fast or defer
//! work themselves.

mod error;
mod pattern;
mod router;

pub use error::RouterError;
pub use pattern::{normalize, WILDCARD};
pub use router::{ListenerFn, PatternRouter};
