//! Router errors.

use axon_types::ErrorCode;
use thiserror::Error;

/// Pattern router error.
///
/// | Variant | Code | Recoverable |
/// |---------|------|-------------|
/// | `InvalidPattern` | `ROUTER_INVALID_PATTERN` | No |
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// The pattern has no segments after normalization.
    ///
    /// `"/"`, `""` and all-slash strings normalize to the empty root
    /// path, which cannot carry a listener.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

impl ErrorCode for RouterError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidPattern(_) => "ROUTER_INVALID_PATTERN",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
