//! Runtime errors.
//!
//! All runtime errors use the `RUNTIME_` prefix and implement
//! [`ErrorCode`](axon_types::ErrorCode).
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`CyclicDependency`](RuntimeError::CyclicDependency) | `RUNTIME_CYCLIC_DEPENDENCY` | No |
//! | [`UnknownComponent`](RuntimeError::UnknownComponent) | `RUNTIME_UNKNOWN_COMPONENT` | No |
//! | [`DuplicateComponent`](RuntimeError::DuplicateComponent) | `RUNTIME_DUPLICATE_COMPONENT` | No |
//! | [`DuplicateNamespace`](RuntimeError::DuplicateNamespace) | `RUNTIME_DUPLICATE_NAMESPACE` | No |
//! | [`Lifecycle`](RuntimeError::Lifecycle) | `RUNTIME_LIFECYCLE` | No |
//! | [`InitFailed`](RuntimeError::InitFailed) | `RUNTIME_INIT_FAILED` | Yes |
//! | [`DisposeFailed`](RuntimeError::DisposeFailed) | `RUNTIME_DISPOSE_FAILED` | Yes |
//! | [`TypeMismatch`](RuntimeError::TypeMismatch) | `RUNTIME_TYPE_MISMATCH` | No |

use axon_types::ErrorCode;
use thiserror::Error;

/// Component runtime error.
///
/// Graph errors (`CyclicDependency`, `UnknownComponent`, duplicates) are
/// registration-time programmer errors and abort `start()` before any
/// factory runs. Lifecycle hook failures are runtime conditions the
/// embedder may retry after fixing the environment.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// The dependency graph contains a cycle.
    ///
    /// Carries the ids along the cycle, first id repeated at the end.
    ///
    /// **Not recoverable** - the registration set itself is wrong.
    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Ids along the detected cycle.
        cycle: Vec<String>,
    },

    /// A declared dependency or lookup id matches no registered component.
    ///
    /// **Not recoverable** - programmer error.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// A component with this id is already registered in the scope.
    ///
    /// **Not recoverable** - ids are unique per scope.
    #[error("duplicate component id: {0}")]
    DuplicateComponent(String),

    /// Another component in the scope already declared this namespace.
    ///
    /// **Not recoverable** - namespaces are unique per scope.
    #[error("duplicate namespace: {namespace} (declared by {owner})")]
    DuplicateNamespace {
        /// The contested namespace.
        namespace: String,
        /// Component that already owns it.
        owner: String,
    },

    /// The operation is not valid in the scope's current phase.
    ///
    /// **Not recoverable** - fix the call ordering.
    #[error("invalid lifecycle phase: {0}")]
    Lifecycle(String),

    /// A component's `init` hook failed during `start()`.
    ///
    /// Already-initialized components have been disposed; the scope is
    /// back in its pre-start phase.
    ///
    /// **Recoverable** - the embedder may fix the environment and retry.
    #[error("component init failed: {id}: {reason}")]
    InitFailed {
        /// Component whose `init` failed.
        id: String,
        /// The hook's error message.
        reason: String,
    },

    /// A component's `dispose` hook failed during teardown.
    ///
    /// **Recoverable** - teardown continues past it.
    #[error("component dispose failed: {id}: {reason}")]
    DisposeFailed {
        /// Component whose `dispose` failed.
        id: String,
        /// The hook's error message.
        reason: String,
    },

    /// `resolve_as` found the component but it is not the requested type.
    ///
    /// **Not recoverable** - programmer error.
    #[error("component {id} is not a {expected}")]
    TypeMismatch {
        /// Component id that was resolved.
        id: String,
        /// Type name the caller asked for.
        expected: &'static str,
    },
}

impl ErrorCode for RuntimeError {
    fn code(&self) -> &'static str {
        match self {
            Self::CyclicDependency { .. } => "RUNTIME_CYCLIC_DEPENDENCY",
            Self::UnknownComponent(_) => "RUNTIME_UNKNOWN_COMPONENT",
            Self::DuplicateComponent(_) => "RUNTIME_DUPLICATE_COMPONENT",
            Self::DuplicateNamespace { .. } => "RUNTIME_DUPLICATE_NAMESPACE",
            Self::Lifecycle(_) => "RUNTIME_LIFECYCLE",
            Self::InitFailed { .. } => "RUNTIME_INIT_FAILED",
            Self::DisposeFailed { .. } => "RUNTIME_DISPOSE_FAILED",
            Self::TypeMismatch { .. } => "RUNTIME_TYPE_MISMATCH",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InitFailed { .. } | Self::DisposeFailed { .. }
        )
    }
}
