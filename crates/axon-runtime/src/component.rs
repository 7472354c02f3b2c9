//! Component trait for scope-managed singletons.
//!
//! A component is one long-lived service instance constructed by its
//! descriptor's factory and driven through two lifecycle hooks:
//!
//! | Hook | When | Failure effect |
//! |------|------|----------------|
//! | `init` | during `start()`, after all dependencies initialized | aborts `start()`, initialized prefix disposed |
//! | `dispose` | during `stop()`, reverse init order | logged, teardown continues |
//!
//! Both hooks default to no-ops; a plain struct with state and methods
//! is already a valid component.
//!
//! # Typed resolution
//!
//! The scope stores components as `Arc<dyn Component>`. To get the
//! concrete type back out via `resolve_as::<T>`, every component routes
//! through [`as_any`](Component::as_any); the implementation is always
//! the same one line:
//!
//! ```
//! # use std::any::Any;
//! # use std::sync::Arc;
//! # use axon_runtime::Component;
//! # struct Clock;
//! #[async_trait::async_trait]
//! impl Component for Clock {
//!     fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
//!         self
//!     }
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

/// A scope-managed singleton with async lifecycle hooks.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Upcast for typed resolution. Always `self`.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Called once during `start()`, after every declared dependency has
    /// completed its own `init`.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the start: components initialized so
    /// far are disposed in reverse order and `start()` fails.
    async fn init(&self) -> Result<(), String> {
        Ok(())
    }

    /// Called once during `stop()`, in reverse init order.
    ///
    /// # Errors
    ///
    /// An error is logged by the scope; teardown continues with the
    /// remaining components.
    async fn dispose(&self) -> Result<(), String> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<component>")
    }
}
