//! Component runtime - explicit dependency injection with an async
//! lifecycle.
//!
//! A [`ComponentScope`] owns one set of long-lived singletons. Each is
//! registered as a [`ComponentDescriptor`]: an id, the ids it depends
//! on, the bus namespaces it claims, and a factory. `start()` turns the
//! declarations into a staged plan and brings everything up in
//! dependency order; `stop()` tears it down in exact reverse.
//!
//! ```text
//! register(a)  register(b: deps=[a])  register(c: deps=[a])
//!        │
//!     start()
//!        │      stage 0        stage 1
//!        └────▶ new a          new b ─ new c
//!               init a         init b ┬ init c      (concurrent)
//!                                     ▼
//!                                  Running
//! ```
//!
//! # Explicit injection
//!
//! Factories receive a [`DepView`] holding only their *declared*
//! dependencies. There is no ambient registry to reach into, so the
//! dependency graph the scope validates is the one the code actually
//! uses.
//!
//! # Failure containment
//!
//! | Failure | Effect |
//! |---------|--------|
//! | unknown dep / cycle | `start()` fails before any factory runs |
//! | factory or `init` error | initialized prefix disposed in reverse, `start()` fails |
//! | `dispose` error | logged, teardown continues |

mod component;
pub mod components;
mod descriptor;
mod error;
mod graph;
mod scope;
mod settings;

pub use component::Component;
pub use descriptor::{ComponentDescriptor, ComponentFactory, DepView};
pub use error::RuntimeError;
pub use scope::ComponentScope;
pub use settings::{MemorySettings, SettingsStore};
