//! Built-in components.

mod event_monitor;

pub use event_monitor::{EventMonitor, SETTINGS_NAMESPACE};
