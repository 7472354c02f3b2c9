//! Event monitor: rule-driven inspection of the external event feed.
//!
//! Owns a [`PatternRouter`] whose listeners log the events they match.
//! Rules are plain path patterns added and removed at runtime; the rule
//! list (pattern plus enabled flag) is persisted to the settings store
//! and restored on `init`, so a monitor comes back up watching what it
//! watched before.
//!
//! Wiring: the owning scope subscribes the monitor to the event-feed
//! namespace on its bus and forwards each `(path, payload)` pair into
//! [`ingest`](EventMonitor::ingest).

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{info, warn};

use axon_router::{normalize, PatternRouter, RouterError};

use crate::component::Component;
use crate::settings::SettingsStore;

/// Settings namespace the monitor persists under.
pub const SETTINGS_NAMESPACE: &str = "event-monitor";
const RULES_KEY: &str = "rules";

struct MonitorState {
    router: PatternRouter,
    /// Source of truth for persistence, in registration order.
    rules: Vec<Rule>,
}

struct Rule {
    pattern: String,
    enabled: bool,
}

/// Watches the external event feed through user-managed pattern rules.
pub struct EventMonitor {
    state: Mutex<MonitorState>,
    settings: Arc<dyn SettingsStore>,
}

impl EventMonitor {
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            state: Mutex::new(MonitorState {
                router: PatternRouter::new(),
                rules: Vec::new(),
            }),
            settings,
        }
    }

    /// Adds a rule and persists the rule list.
    ///
    /// Returns `Ok(false)` if the normalized pattern is already a rule.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidPattern`] for a pattern with no segments.
    pub fn add_rule(&self, pattern: &str) -> Result<bool, RouterError> {
        let normalized = normalize(pattern);
        let mut state = self.state.lock();

        let rule_pattern = normalized.clone();
        let added = state.router.register(&normalized, move |path, _| {
            info!(rule = %rule_pattern, %path, "event matched rule");
        })?;
        if added {
            state.rules.push(Rule {
                pattern: normalized,
                enabled: true,
            });
            self.persist(&state);
        }
        Ok(added)
    }

    /// Removes a rule and persists the rule list.
    ///
    /// Returns `false` if no such rule exists.
    pub fn remove_rule(&self, pattern: &str) -> bool {
        let normalized = normalize(pattern);
        let mut state = self.state.lock();
        if !state.router.unregister(&normalized) {
            return false;
        }
        state.rules.retain(|r| r.pattern != normalized);
        self.persist(&state);
        true
    }

    /// Toggles a rule without losing its registration-order position,
    /// and persists the new state.
    ///
    /// Returns `false` if no such rule exists.
    pub fn set_rule_enabled(&self, pattern: &str, enabled: bool) -> bool {
        let normalized = normalize(pattern);
        let mut state = self.state.lock();
        if !state.router.set_enabled(&normalized, enabled) {
            return false;
        }
        if let Some(rule) = state.rules.iter_mut().find(|r| r.pattern == normalized) {
            rule.enabled = enabled;
        }
        self.persist(&state);
        true
    }

    /// Feeds one event from the external feed into the rule router.
    ///
    /// Returns the number of rules that matched.
    pub fn ingest(&self, path: &str, payload: &Value) -> usize {
        self.state.lock().router.dispatch(path, payload)
    }

    /// Current rules as `(pattern, enabled)` pairs, in add order.
    #[must_use]
    pub fn rules(&self) -> Vec<(String, bool)> {
        self.state
            .lock()
            .rules
            .iter()
            .map(|r| (r.pattern.clone(), r.enabled))
            .collect()
    }

    fn persist(&self, state: &MonitorState) {
        let rules: Vec<Value> = state
            .rules
            .iter()
            .map(|r| json!({"pattern": r.pattern, "enabled": r.enabled}))
            .collect();
        self.settings.set(SETTINGS_NAMESPACE, RULES_KEY, json!(rules));
    }

    /// Re-registers rules saved by a previous run. Malformed entries are
    /// logged and skipped.
    fn restore_saved_rules(&self) {
        let saved = self
            .settings
            .get_or(SETTINGS_NAMESPACE, RULES_KEY, json!([]));
        let Some(entries) = saved.as_array() else {
            warn!("saved rules are not an array, starting empty");
            return;
        };

        let mut state = self.state.lock();
        for entry in entries {
            let Some(pattern) = entry.get("pattern").and_then(Value::as_str) else {
                warn!(%entry, "skipping malformed saved rule");
                continue;
            };
            let enabled = entry
                .get("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(true);

            let rule_pattern = normalize(pattern);
            let logged = rule_pattern.clone();
            match state.router.register(&rule_pattern, move |path, _| {
                info!(rule = %logged, %path, "event matched rule");
            }) {
                Ok(true) => {
                    if !enabled {
                        state.router.set_enabled(&rule_pattern, false);
                    }
                    state.rules.push(Rule {
                        pattern: rule_pattern,
                        enabled,
                    });
                }
                Ok(false) => {}
                Err(e) => warn!(pattern = %rule_pattern, error = %e, "skipping invalid saved rule"),
            }
        }
    }
}

#[async_trait]
impl Component for EventMonitor {
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    async fn init(&self) -> Result<(), String> {
        self.restore_saved_rules();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    fn monitor() -> (Arc<MemorySettings>, EventMonitor) {
        let settings = Arc::new(MemorySettings::new());
        let monitor = EventMonitor::new(Arc::clone(&settings) as Arc<dyn SettingsStore>);
        (settings, monitor)
    }

    #[test]
    fn add_rule_matches_ingested_events() {
        let (_, monitor) = monitor();
        assert!(monitor.add_rule("/lol-gameflow/*").expect("rule should add"));

        assert_eq!(monitor.ingest("/lol-gameflow/v1/phase", &json!("Lobby")), 1);
        assert_eq!(monitor.ingest("/lol-chat/v1/me", &json!(null)), 0);
    }

    #[test]
    fn add_rule_is_idempotent_across_spellings() {
        let (_, monitor) = monitor();
        assert!(monitor.add_rule("a/b/").expect("rule should add"));
        assert!(!monitor.add_rule("/a/b").expect("re-add should not error"));
        assert_eq!(monitor.rules().len(), 1);
    }

    #[test]
    fn remove_rule_stops_matching_and_persists() {
        let (settings, monitor) = monitor();
        monitor.add_rule("/a/b").expect("rule should add");
        assert!(monitor.remove_rule("a/b/"));
        assert!(!monitor.remove_rule("/a/b"));

        assert_eq!(monitor.ingest("/a/b", &json!(null)), 0);
        assert_eq!(
            settings.get(SETTINGS_NAMESPACE, "rules"),
            Some(json!([]))
        );
    }

    #[test]
    fn disabled_rule_is_skipped_until_reenabled() {
        let (_, monitor) = monitor();
        monitor.add_rule("/a/*").expect("rule should add");

        assert!(monitor.set_rule_enabled("/a/*", false));
        assert_eq!(monitor.ingest("/a/b", &json!(null)), 0);

        assert!(monitor.set_rule_enabled("/a/*", true));
        assert_eq!(monitor.ingest("/a/b", &json!(null)), 1);

        assert!(!monitor.set_rule_enabled("/ghost", false));
    }

    #[tokio::test]
    async fn rules_survive_a_restart() {
        let settings = Arc::new(MemorySettings::new());

        {
            let monitor = EventMonitor::new(Arc::clone(&settings) as Arc<dyn SettingsStore>);
            monitor.add_rule("/a/b").expect("rule should add");
            monitor.add_rule("/c/*").expect("rule should add");
            monitor.set_rule_enabled("/c/*", false);
        }

        let restarted = EventMonitor::new(Arc::clone(&settings) as Arc<dyn SettingsStore>);
        restarted.init().await.expect("init should succeed");

        assert_eq!(
            restarted.rules(),
            vec![("/a/b".to_string(), true), ("/c/*".to_string(), false)]
        );
        assert_eq!(restarted.ingest("/a/b", &json!(null)), 1);
        // Disabled state restored as well.
        assert_eq!(restarted.ingest("/c/d", &json!(null)), 0);
    }

    #[tokio::test]
    async fn malformed_saved_entries_are_skipped() {
        let settings = Arc::new(MemorySettings::new());
        settings.set(
            SETTINGS_NAMESPACE,
            "rules",
            json!([{"pattern": "/ok"}, {"nope": true}, 42]),
        );

        let monitor = EventMonitor::new(Arc::clone(&settings) as Arc<dyn SettingsStore>);
        monitor.init().await.expect("init should succeed");

        assert_eq!(monitor.rules(), vec![("/ok".to_string(), true)]);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let (_, monitor) = monitor();
        assert!(monitor.add_rule("///").is_err());
        assert!(monitor.rules().is_empty());
    }
}
