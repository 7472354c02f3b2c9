//! Component scope: registration, ordered startup, ordered teardown.
//!
//! One scope owns one set of component singletons. Its life is three
//! phases:
//!
//! ```text
//! Registering ──start()──▶ Running ──stop()──▶ Stopped
//!      │                      │
//!      │ register()           │ resolve() / resolve_as()
//! ```
//!
//! `start()` plans the dependency graph up front (unknown deps and
//! cycles fail before any factory runs), then walks the plan stage by
//! stage: a stage's factories run sequentially, its `init` hooks run
//! concurrently, and the next stage begins only after every hook in the
//! current one has completed. A failed `init` rolls back by disposing
//! everything initialized so far in reverse order, so a scope is either
//! fully running or not running at all.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::component::Component;
use crate::descriptor::{ComponentDescriptor, DepView};
use crate::error::RuntimeError;
use crate::graph::{self, GraphEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Registering,
    Running,
    Stopped,
}

/// Owner of a set of component singletons.
///
/// Not shared: registration and lifecycle transitions take `&mut self`,
/// which is also what makes re-entrant mutation from component code
/// impossible. Hand out resolved `Arc`s instead of the scope itself.
pub struct ComponentScope {
    phase: Phase,
    descriptors: Vec<ComponentDescriptor>,
    /// namespace -> owning component id, filled at registration.
    namespaces: HashMap<String, String>,
    live: HashMap<String, Arc<dyn Component>>,
    /// Ids in the order their `init` completed; teardown reverses this.
    init_order: Vec<String>,
}

impl ComponentScope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Registering,
            descriptors: Vec::new(),
            namespaces: HashMap::new(),
            live: HashMap::new(),
            init_order: Vec::new(),
        }
    }

    /// Registers a component descriptor.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::Lifecycle`] once `start()` has been called.
    /// - [`RuntimeError::DuplicateComponent`] for a reused id.
    /// - [`RuntimeError::DuplicateNamespace`] if another descriptor in
    ///   this scope already claimed one of the namespaces.
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> Result<(), RuntimeError> {
        if self.phase != Phase::Registering {
            return Err(RuntimeError::Lifecycle(format!(
                "cannot register {} after start",
                descriptor.id
            )));
        }
        if self.descriptors.iter().any(|d| d.id == descriptor.id) {
            return Err(RuntimeError::DuplicateComponent(descriptor.id));
        }
        for namespace in &descriptor.namespaces {
            if let Some(owner) = self.namespaces.get(namespace) {
                return Err(RuntimeError::DuplicateNamespace {
                    namespace: namespace.clone(),
                    owner: owner.clone(),
                });
            }
        }
        for namespace in &descriptor.namespaces {
            self.namespaces
                .insert(namespace.clone(), descriptor.id.clone());
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Constructs and initializes every registered component in
    /// dependency order.
    ///
    /// # Errors
    ///
    /// Graph errors ([`RuntimeError::UnknownComponent`],
    /// [`RuntimeError::CyclicDependency`]) are returned before any
    /// factory runs and leave the scope in its registering phase.
    /// A factory error or [`RuntimeError::InitFailed`] rolls back the
    /// initialized prefix and leaves the scope stopped.
    pub async fn start(&mut self) -> Result<(), RuntimeError> {
        if self.phase != Phase::Registering {
            return Err(RuntimeError::Lifecycle("start called twice".into()));
        }

        let entries: Vec<GraphEntry> = self
            .descriptors
            .iter()
            .map(|d| GraphEntry {
                id: d.id.clone(),
                deps: d.deps.clone(),
            })
            .collect();
        let stages = graph::plan(&entries)?;

        // Factories are consumed from here on; a failure below cannot
        // return to the registering phase.
        let mut descriptors: HashMap<String, ComponentDescriptor> = std::mem::take(&mut self.descriptors)
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();

        for stage in &stages {
            // Construct sequentially: factories are synchronous and may
            // only see fully-initialized earlier stages.
            let mut constructed: Vec<(String, Arc<dyn Component>)> = Vec::new();
            for id in stage {
                let descriptor = descriptors
                    .remove(id)
                    .ok_or_else(|| RuntimeError::UnknownComponent(id.clone()))?;
                let mut deps: HashMap<String, Arc<dyn Component>> = HashMap::new();
                for dep in &descriptor.deps {
                    let component = self
                        .live
                        .get(dep)
                        .map(Arc::clone)
                        .ok_or_else(|| RuntimeError::UnknownComponent(dep.clone()))?;
                    deps.insert(dep.clone(), component);
                }
                let view = DepView::new(deps);
                let component = match (descriptor.factory)(&view) {
                    Ok(component) => component,
                    Err(e) => {
                        self.rollback().await;
                        return Err(e);
                    }
                };
                self.live.insert(id.clone(), Arc::clone(&component));
                constructed.push((id.clone(), component));
            }

            // Initialize the stage concurrently; all hooks must finish
            // before the next stage constructs.
            let mut set = JoinSet::new();
            for (id, component) in constructed {
                set.spawn(async move { (id, component.init().await) });
            }

            let mut failure: Option<RuntimeError> = None;
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((id, Ok(()))) => {
                        debug!(component = %id, "component initialized");
                        self.init_order.push(id);
                    }
                    Ok((id, Err(reason))) => {
                        failure.get_or_insert(RuntimeError::InitFailed { id, reason });
                    }
                    Err(join_err) => {
                        failure.get_or_insert(RuntimeError::InitFailed {
                            id: "<unknown>".into(),
                            reason: join_err.to_string(),
                        });
                    }
                }
            }
            if let Some(err) = failure {
                self.rollback().await;
                return Err(err);
            }
        }

        self.phase = Phase::Running;
        Ok(())
    }

    /// Disposes every component in reverse init order.
    ///
    /// Dispose failures are logged and skipped; `stop()` always tears
    /// the whole scope down.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Lifecycle`] if the scope is not running.
    pub async fn stop(&mut self) -> Result<(), RuntimeError> {
        if self.phase != Phase::Running {
            return Err(RuntimeError::Lifecycle("stop called while not running".into()));
        }
        self.rollback().await;
        Ok(())
    }

    /// Looks up a live component.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Lifecycle`] if the scope is not running,
    /// [`RuntimeError::UnknownComponent`] if the id was never registered.
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Component>, RuntimeError> {
        if self.phase != Phase::Running {
            return Err(RuntimeError::Lifecycle(
                "resolve called while not running".into(),
            ));
        }
        self.live
            .get(id)
            .map(Arc::clone)
            .ok_or_else(|| RuntimeError::UnknownComponent(id.to_string()))
    }

    /// Looks up a live component as its concrete type.
    ///
    /// # Errors
    ///
    /// As [`resolve`](Self::resolve), plus [`RuntimeError::TypeMismatch`]
    /// if the component is not a `T`.
    pub fn resolve_as<T: Component>(&self, id: &str) -> Result<Arc<T>, RuntimeError> {
        let component = self.resolve(id)?;
        component
            .as_any()
            .downcast::<T>()
            .map_err(|_| RuntimeError::TypeMismatch {
                id: id.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Whether `start()` completed and `stop()` has not run.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Disposes initialized components in reverse init order and clears
    /// the live set. Used by both `stop()` and failed-start rollback.
    async fn rollback(&mut self) {
        while let Some(id) = self.init_order.pop() {
            if let Some(component) = self.live.get(&id) {
                if let Err(reason) = component.dispose().await {
                    warn!(component = %id, %reason, "dispose failed, continuing teardown");
                }
            }
        }
        self.live.clear();
        self.phase = Phase::Stopped;
    }
}

impl Default for ComponentScope {
    fn default() -> Self {
        Self::new()
    }
}
