//! Component descriptors and the injected dependency view.
//!
//! A descriptor is the registration-time record for one component: its
//! id, the ids it depends on, the bus namespaces it claims, and the
//! factory that builds it. Factories run during `start()`, in dependency
//! order, and receive a [`DepView`] exposing exactly the *declared*
//! dependencies - nothing else in the scope is reachable from a factory,
//! so the graph on paper is the graph at runtime.

use std::collections::HashMap;
use std::sync::Arc;

use crate::component::Component;
use crate::error::RuntimeError;

/// Factory building one component from its declared dependencies.
pub type ComponentFactory =
    Box<dyn FnOnce(&DepView) -> Result<Arc<dyn Component>, RuntimeError> + Send>;

/// Registration record for one component.
///
/// ```
/// # use std::any::Any;
/// # use std::sync::Arc;
/// # use axon_runtime::{Component, ComponentDescriptor};
/// # struct Settings;
/// # #[async_trait::async_trait]
/// # impl Component for Settings {
/// #     fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> { self }
/// # }
/// let descriptor = ComponentDescriptor::new("settings", |_| {
///     Ok(Arc::new(Settings) as Arc<dyn Component>)
/// })
/// .with_namespace("settings");
/// ```
pub struct ComponentDescriptor {
    pub(crate) id: String,
    pub(crate) deps: Vec<String>,
    pub(crate) namespaces: Vec<String>,
    pub(crate) factory: ComponentFactory,
}

impl ComponentDescriptor {
    /// Creates a descriptor with no dependencies and no namespaces.
    #[must_use]
    pub fn new<F>(id: impl Into<String>, factory: F) -> Self
    where
        F: FnOnce(&DepView) -> Result<Arc<dyn Component>, RuntimeError> + Send + 'static,
    {
        Self {
            id: id.into(),
            deps: Vec::new(),
            namespaces: Vec::new(),
            factory: Box::new(factory),
        }
    }

    /// Declares a dependency on another component id.
    ///
    /// The dependency is constructed and initialized before this
    /// component, and becomes visible in the factory's [`DepView`].
    #[must_use]
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.deps.push(id.into());
        self
    }

    /// Claims a bus namespace for this component.
    ///
    /// Namespaces are unique within a scope; a second claim is rejected
    /// at registration.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    /// Component id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// The dependencies a factory is allowed to see.
///
/// Holds only the components named in the descriptor's `depends_on`
/// declarations. Asking for anything else fails with
/// [`RuntimeError::UnknownComponent`] even if the component exists in
/// the scope: undeclared edges stay invisible.
pub struct DepView {
    deps: HashMap<String, Arc<dyn Component>>,
}

impl DepView {
    pub(crate) fn new(deps: HashMap<String, Arc<dyn Component>>) -> Self {
        Self { deps }
    }

    /// Looks up a declared dependency.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownComponent`] if `id` was not declared via
    /// `depends_on`.
    pub fn get(&self, id: &str) -> Result<Arc<dyn Component>, RuntimeError> {
        self.deps
            .get(id)
            .map(Arc::clone)
            .ok_or_else(|| RuntimeError::UnknownComponent(id.to_string()))
    }

    /// Looks up a declared dependency as its concrete type.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownComponent`] if undeclared,
    /// [`RuntimeError::TypeMismatch`] if the component is not a `T`.
    pub fn get_as<T: Component>(&self, id: &str) -> Result<Arc<T>, RuntimeError> {
        let component = self.get(id)?;
        component
            .as_any()
            .downcast::<T>()
            .map_err(|_| RuntimeError::TypeMismatch {
                id: id.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }
}
