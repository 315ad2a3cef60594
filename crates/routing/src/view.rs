//! Deferred view resolution.
//!
//! A route known to the graph is not the same as a route whose UI has been
//! loaded. Each node carries a [`LazyView`] that asks the [`ViewFactory`] for
//! its component the first time the route is navigated to, and memoizes it.

use std::sync::{Arc, OnceLock};

/// Handle to a resolved view/component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewHandle {
    component: Arc<str>,
}

impl ViewHandle {
    pub fn new(component: impl Into<Arc<str>>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

/// Resolves component keys into views. Called at most once per route node.
pub trait ViewFactory: Send + Sync {
    fn load(&self, component: &str) -> ViewHandle;
}

/// Factory whose views are just the component key.
#[derive(Debug, Default, Clone, Copy)]
pub struct NamedViews;

impl ViewFactory for NamedViews {
    fn load(&self, component: &str) -> ViewHandle {
        ViewHandle::new(component)
    }
}

#[derive(Debug, Default)]
pub struct LazyView {
    component: Option<String>,
    resolved: OnceLock<ViewHandle>,
}

impl LazyView {
    pub fn new(component: Option<String>) -> Self {
        Self {
            component,
            resolved: OnceLock::new(),
        }
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Resolve through `factory` on first use. Routes without a component
    /// (pure redirects, layout-less groups) have no view.
    pub fn get_or_load(&self, factory: &dyn ViewFactory) -> Option<ViewHandle> {
        let component = self.component.as_deref()?;
        Some(
            self.resolved
                .get_or_init(|| {
                    tracing::debug!(component, "resolving view");
                    factory.load(component)
                })
                .clone(),
        )
    }
}
