//! Declarative route records, prior to registration.

use serde::{Deserialize, Serialize};

/// Display and access metadata of a route.
///
/// Every field is optional so metadata can be merged along a matched chain:
/// a child's explicit value overrides its ancestors'.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    /// Title (or i18n key) shown in menus, tabs and the window title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Hidden from menus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
    /// Never opened as a tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub without_tab: Option<bool>,
    /// Menu key highlighted while this route is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_menu: Option<String>,
    /// External link; navigating here opens the link out-of-band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_admin: Option<bool>,
    /// Eligible for the UI keep-alive cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
}

impl RouteMeta {
    /// Overlay `child` on top of `self`.
    pub fn merge(&mut self, child: &RouteMeta) {
        fn over<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        over(&mut self.title, &child.title);
        over(&mut self.icon, &child.icon);
        over(&mut self.hide, &child.hide);
        over(&mut self.without_tab, &child.without_tab);
        over(&mut self.active_menu, &child.active_menu);
        over(&mut self.href, &child.href);
        over(&mut self.order, &child.order);
        over(&mut self.requires_auth, &child.requires_auth);
        over(&mut self.requires_admin, &child.requires_admin);
        over(&mut self.keep_alive, &child.keep_alive);
    }

    pub fn is_hidden(&self) -> bool {
        self.hide.unwrap_or(false)
    }

    pub fn is_without_tab(&self) -> bool {
        self.without_tab.unwrap_or(false)
    }

    pub fn is_keep_alive(&self) -> bool {
        self.keep_alive.unwrap_or(false)
    }

    pub fn is_admin_only(&self) -> bool {
        self.requires_admin.unwrap_or(false)
    }
}

/// One navigable page as delivered by the route source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    /// Absolute (`/a/b`) or relative to the parent (`b`).
    pub path: String,
    /// Stable, unique route name.
    pub name: String,
    /// Name of the parent route, when not implied by the path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Component key handed to the view factory on first navigation.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "componentPath")]
    pub component: Option<String>,
    #[serde(flatten)]
    pub meta: RouteMeta,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            parent: None,
            redirect: None,
            component: None,
            meta: RouteMeta::default(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// A descriptor with its resolved children; registered and removed as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTree {
    pub descriptor: RouteDescriptor,
    pub children: Vec<RouteTree>,
}

impl RouteTree {
    pub fn leaf(descriptor: RouteDescriptor) -> Self {
        Self {
            descriptor,
            children: Vec::new(),
        }
    }

    pub fn with_children(descriptor: RouteDescriptor, children: Vec<RouteTree>) -> Self {
        Self {
            descriptor,
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Depth-first walk over this tree (self first).
    pub fn walk(&self) -> Vec<&RouteTree> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// Full path of `path` under a parent whose full path is `parent`.
///
/// Absolute paths ignore the parent; relative ones are appended to it.
pub fn join_path(parent: Option<&str>, path: &str) -> String {
    if path.starts_with('/') {
        return normalize(path);
    }
    match parent {
        Some(parent) => {
            let base = parent.trim_end_matches('/');
            if path.is_empty() {
                normalize(base)
            } else {
                normalize(&format!("{base}/{path}"))
            }
        }
        None => normalize(&format!("/{path}")),
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
