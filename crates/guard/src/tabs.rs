//! Open page tabs.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use navgate_auth::SessionListener;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub name: String,
    /// Full path, query included; identifies the tab.
    pub path: String,
    pub title: Option<String>,
}

#[derive(Debug, Default)]
struct TabState {
    tabs: Vec<Tab>,
    current: Option<String>,
}

#[derive(Debug, Default)]
pub struct TabStore {
    state: RwLock<TabState>,
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a tab unless one with the same path is already open.
    pub fn add_tab(&self, tab: Tab) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.tabs.iter().any(|t| t.path == tab.path) {
            state.tabs.push(tab);
        }
    }

    pub fn set_current_tab(&self, path: impl Into<String>) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).current = Some(path.into());
    }

    pub fn close_tab(&self, path: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.tabs.retain(|t| t.path != path);
        if state.current.as_deref() == Some(path) {
            state.current = state.tabs.last().map(|t| t.path.clone());
        }
    }

    pub fn clear_all_tabs(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.tabs.clear();
        state.current = None;
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).tabs.clone()
    }

    pub fn current_tab(&self) -> Option<String> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).current.clone()
    }
}

impl SessionListener for TabStore {
    fn session_cleared(&self) {
        self.clear_all_tabs();
    }
}
