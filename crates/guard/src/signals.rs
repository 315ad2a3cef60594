//! Side effects the guard asks of the host UI.

use std::sync::{Mutex, PoisonError};

pub trait Signals: Send + Sync {
    /// Open an external link outside the app.
    fn open_external(&self, href: &str);
    fn progress_start(&self);
    fn progress_finish(&self);
    fn set_title(&self, title: &str);
    /// Show a failure to the user.
    fn notify_error(&self, message: &str);
}

/// Headless host: every signal becomes a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSignals;

impl Signals for TracingSignals {
    fn open_external(&self, href: &str) {
        tracing::info!(href, "open external link");
    }

    fn progress_start(&self) {
        tracing::trace!("progress start");
    }

    fn progress_finish(&self) {
        tracing::trace!("progress finish");
    }

    fn set_title(&self, title: &str) {
        tracing::debug!(title, "document title");
    }

    fn notify_error(&self, message: &str) {
        tracing::error!(message, "user notification");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalEvent {
    OpenExternal(String),
    ProgressStart,
    ProgressFinish,
    Title(String),
    Error(String),
}

/// Keeps every signal in order, for tests and scripted shells.
#[derive(Debug, Default)]
pub struct RecordingSignals {
    events: Mutex<Vec<SignalEvent>>,
}

impl RecordingSignals {
    pub fn events(&self) -> Vec<SignalEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last_title(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            SignalEvent::Title(t) => Some(t),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SignalEvent::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SignalEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}

impl Signals for RecordingSignals {
    fn open_external(&self, href: &str) {
        self.push(SignalEvent::OpenExternal(href.to_string()));
    }

    fn progress_start(&self) {
        self.push(SignalEvent::ProgressStart);
    }

    fn progress_finish(&self) {
        self.push(SignalEvent::ProgressFinish);
    }

    fn set_title(&self, title: &str) {
        self.push(SignalEvent::Title(title.to_string()));
    }

    fn notify_error(&self, message: &str) {
        self.push(SignalEvent::Error(message.to_string()));
    }
}
