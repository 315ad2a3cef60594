//! Background silent renewal of the session ahead of expiry.
//!
//! State machine: `Idle -> Armed -> Refreshing -> Idle` (re-armed on success),
//! or `Armed -> Idle` on disarm. At most one timer exists at a time; arming
//! always cancels the previous timer first.
//!
//! A failed refresh is logged and nothing else: the scheduler never tears the
//! session down. The next authenticated navigation or API call notices the
//! dead session through its own error path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use navgate_core::{Clock, NavConfig};

use crate::{AuthApi, RefreshError, SessionCell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// Timer armed; fires `delay` after arming.
    Armed { delay: Duration },
    /// Refresh call in flight.
    Refreshing,
}

/// Result of an [`RefreshScheduler::arm`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Auto refresh is switched off by configuration.
    Disabled,
    /// No session, or the session lacks an expiry or a refresh token.
    NotApplicable,
    /// Not running inside a tokio runtime.
    NoRuntime,
    /// The session is at or past its refresh point; refreshing right away.
    Immediate,
    Scheduled(Duration),
}

struct Timer {
    token: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    cell: Arc<SessionCell>,
    api: Arc<dyn AuthApi>,
    clock: Arc<dyn Clock>,
    enabled: bool,
    ahead_secs: i64,
    timer: Mutex<Option<Timer>>,
    state: Mutex<SchedulerState>,
    next_token: AtomicU64,
    refreshes: AtomicU64,
}

/// Silent token renewal timer.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<Inner>,
}

impl RefreshScheduler {
    pub fn new(
        config: &NavConfig,
        cell: Arc<SessionCell>,
        api: Arc<dyn AuthApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cell,
                api,
                clock,
                enabled: config.auto_refresh_token,
                ahead_secs: config.refresh_ahead_secs,
                timer: Mutex::new(None),
                state: Mutex::new(SchedulerState::Idle),
                next_token: AtomicU64::new(0),
                refreshes: AtomicU64::new(0),
            }),
        }
    }

    /// Arm the timer for the current session, replacing any armed timer.
    pub fn arm(&self) -> ArmOutcome {
        Inner::arm(&self.inner, None)
    }

    /// Cancel any armed timer. Idempotent.
    pub fn disarm(&self) {
        let previous = self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(timer) = previous {
            timer.handle.abort();
            tracing::debug!("refresh timer disarmed");
        }
        self.inner.set_state(SchedulerState::Idle);
    }

    pub fn state(&self) -> SchedulerState {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_armed(&self) -> bool {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Number of refresh calls issued so far.
    pub fn refresh_count(&self) -> u64 {
        self.inner.refreshes.load(Ordering::SeqCst)
    }

    /// Refresh now, outside the timer. Does not re-arm.
    pub async fn refresh_now(&self) -> Result<(), RefreshError> {
        self.inner.refresh().await
    }
}

impl Inner {
    fn set_state(&self, state: SchedulerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// `releasing` is the token of the timer task calling in to re-arm
    /// itself; that timer is detached instead of aborted.
    fn arm(inner: &Arc<Inner>, releasing: Option<u64>) -> ArmOutcome {
        let mut slot = inner.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            if Some(previous.token) != releasing {
                previous.handle.abort();
            }
        }

        if !inner.enabled {
            inner.set_state(SchedulerState::Idle);
            return ArmOutcome::Disabled;
        }

        let Some(session) = inner.cell.snapshot().filter(|s| s.is_active()) else {
            inner.set_state(SchedulerState::Idle);
            return ArmOutcome::NotApplicable;
        };
        let Some(expires_at) = session.expires_at else {
            inner.set_state(SchedulerState::Idle);
            return ArmOutcome::NotApplicable;
        };
        if session.refresh_token.is_empty() {
            inner.set_state(SchedulerState::Idle);
            return ArmOutcome::NotApplicable;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("cannot arm token refresh outside a tokio runtime");
                inner.set_state(SchedulerState::Idle);
                return ArmOutcome::NoRuntime;
            }
        };

        let delay_secs = expires_at - inner.clock.now_epoch_secs() - inner.ahead_secs;
        let token = inner.next_token.fetch_add(1, Ordering::SeqCst);
        let task_inner = inner.clone();

        let (outcome, handle) = if delay_secs <= 0 {
            tracing::info!(delay_secs, "token at refresh point; refreshing immediately");
            inner.set_state(SchedulerState::Refreshing);
            let handle = runtime.spawn(async move {
                Inner::fire(task_inner, token).await;
            });
            (ArmOutcome::Immediate, handle)
        } else {
            let delay = Duration::from_secs(delay_secs as u64);
            tracing::info!(delay_secs, "token refresh scheduled");
            inner.set_state(SchedulerState::Armed { delay });
            let handle = runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                task_inner.set_state(SchedulerState::Refreshing);
                Inner::fire(task_inner, token).await;
            });
            (ArmOutcome::Scheduled(delay), handle)
        };

        *slot = Some(Timer { token, handle });
        outcome
    }

    async fn fire(inner: Arc<Inner>, token: u64) {
        match inner.refresh().await {
            Ok(()) => {
                tracing::info!("token refreshed silently");
                Inner::arm(&inner, Some(token));
            }
            Err(RefreshError::SessionChanged) => {
                tracing::debug!("session changed during refresh; result dropped");
                inner.finish(token);
            }
            Err(e) => {
                tracing::warn!(error = %e, "silent token refresh failed");
                inner.finish(token);
            }
        }
    }

    /// Drop our own timer entry (if still ours) and go idle.
    fn finish(&self, token: u64) {
        let mut slot = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|t| t.token == token) {
            slot.take();
            self.set_state(SchedulerState::Idle);
        }
    }

    async fn refresh(&self) -> Result<(), RefreshError> {
        let generation = self.cell.generation();
        let session = self
            .cell
            .snapshot()
            .filter(|s| s.is_active())
            .ok_or(RefreshError::SessionChanged)?;
        if session.refresh_token.is_empty() {
            return Err(RefreshError::NoRefreshToken);
        }

        self.refreshes.fetch_add(1, Ordering::SeqCst);
        let grant = self.api.refresh(&session.refresh_token).await?;
        self.cell.apply_grant(generation, grant)?;
        Ok(())
    }
}
