//! Client-side deadline for a single exchange.
//!
//! A [`TimeoutGuard`] is armed when an exchange starts and ends in exactly one
//! of two states: [`GuardState::Disarmed`] when the exchange finishes first, or
//! [`GuardState::Fired`] when the deadline passes first. Firing applies the
//! configured [`TimeoutAction`] to the exchange once; afterwards the guard is
//! inert. The deadline is independent of any deadline the transport enforces.

use crate::Exchange;
use std::time::Duration;
use tokio::time::Instant;

/// Deadline applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// What the guard does to an exchange that outlives its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutAction {
    /// Hard-terminate the exchange; it finishes as canceled.
    #[default]
    Abort,
    /// Ask the exchange to stop; data that already arrived may still be delivered.
    Close,
}

/// Lifecycle of a [`TimeoutGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Armed,
    Disarmed,
    Fired,
}

/// A one-shot watchdog bound to one exchange.
#[derive(Debug)]
pub struct TimeoutGuard {
    /// `None` when the duration reaches past what the clock can represent.
    deadline: Option<Instant>,
    action: TimeoutAction,
    state: GuardState,
}

impl TimeoutGuard {
    /// Arms a guard for `exchange`.
    ///
    /// An exchange that is already finished gets a disarmed guard.
    pub fn arm(exchange: &dyn Exchange, duration: Duration, action: TimeoutAction) -> Self {
        let state = if exchange.is_running() {
            GuardState::Armed
        } else {
            GuardState::Disarmed
        };

        Self {
            deadline: Instant::now().checked_add(duration),
            action,
            state,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn action(&self) -> TimeoutAction {
        self.action
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves when the deadline passes while the guard is armed.
    ///
    /// Never resolves for a guard that is not armed or has no deadline.
    pub async fn expired(&self) {
        match (self.state, self.deadline) {
            (GuardState::Armed, Some(deadline)) => tokio::time::sleep_until(deadline).await,
            _ => std::future::pending::<()>().await,
        }
    }

    /// Stops the guard because the exchange finished first.
    pub fn disarm(&mut self) {
        if self.state == GuardState::Armed {
            self.state = GuardState::Disarmed;
        }
    }

    /// Applies the configured action to `exchange`.
    ///
    /// Returns `true` if the action was applied. A guard that is not armed,
    /// or an exchange that already finished, makes this a no-op; the latter
    /// still disarms the guard.
    pub fn fire(&mut self, exchange: &mut dyn Exchange) -> bool {
        if self.state != GuardState::Armed {
            return false;
        }
        if !exchange.is_running() {
            self.state = GuardState::Disarmed;
            return false;
        }

        match self.action {
            TimeoutAction::Abort => exchange.abort(),
            TimeoutAction::Close => exchange.close(),
        }
        self.state = GuardState::Fired;
        true
    }
}
