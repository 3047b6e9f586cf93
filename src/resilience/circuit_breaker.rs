//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through and outcomes are recorded
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: a limited number of trial calls probe recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: after a failure, window holds >= sliding_window_size
//!                outcomes and failure rate >= threshold
//! Open → Half-Open: lazily on acquire, once wait_duration_in_open elapsed
//! Half-Open → Closed: a trial call succeeds (window cleared)
//! Half-Open → Open: a trial call fails (wait timer re-armed)
//! ```
//!
//! # Design Decisions
//! - One mutex per breaker; held only for the transition, never across the call
//! - Every permit carries the transition epoch it was issued in; outcomes
//!   from an older epoch are counted but cannot resolve a half-open trial
//! - Rejections are not recorded in the window

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

use crate::config::loader::ConfigError;
use crate::config::schema::BreakerSettings;
use crate::config::validation::validate_breaker;
use crate::observability::metrics;
use crate::resilience::window::{Outcome, OutcomeWindow};

/// Circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CircuitState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "CLOSED" => Ok(CircuitState::Closed),
            "OPEN" => Ok(CircuitState::Open),
            "HALF_OPEN" => Ok(CircuitState::HalfOpen),
            other => Err(format!("unknown circuit state '{}'", other)),
        }
    }
}

/// Proof that a call was admitted; hand it back with the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permit {
    epoch: u64,
    trial: bool,
}

impl Permit {
    /// Whether this permit spends a half-open trial slot.
    pub fn is_trial(&self) -> bool {
        self.trial
    }
}

/// Answer of [`CircuitBreaker::try_acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Permitted(Permit),
    Rejected,
}

impl Admission {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Admission::Permitted(_))
    }
}

/// Point-in-time view of a breaker for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    /// Failure percentage over the buffered calls.
    pub failure_rate: u8,
    pub buffered_calls: usize,
    pub failed_calls: usize,
    pub not_permitted_calls: u64,
    pub settings: BreakerSettings,
}

/// Gate in front of a protected operation.
pub trait CircuitBreaker: Send + Sync {
    /// Breaker identifier.
    fn name(&self) -> &str;

    /// Ask whether a call may proceed. May move Open → Half-Open.
    fn try_acquire(&self) -> Admission;

    /// Report the outcome of a permitted call. May transition state.
    fn record_outcome(&self, permit: Permit, outcome: Outcome);

    /// Current state, without side effects.
    fn state(&self) -> CircuitState;

    /// Administrative override.
    fn transition_to(&self, state: CircuitState);

    fn snapshot(&self) -> BreakerSnapshot;
}

/// Mutable breaker state guarded by the breaker's mutex.
#[derive(Debug)]
struct Core {
    state: CircuitState,
    window: OutcomeWindow,
    opened_at: Option<Instant>,
    trials_remaining: u32,
    epoch: u64,
    not_permitted: u64,
}

impl Core {
    /// Enter `to`, returning the state left behind.
    fn move_to(&mut self, to: CircuitState, settings: &BreakerSettings) -> CircuitState {
        let from = self.state;
        self.state = to;
        self.epoch += 1;

        match to {
            CircuitState::Closed => {
                self.window.clear();
                self.opened_at = None;
            }
            CircuitState::Open => {
                self.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                self.trials_remaining = settings.permitted_calls_in_half_open;
            }
        }

        from
    }
}

/// Failure-rate breaker over a count-based sliding window.
#[derive(Debug)]
pub struct CountBasedBreaker {
    name: String,
    settings: BreakerSettings,
    core: Mutex<Core>,
}

impl CountBasedBreaker {
    /// Create a closed breaker. Fails fast on invalid settings.
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Result<Self, ConfigError> {
        let name = name.into();
        validate_breaker(&name, &settings)?;

        metrics::record_breaker_state(&name, CircuitState::Closed);

        Ok(Self {
            core: Mutex::new(Core {
                state: CircuitState::Closed,
                window: OutcomeWindow::new(settings.sliding_window_size),
                opened_at: None,
                trials_remaining: 0,
                epoch: 0,
                not_permitted: 0,
            }),
            name,
            settings,
        })
    }

    pub fn settings(&self) -> &BreakerSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn announce(&self, from: CircuitState, to: CircuitState, failure_rate: u8) {
        match to {
            CircuitState::Open => tracing::warn!(
                breaker = %self.name,
                from = %from,
                to = %to,
                failure_rate,
                "Circuit opened"
            ),
            _ => tracing::info!(
                breaker = %self.name,
                from = %from,
                to = %to,
                "Circuit state changed"
            ),
        }
        metrics::record_transition(&self.name, to);
    }
}

impl CircuitBreaker for CountBasedBreaker {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_acquire(&self) -> Admission {
        let mut core = self.lock();
        let mut transition = None;

        if core.state == CircuitState::Open {
            let waited = core
                .opened_at
                .map_or(true, |at| at.elapsed() >= self.settings.wait_duration_in_open());
            if waited {
                let from = core.move_to(CircuitState::HalfOpen, &self.settings);
                transition = Some((from, core.window.failure_rate()));
            }
        }

        let admission = match core.state {
            CircuitState::Closed => Admission::Permitted(Permit { epoch: core.epoch, trial: false }),
            CircuitState::HalfOpen if core.trials_remaining > 0 => {
                core.trials_remaining -= 1;
                Admission::Permitted(Permit { epoch: core.epoch, trial: true })
            }
            CircuitState::Open | CircuitState::HalfOpen => {
                core.not_permitted += 1;
                Admission::Rejected
            }
        };
        drop(core);

        if let Some((from, rate)) = transition {
            self.announce(from, CircuitState::HalfOpen, rate);
        }
        admission
    }

    fn record_outcome(&self, permit: Permit, outcome: Outcome) {
        let mut core = self.lock();
        core.window.record(outcome);

        // A trial verdict must come from a trial call
        if core.state == CircuitState::HalfOpen && permit.epoch != core.epoch {
            tracing::debug!(breaker = %self.name, ?outcome, "Outcome from an earlier circuit epoch");
            return;
        }

        let rate = core.window.failure_rate();
        let next = match (core.state, outcome) {
            (CircuitState::Closed, Outcome::Failure)
                if core.window.len() >= self.settings.sliding_window_size
                    && rate >= self.settings.failure_rate_threshold =>
            {
                Some(CircuitState::Open)
            }
            (CircuitState::HalfOpen, Outcome::Success) => Some(CircuitState::Closed),
            (CircuitState::HalfOpen, Outcome::Failure) => Some(CircuitState::Open),
            _ => None,
        };

        let transition = next.map(|to| (core.move_to(to, &self.settings), to));
        drop(core);

        if let Some((from, to)) = transition {
            self.announce(from, to, rate);
        }
    }

    fn state(&self) -> CircuitState {
        self.lock().state
    }

    fn transition_to(&self, state: CircuitState) {
        let mut core = self.lock();
        let from = core.move_to(state, &self.settings);
        let rate = core.window.failure_rate();
        drop(core);

        tracing::warn!(breaker = %self.name, from = %from, to = %state, "Circuit state forced");
        self.announce(from, state, rate);
    }

    fn snapshot(&self) -> BreakerSnapshot {
        let core = self.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: core.state,
            failure_rate: core.window.failure_rate(),
            buffered_calls: core.window.len(),
            failed_calls: core.window.failures(),
            not_permitted_calls: core.not_permitted,
            settings: self.settings,
        }
    }
}
