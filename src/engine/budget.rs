//! Attack budgets and cancellation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Budget;

/// Caller-held switch that stops a running attack.
///
/// Workers finish the candidate they are scoring and stop; whatever has been
/// collected so far is rescored and returned without further refinement.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates an untriggered token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns true once [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Shared accounting of the work done by one attack.
///
/// The candidate limit only caps stage 1 enumeration; the deadline and the
/// cancel token stop every stage.
#[derive(Debug)]
pub(crate) struct BudgetTracker {
    deadline: Option<Instant>,
    max_candidates: Option<u64>,
    evaluated: AtomicU64,
    spent: AtomicBool,
    timed_out: AtomicBool,
    cancel: CancelToken,
}

impl BudgetTracker {
    pub fn new(budget: Budget, started: Instant, cancel: CancelToken) -> Self {
        Self {
            deadline: budget.max_duration.and_then(|d| started.checked_add(d)),
            max_candidates: budget.max_candidates,
            evaluated: AtomicU64::new(0),
            spent: AtomicBool::new(false),
            timed_out: AtomicBool::new(false),
            cancel,
        }
    }

    /// Reserves one stage 1 candidate. Returns false when enumeration must
    /// stop.
    pub fn try_claim(&self) -> bool {
        if self.spent.load(Ordering::Acquire) || self.should_stop() {
            return false;
        }
        let claimed = match self.max_candidates {
            Some(max) => self
                .evaluated
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
                .is_ok(),
            None => {
                self.evaluated.fetch_add(1, Ordering::AcqRel);
                true
            }
        };
        if !claimed {
            self.spent.store(true, Ordering::Release);
        }
        claimed
    }

    /// Returns true once time ran out or the caller cancelled.
    pub fn should_stop(&self) -> bool {
        if self.timed_out.load(Ordering::Acquire) || self.cancel.is_cancelled() {
            return true;
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.timed_out.store(true, Ordering::Release);
            return true;
        }
        false
    }

    pub fn evaluated(&self) -> u64 {
        self.evaluated.load(Ordering::Acquire)
    }

    /// Returns true if the time or candidate limit was hit.
    pub fn exhausted(&self) -> bool {
        self.spent.load(Ordering::Acquire) || self.timed_out.load(Ordering::Acquire)
    }

    pub fn cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
