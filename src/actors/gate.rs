//! AlertGate - per-metric "already alerted today" flag
//!
//! The gate is shared by exactly two tasks: the metric's worker, which claims it on the
//! first breach of the day, and the metric's day boundary timer, which releases it at the
//! reset time. Both transitions are single atomic operations, so a claim and a reset can
//! never interleave.
//!
//! ```text
//!          try_fire() (worker)
//!   open ─────────────────────▶ fired
//!     ▲                           │
//!     └───────────────────────────┘
//!          reset() (timer)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct AlertGate {
    fired: Arc<AtomicBool>,
}

impl AlertGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Claim the gate for today.
    ///
    /// Returns `true` only for the caller that moved the gate from open to fired.
    pub fn try_fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Open the gate again, returning whether it had fired.
    pub fn reset(&self) -> bool {
        self.fired.swap(false, Ordering::AcqRel)
    }
}
