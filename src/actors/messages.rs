//! Message types reported by the monitoring actors

/// Result of a single poll of a metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// The source failed or returned an unusable value; nothing was evaluated
    FetchFailed,

    /// The value is strictly between the lower and upper limit
    WithinLimits(f64),

    /// The value breaches a limit but an alert was already sent today
    Suppressed(f64),

    /// The value breaches a limit and this poll claimed the gate
    Notified {
        value: f64,
        /// Whether the notifier reported a successful delivery
        delivered: bool,
    },
}

impl PollOutcome {
    pub fn notified(&self) -> bool {
        matches!(self, PollOutcome::Notified { .. })
    }
}
