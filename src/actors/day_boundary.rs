//! DayBoundaryTimer - reopens a metric's alert gate once per local day
//!
//! The wait is always derived from the current wall clock instead of being accumulated,
//! so daylight saving shifts and clock adjustments can not make the reset drift. Before
//! firing the timer checks the clock again and keeps waiting if it woke up early.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use super::gate::AlertGate;

/// Upper bound for a single sleep, so a suspended host re-reads the clock soon after resuming
const MAX_SLEEP: Duration = Duration::from_secs(15 * 60);

/// Wait used if no reset instant can be computed at all
const FALLBACK_SLEEP: Duration = Duration::from_secs(60 * 60);

/// Source of the current local time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Map a local wall-clock time to an instant.
///
/// Ambiguous times (clocks turned back) resolve to the earlier instant, times inside a
/// gap (clocks turned forward) move to the first valid local time after the gap.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(instant) => Some(instant),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => (1..=16).find_map(|step| {
            let shifted = naive.checked_add_signed(TimeDelta::minutes(15 * step))?;
            tz.from_local_datetime(&shifted).earliest()
        }),
    }
}

/// The first instant strictly after `now` whose local time is `reset_time`.
pub fn next_reset_after<Tz: TimeZone>(
    now: &DateTime<Tz>,
    reset_time: NaiveTime,
) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let mut date = now.date_naive();

    for _ in 0..3 {
        if let Some(candidate) = resolve_local(&tz, date.and_time(reset_time))
            && candidate > *now
        {
            return Some(candidate);
        }
        date = date.succ_opt()?;
    }

    None
}

pub fn duration_until_next_reset<Tz: TimeZone>(
    now: &DateTime<Tz>,
    reset_time: NaiveTime,
) -> Option<Duration> {
    let next = next_reset_after(now, reset_time)?;
    (next - now.clone()).to_std().ok()
}

pub struct DayBoundaryTimer {
    metric: String,
    gate: AlertGate,
    reset_time: NaiveTime,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl DayBoundaryTimer {
    pub fn new(
        metric: String,
        gate: AlertGate,
        reset_time: NaiveTime,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            metric,
            gate,
            reset_time,
            clock,
            cancel,
        }
    }

    #[instrument(skip(self), fields(metric = %self.metric))]
    pub async fn run(self) {
        debug!("starting day boundary timer (reset at {})", self.reset_time);

        loop {
            let now = self.clock.now();
            let Some(target) = next_reset_after(&now, self.reset_time) else {
                error!("could not compute next reset after {now}, retrying later");
                if !self.sleep(FALLBACK_SLEEP).await {
                    break;
                }
                continue;
            };

            debug!("next day boundary at {target}");

            if !self.wait_until(&target).await {
                break;
            }

            let was_fired = self.gate.reset();
            info!(
                was_fired,
                "new day start: {}",
                self.clock.now().format("%Y-%m-%d %H:%M:%S")
            );
        }

        debug!("day boundary timer stopped");
    }

    /// Returns `false` if the timer was cancelled before `target` was reached.
    async fn wait_until(&self, target: &DateTime<Local>) -> bool {
        loop {
            let remaining = match (*target - self.clock.now()).to_std() {
                Ok(remaining) if !remaining.is_zero() => remaining,
                _ => return true,
            };

            if !self.sleep(remaining.min(MAX_SLEEP)).await {
                return false;
            }
        }
    }

    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
