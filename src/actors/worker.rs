//! MonitorWorker - polls one metric and alerts on the first breach of the day
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → fetch value → evaluate limits → claim AlertGate → notify
//!     ↑                          │                    │
//!     │                      in range            already fired
//!     └────────── wait poll interval ◀───────────────┘
//! ```
//!
//! Every failure inside an iteration is logged and the loop continues with the next
//! tick. A failed delivery still leaves the gate fired, so a flaky mail server can not
//! turn a single breach into one e-mail attempt per poll.

use std::sync::Arc;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    MetricDefinition, Reading,
    alerts::{AlertTemplate, NotificationMessage, Notifier},
    sources::MetricSource,
};

use super::{gate::AlertGate, messages::PollOutcome};

pub struct MonitorWorker {
    definition: MetricDefinition,
    source: Arc<dyn MetricSource>,
    notifier: Arc<dyn Notifier>,
    template: AlertTemplate,
    gate: AlertGate,
    cancel: CancellationToken,
}

impl MonitorWorker {
    pub fn new(
        definition: MetricDefinition,
        source: Arc<dyn MetricSource>,
        notifier: Arc<dyn Notifier>,
        template: AlertTemplate,
        gate: AlertGate,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            definition,
            source,
            notifier,
            template,
            gate,
            cancel,
        }
    }

    /// Poll until cancelled. The first poll happens immediately.
    #[instrument(skip(self), fields(metric = %self.definition.identifier))]
    pub async fn run(self) {
        debug!(
            "starting monitor worker (interval {:?}, limits [{}, {}])",
            self.definition.poll_interval, self.definition.lower_limit, self.definition.upper_limit
        );

        let mut ticker = interval(self.definition.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("received cancellation");
                    break;
                }

                _ = ticker.tick() => {
                    let outcome = self.poll().await;
                    trace!("poll finished: {outcome:?}");
                }
            }
        }

        debug!("monitor worker stopped");
    }

    /// Run a single iteration: fetch, evaluate, and alert if the gate is still open.
    #[instrument(skip(self), fields(metric = %self.definition.identifier))]
    pub async fn poll(&self) -> PollOutcome {
        let reading = match self.source.fetch(&self.definition).await {
            Ok(value) => Reading::new(value),
            Err(e) => {
                warn!("failed to fetch metric: {e}");
                return PollOutcome::FetchFailed;
            }
        };

        if !reading.valid {
            warn!("discarding unusable reading {}", reading.value);
            return PollOutcome::FetchFailed;
        }

        let value = reading.value;
        trace!("{} {value} {}", self.definition.identifier, self.definition.kind.unit());

        if !self.definition.is_breached(value) {
            return PollOutcome::WithinLimits(value);
        }

        if !self.gate.try_fire() {
            trace!("{value} breaches the limits, already alerted today");
            return PollOutcome::Suppressed(value);
        }

        info!(
            "{value} is out of range [{}, {}], sending notification",
            self.definition.lower_limit, self.definition.upper_limit
        );

        let message = NotificationMessage::breach(&self.template, &self.definition, value);
        let delivered = match self.notifier.send(&message).await {
            Ok(()) => true,
            Err(e) => {
                error!("failed to deliver notification: {e}");
                false
            }
        };

        PollOutcome::Notified { value, delivered }
    }

    pub fn gate(&self) -> &AlertGate {
        &self.gate
    }
}
