//! MonitorSupervisor - starts the per-metric tasks and keeps them running
//!
//! For every configured metric the supervisor creates one `AlertGate` and spawns two
//! tasks sharing it: a `MonitorWorker` and a `DayBoundaryTimer`. Tasks of different
//! metrics share nothing. All tasks hang off a single cancellation token, which is the
//! only way to stop them.

use std::sync::Arc;

use chrono::NaiveTime;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::{
    MetricDefinition,
    alerts::{AlertTemplate, Notifier},
    config::Config,
    sources::MetricSource,
};

use super::{
    day_boundary::{Clock, DayBoundaryTimer, SystemClock},
    gate::AlertGate,
    worker::MonitorWorker,
};

/// The running tasks of one metric
pub struct MonitorHandle {
    pub identifier: String,
    gate: AlertGate,
    worker: JoinHandle<()>,
    timer: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn gate(&self) -> &AlertGate {
        &self.gate
    }

    /// Wait until both tasks of this metric have finished.
    pub async fn join(self) {
        for (task, result) in [("worker", self.worker.await), ("timer", self.timer.await)] {
            if let Err(e) = result {
                error!("{}: {task} task failed: {e}", self.identifier);
            }
        }
    }
}

pub struct MonitorSupervisor {
    definitions: Vec<MetricDefinition>,
    template: AlertTemplate,
    reset_time: NaiveTime,
    source: Arc<dyn MetricSource>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl MonitorSupervisor {
    pub fn new(
        config: &Config,
        source: Arc<dyn MetricSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            definitions: config.definitions(),
            template: AlertTemplate::from(&config.email),
            reset_time: config.reset_time,
            source,
            notifier,
            clock: Arc::new(SystemClock),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the wall clock used by the day boundary timers.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop every task started by this supervisor.
    pub fn shutdown(&self) {
        debug!("cancelling all monitor tasks");
        self.cancel.cancel();
    }

    /// Spawn a worker and a day boundary timer for every metric.
    pub fn spawn(&self) -> Vec<MonitorHandle> {
        self.definitions
            .iter()
            .map(|definition| self.spawn_metric(definition.clone()))
            .collect()
    }

    fn spawn_metric(&self, definition: MetricDefinition) -> MonitorHandle {
        let identifier = definition.identifier.clone();
        let gate = AlertGate::new();

        let timer = DayBoundaryTimer::new(
            identifier.clone(),
            gate.clone(),
            self.reset_time,
            self.clock.clone(),
            self.cancel.child_token(),
        );

        let worker = MonitorWorker::new(
            definition,
            self.source.clone(),
            self.notifier.clone(),
            self.template.clone(),
            gate.clone(),
            self.cancel.child_token(),
        );

        MonitorHandle {
            identifier,
            gate,
            worker: tokio::spawn(worker.run()),
            timer: tokio::spawn(timer.run()),
        }
    }

    /// Start all metrics and wait for them. Only returns after `shutdown` was called.
    #[instrument(skip(self))]
    pub async fn run(&self) {
        let handles = self.spawn();
        info!("monitoring {} metric(s)", handles.len());

        join_all(handles.into_iter().map(MonitorHandle::join)).await;

        info!("all monitors stopped");
    }
}
