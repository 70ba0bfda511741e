//! Task-based monitoring core
//!
//! Every configured metric is served by two independent tokio tasks that share a single
//! `AlertGate`. Tasks of different metrics never communicate.
//!
//! ## Architecture Overview
//!
//! ```text
//!                  ┌───────────────────┐
//!                  │ MonitorSupervisor │
//!                  └─────────┬─────────┘
//!                            │ spawns per metric
//!            ┌───────────────┴───────────────┐
//!            │                               │
//!    ┌───────▼───────┐               ┌───────▼──────────┐
//!    │ MonitorWorker │               │ DayBoundaryTimer │
//!    │ (poll/notify) │               │ (local midnight) │
//!    └───────┬───────┘               └───────┬──────────┘
//!            │ try_fire()                    │ reset()
//!            └──────────► AlertGate ◄────────┘
//! ```
//!
//! ## Task Types
//!
//! - **MonitorWorker**: Polls a `MetricSource`, evaluates limits, notifies once per day
//! - **DayBoundaryTimer**: Reopens the gate at the configured local reset time
//! - **MonitorSupervisor**: Spawns both tasks for every metric and owns the cancellation token

pub mod day_boundary;
pub mod gate;
pub mod messages;
pub mod supervisor;
pub mod worker;
