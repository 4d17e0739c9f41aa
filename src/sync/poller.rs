//! Bounded polling of package synchronization status
//!
//! The poller is a small state machine: it stays in `Polling` while the observed
//! status is not what the caller waits for, burning one attempt per query, and
//! ends in `Synchronized`, `Absent` or `TimedOut`. Unrecognized or transient
//! responses are never terminal.

use crate::config::PollConfig;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::{PackageRef, RegistryTransport, SyncStatus};
use crate::sync::clock::{Clock, TokioClock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Condition the caller is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTarget {
    /// Package finished synchronizing (after a push)
    Synchronized,
    /// Package no longer exists (after a delete)
    Absent,
    /// Whichever terminal condition shows up first
    Any,
}

impl fmt::Display for PollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollTarget::Synchronized => f.write_str("synchronization"),
            PollTarget::Absent => f.write_str("deletion"),
            PollTarget::Any => f.write_str("a terminal status"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Synchronized,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub outcome: PollOutcome,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Result of a single status query
#[derive(Debug)]
enum Observation {
    Status {
        status: SyncStatus,
        reason: Option<String>,
    },
    NotFound,
    Failed(RegistryError),
}

impl Observation {
    fn resolve(&self, target: PollTarget) -> Option<PollOutcome> {
        match (self, target) {
            (
                Observation::Status {
                    status: SyncStatus::Synchronized,
                    ..
                },
                PollTarget::Synchronized | PollTarget::Any,
            ) => Some(PollOutcome::Synchronized),
            (Observation::NotFound, PollTarget::Absent | PollTarget::Any) => {
                Some(PollOutcome::Absent)
            }
            _ => None,
        }
    }
}

pub struct SyncPoller<'a> {
    transport: &'a dyn RegistryTransport,
    clock: Arc<dyn Clock>,
    config: PollConfig,
    output: Logger,
}

impl<'a> SyncPoller<'a> {
    pub fn new(transport: &'a dyn RegistryTransport, config: PollConfig, output: Logger) -> Self {
        Self {
            transport,
            clock: Arc::new(TokioClock),
            config,
            output,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Query status until `target` is observed or the attempt budget runs out.
    ///
    /// Returns as soon as the target is reached; sleeps the poll interval only
    /// between attempts, never after the last one.
    pub async fn wait(&self, package: &PackageRef, target: PollTarget) -> Result<PollReport> {
        let start = self.clock.now();
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            let observation = self.observe(package).await;

            if let Some(outcome) = observation.resolve(target) {
                return Ok(PollReport {
                    outcome,
                    attempts: attempt,
                    elapsed: self.clock.now() - start,
                });
            }

            self.log_pending(package, attempt, &observation);

            if attempt < max_attempts {
                self.clock.sleep(self.config.interval()).await;
            }
        }

        Err(RegistryError::PollTimeout {
            target: format!("{} of {}", target, package),
            attempts: max_attempts,
            elapsed: self.clock.now() - start,
        })
    }

    async fn observe(&self, package: &PackageRef) -> Observation {
        match self.transport.package_status(package).await {
            Ok(report) => Observation::Status {
                status: report.sync_status(),
                reason: report.status_reason,
            },
            Err(e) if e.is_not_found() => Observation::NotFound,
            Err(e) => Observation::Failed(e),
        }
    }

    fn log_pending(&self, package: &PackageRef, attempt: u32, observation: &Observation) {
        let prefix = format!("[{}/{}] {}", attempt, self.config.max_attempts, package);
        match observation {
            Observation::Status {
                status: SyncStatus::Failed,
                reason,
            } => self.output.warning(&format!(
                "{}: sync failed: {}",
                prefix,
                reason.as_deref().unwrap_or("no reason given")
            )),
            Observation::Status { status, .. } => {
                self.output.detail(&format!("{}: {}", prefix, status))
            }
            Observation::NotFound => self.output.detail(&format!("{}: not found", prefix)),
            Observation::Failed(e) => {
                self.output
                    .warning(&format!("{}: status query failed: {}", prefix, e))
            }
        }
    }
}
