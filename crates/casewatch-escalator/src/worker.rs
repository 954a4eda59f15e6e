//! Background worker for continuous escalation sweeps

use crate::escalator::current_timestamp;
use crate::{EscalationError, EscalationMetrics, Escalator, EscalatorConfig, SweepControl};
use casewatch_domain::traits::EscalationStore;
use casewatch_domain::ActivityEvent;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

/// Background worker that runs escalation sweeps on a schedule
///
/// Besides the periodic sweep, the worker can consume [`ActivityEvent`]s
/// from a channel: each event resets the record's aging clock and the
/// record is re-evaluated immediately.
///
/// # Examples
///
/// ```no_run
/// use casewatch_escalator::{EscalatorConfig, EscalatorWorker};
/// use casewatch_store::SqliteStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut store = SqliteStore::new("casewatch.db")?;
///     let mut worker = EscalatorWorker::new(EscalatorConfig::default())?;
///
///     // Run indefinitely (until Ctrl+C)
///     worker.run(&mut store).await?;
///     Ok(())
/// }
/// ```
pub struct EscalatorWorker {
    escalator: Escalator,
    interval: Duration,
    control: SweepControl,
}

impl EscalatorWorker {
    /// Create a new background worker with the given configuration
    pub fn new(config: EscalatorConfig) -> Result<Self, EscalationError> {
        Ok(Self::from_escalator(Escalator::new(config)?))
    }

    /// Wrap an already configured escalator
    pub fn from_escalator(escalator: Escalator) -> Self {
        let interval = escalator.config().sweep_interval();
        Self {
            escalator,
            interval,
            control: SweepControl::new(),
        }
    }

    /// Handle that stops the worker (and any sweep in progress) from elsewhere
    pub fn shutdown_handle(&self) -> SweepControl {
        self.control.clone()
    }

    /// Run the worker until Ctrl+C or a stop request
    pub async fn run<S>(&mut self, store: &mut S) -> Result<(), EscalationError>
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        self.run_loop(store, None).await
    }

    /// Run the worker and react to activity events
    ///
    /// Stops on Ctrl+C, a stop request, or when every sender of `events`
    /// has been dropped.
    pub async fn run_with_events<S>(
        &mut self,
        store: &mut S,
        events: mpsc::Receiver<ActivityEvent>,
    ) -> Result<(), EscalationError>
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        self.run_loop(store, Some(events)).await
    }

    async fn run_loop<S>(
        &mut self,
        store: &mut S,
        events: Option<mpsc::Receiver<ActivityEvent>>,
    ) -> Result<(), EscalationError>
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        let mut ticker = interval(self.interval);
        let control = self.control.clone();
        let events_open = events.is_some();
        let mut events = events;

        tracing::info!(
            "Escalation worker started (interval: {:?}, activity events: {})",
            self.interval,
            events_open
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting sweep cycle");
                    self.sweep_once(store);
                }
                event = next_event(&mut events), if events_open => {
                    match event {
                        Some(event) => self.handle_activity(store, event),
                        None => {
                            tracing::info!("Activity channel closed, stopping escalation worker");
                            break;
                        }
                    }
                }
                _ = control.stopped() => {
                    tracing::info!("Stop requested, stopping escalation worker");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping escalation worker");
                    control.stop();
                    break;
                }
            }
        }

        tracing::info!(
            "Escalation worker stopped. Final metrics:\n{}",
            self.escalator.metrics().summary()
        );

        Ok(())
    }

    fn sweep_once<S>(&mut self, store: &mut S)
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        match self.escalator.run_sweep(store, current_timestamp(), &self.control) {
            Ok(report) => tracing::info!("{}", report.summary()),
            Err(e) => tracing::error!("Sweep failed: {}", e),
        }
    }

    fn handle_activity<S>(&mut self, store: &mut S, event: ActivityEvent)
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        let now = current_timestamp();
        if let Err(e) = self.escalator.record_activity(store, &event, now) {
            tracing::warn!(record_id = %event.record_id, "activity not recorded: {}", e);
            return;
        }

        match self.escalator.evaluate_one(store, event.record_id, now) {
            Ok(evaluation) => {
                tracing::debug!(record_id = %event.record_id, outcome = ?evaluation.outcome, "record re-evaluated")
            }
            Err(e) => tracing::warn!(record_id = %event.record_id, "re-evaluation failed: {}", e),
        }
    }

    /// Run for a specific number of cycles (useful for testing)
    ///
    /// Unlike [`run`](Self::run), a failed sweep is returned as an error.
    pub async fn run_cycles<S>(&mut self, store: &mut S, cycles: usize) -> Result<(), EscalationError>
    where
        S: EscalationStore,
        S::Error: std::fmt::Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Escalation worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            tracing::debug!("Starting sweep cycle {}/{}", cycle + 1, cycles);

            match self.escalator.run_sweep(store, current_timestamp(), &self.control) {
                Ok(report) => {
                    tracing::info!("Sweep {}/{}: {}", cycle + 1, cycles, report.summary());
                }
                Err(e) => {
                    tracing::error!("Sweep {}/{} failed: {}", cycle + 1, cycles, e);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Escalation worker finished {} cycles. Final metrics:\n{}",
            cycles,
            self.escalator.metrics().summary()
        );

        Ok(())
    }

    /// Get a reference to the escalator's current metrics
    pub fn metrics(&self) -> &EscalationMetrics {
        self.escalator.metrics()
    }

    /// Reset the escalator's metrics counters
    pub fn reset_metrics(&mut self) {
        self.escalator.reset_metrics();
    }
}

async fn next_event(events: &mut Option<mpsc::Receiver<ActivityEvent>>) -> Option<ActivityEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
