//! Sequential attempt loop with deterministic nonces and fixed pacing

use super::attempt::{
    AttemptOutcome, AttemptRecord, ProgressEvent, RunSummary, SequencerState, SessionParams,
};
use crate::contract::GameContract;
use crate::error::{FrontrunnerError, FrontrunnerResult};

use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Bookkeeping of a single run
struct RunState {
    remaining: u64,
    completed: u64,
}

/// Runs the attempts of one game session.
///
/// A sequencer is single-use: it moves from `Idle` to `Running` to
/// `Completed` or `Cancelled`, and owns the nonce range
/// `base_nonce..base_nonce + total_attempts` while it runs.
pub struct AttemptSequencer {
    /// Progress channel to the session controller
    events: mpsc::UnboundedSender<ProgressEvent>,
    /// Cooperative cancellation, checked between attempts
    shutdown: CancellationToken,
    /// Lifecycle state
    state: RwLock<SequencerState>,
}

impl AttemptSequencer {
    /// Create a new sequencer reporting to `events`
    pub fn new(events: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self {
            events,
            shutdown: CancellationToken::new(),
            state: RwLock::new(SequencerState::Idle),
        }
    }

    /// Token that stops the run at the next attempt boundary when cancelled
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SequencerState {
        *self.state.read().await
    }

    /// Execute all attempts of the session.
    ///
    /// Invalid parameters fail before any submission. Individual attempt
    /// failures are reported through progress events and counted, never
    /// returned.
    pub async fn run<C>(
        &self,
        params: &SessionParams,
        contract: &C,
    ) -> FrontrunnerResult<RunSummary>
    where
        C: GameContract + ?Sized,
    {
        params.validate()?;
        let interval = params.interval()?;
        self.transition(SequencerState::Idle, SequencerState::Running)
            .await?;

        let span = info_span!("run", run_id = %Uuid::new_v4());
        let summary = self
            .run_attempts(params, interval, contract)
            .instrument(span)
            .await;

        self.transition(SequencerState::Running, summary.state)
            .await?;
        crate::metrics::record_run(summary.state);
        let _ = self.events.send(ProgressEvent::Finished(summary));

        Ok(summary)
    }

    async fn run_attempts<C>(
        &self,
        params: &SessionParams,
        interval: Duration,
        contract: &C,
    ) -> RunSummary
    where
        C: GameContract + ?Sized,
    {
        let mut run = RunState {
            remaining: params.total_attempts,
            completed: 0,
        };
        let mut succeeded = 0;
        let mut failed = 0;

        info!(
            "Starting {} attempts from nonce {} every {}s",
            params.total_attempts, params.base_nonce, params.interval_secs
        );

        while run.remaining > 0 {
            if self.shutdown.is_cancelled() {
                info!(
                    "Run cancelled after {}/{} attempts",
                    run.completed, params.total_attempts
                );
                return RunSummary {
                    succeeded,
                    failed,
                    state: SequencerState::Cancelled,
                };
            }

            let mut record = AttemptRecord::new(run.completed, params.nonce_for(run.completed));
            let outcome = self.attempt(&mut record, params.gas_limit, contract).await;

            match outcome {
                AttemptOutcome::Confirmed(_) => succeeded += 1,
                _ => failed += 1,
            }

            run.completed += 1;
            run.remaining -= 1;

            let _ = self.events.send(ProgressEvent::Attempt {
                attempt: run.completed,
                total: params.total_attempts,
                nonce: record.nonce,
                outcome,
            });

            if run.remaining > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = self.shutdown.cancelled() => {
                        debug!("Delay interrupted by shutdown");
                    }
                }
            }
        }

        info!("Run complete: {} confirmed, {} failed", succeeded, failed);
        RunSummary {
            succeeded,
            failed,
            state: SequencerState::Completed,
        }
    }

    /// Submit one attempt and drive its record to a terminal outcome
    async fn attempt<C>(
        &self,
        record: &mut AttemptRecord,
        gas_limit: u64,
        contract: &C,
    ) -> AttemptOutcome
    where
        C: GameContract + ?Sized,
    {
        let started = Instant::now();
        let result = contract.submit_frontrun(record.request(gas_limit)).await;
        crate::metrics::record_attempt_latency(started.elapsed().as_secs_f64());

        let transition = match result {
            Ok(tx_hash) => {
                info!(
                    "Attempt {} confirmed: {:?} (nonce {})",
                    record.index + 1,
                    tx_hash,
                    record.nonce
                );
                crate::metrics::record_attempt_confirmed();
                record
                    .mark_submitted(tx_hash)
                    .and_then(|_| record.mark_confirmed())
            }
            Err(e) => {
                if e.is_attempt_error() {
                    warn!(
                        "Attempt {} failed (nonce {}): {}",
                        record.index + 1,
                        record.nonce,
                        e
                    );
                } else {
                    error!(
                        "Attempt {} failed with unexpected error (nonce {}): {}",
                        record.index + 1,
                        record.nonce,
                        e
                    );
                }
                crate::metrics::record_attempt_failed();
                let submitted = match e.submitted_tx() {
                    Some(tx_hash) => record.mark_submitted(tx_hash),
                    None => Ok(()),
                };
                submitted.and_then(|_| record.mark_failed(e.to_string()))
            }
        };

        if let Err(e) = transition {
            error!("Attempt {} bookkeeping error: {}", record.index + 1, e);
        }

        match record.outcome() {
            outcome if outcome.is_terminal() => outcome.clone(),
            outcome => AttemptOutcome::Failed(format!("attempt left in {:?} state", outcome)),
        }
    }

    async fn transition(
        &self,
        from: SequencerState,
        to: SequencerState,
    ) -> FrontrunnerResult<()> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(FrontrunnerError::InvalidStateTransition {
                from: state.to_string(),
                to: to.to_string(),
            });
        }
        *state = to;
        Ok(())
    }
}
