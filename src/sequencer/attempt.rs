//! Session parameters, attempt records and run results

use crate::contract::CallRequest;
use crate::error::{FrontrunnerError, FrontrunnerResult};

use ethers::types::H256;
use std::fmt;
use std::time::Duration;

/// Parameters of one sequencer run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionParams {
    pub total_attempts: u64,
    pub interval_secs: f64,
    pub base_nonce: u64,
    pub gas_limit: u64,
}

impl SessionParams {
    /// Reject parameters that would make the run meaningless
    pub fn validate(&self) -> FrontrunnerResult<()> {
        if self.total_attempts == 0 {
            return Err(FrontrunnerError::Config(
                "total attempts must be at least 1".to_string(),
            ));
        }
        self.interval()?;
        if self.gas_limit == 0 {
            return Err(FrontrunnerError::Config(
                "gas limit must be positive".to_string(),
            ));
        }
        if self.base_nonce.checked_add(self.total_attempts - 1).is_none() {
            return Err(FrontrunnerError::Config(format!(
                "{} attempts from nonce {} overflow the nonce range",
                self.total_attempts, self.base_nonce
            )));
        }
        Ok(())
    }

    /// Delay between two attempts; must be positive and fit a `Duration`
    pub fn interval(&self) -> FrontrunnerResult<Duration> {
        interval_from_secs(self.interval_secs)
    }

    /// Nonce assigned to the attempt at `index`
    pub fn nonce_for(&self, index: u64) -> u64 {
        self.base_nonce + index
    }
}

/// Convert a pacing interval in seconds, rejecting values a timer cannot hold
pub fn interval_from_secs(secs: f64) -> FrontrunnerResult<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(interval) if !interval.is_zero() => Ok(interval),
        _ => Err(FrontrunnerError::Config(format!(
            "interval must be a positive number of seconds, got {}",
            secs
        ))),
    }
}

/// Outcome of a single attempt.
///
/// `Submitted` holds once the node has accepted the transaction and the
/// attempt is waiting on its receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Pending,
    Submitted(H256),
    Confirmed(H256),
    Failed(String),
}

impl AttemptOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptOutcome::Confirmed(_) | AttemptOutcome::Failed(_))
    }

    fn name(&self) -> &'static str {
        match self {
            AttemptOutcome::Pending => "Pending",
            AttemptOutcome::Submitted(_) => "Submitted",
            AttemptOutcome::Confirmed(_) => "Confirmed",
            AttemptOutcome::Failed(_) => "Failed",
        }
    }
}

/// One attempt of the contract call with its assigned nonce
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub index: u64,
    pub nonce: u64,
    outcome: AttemptOutcome,
}

impl AttemptRecord {
    pub fn new(index: u64, nonce: u64) -> Self {
        Self {
            index,
            nonce,
            outcome: AttemptOutcome::Pending,
        }
    }

    pub fn outcome(&self) -> &AttemptOutcome {
        &self.outcome
    }

    /// Request to hand to the contract for this attempt
    pub fn request(&self, gas_limit: u64) -> CallRequest {
        CallRequest {
            gas_limit,
            nonce: self.nonce,
        }
    }

    pub fn mark_submitted(&mut self, tx_hash: H256) -> FrontrunnerResult<()> {
        self.transition(AttemptOutcome::Submitted(tx_hash))
    }

    /// Confirm the transaction recorded by `mark_submitted`
    pub fn mark_confirmed(&mut self) -> FrontrunnerResult<()> {
        let tx_hash = match &self.outcome {
            AttemptOutcome::Submitted(tx_hash) => *tx_hash,
            _ => return Err(self.invalid(AttemptOutcome::Confirmed(H256::zero()))),
        };
        self.transition(AttemptOutcome::Confirmed(tx_hash))
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) -> FrontrunnerResult<()> {
        self.transition(AttemptOutcome::Failed(message.into()))
    }

    /// Pending -> Submitted -> Confirmed | Failed, or Pending -> Failed
    fn transition(&mut self, next: AttemptOutcome) -> FrontrunnerResult<()> {
        let allowed = matches!(
            (&self.outcome, &next),
            (AttemptOutcome::Pending, AttemptOutcome::Submitted(_))
                | (AttemptOutcome::Pending, AttemptOutcome::Failed(_))
                | (AttemptOutcome::Submitted(_), AttemptOutcome::Confirmed(_))
                | (AttemptOutcome::Submitted(_), AttemptOutcome::Failed(_))
        );
        if !allowed {
            return Err(self.invalid(next));
        }
        self.outcome = next;
        Ok(())
    }

    fn invalid(&self, next: AttemptOutcome) -> FrontrunnerError {
        FrontrunnerError::InvalidStateTransition {
            from: self.outcome.name().to_string(),
            to: next.name().to_string(),
        }
    }
}

/// Lifecycle of a sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequencerState::Idle => "idle",
            SequencerState::Running => "running",
            SequencerState::Completed => "completed",
            SequencerState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Final counts of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: u64,
    pub failed: u64,
    pub state: SequencerState,
}

impl RunSummary {
    /// Attempts that reached a terminal outcome
    pub fn attempted(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Progress reported while a run executes
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// One attempt reached its terminal outcome
    Attempt {
        attempt: u64,
        total: u64,
        nonce: u64,
        outcome: AttemptOutcome,
    },
    /// The run ended
    Finished(RunSummary),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SessionParams {
        SessionParams {
            total_attempts: 3,
            interval_secs: 1.0,
            base_nonce: 7,
            gas_limit: 200_000,
        }
    }

    #[test]
    fn test_valid_params() {
        assert!(params().validate().is_ok());
        assert_eq!(params().nonce_for(2), 9);
        assert_eq!(params().interval().unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let p = SessionParams {
            total_attempts: 0,
            ..params()
        };
        assert!(matches!(p.validate(), Err(FrontrunnerError::Config(_))));
    }

    #[test]
    fn test_bad_interval_rejected() {
        for interval_secs in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e20, 1e-12] {
            let p = SessionParams {
                interval_secs,
                ..params()
            };
            assert!(matches!(p.validate(), Err(FrontrunnerError::Config(_))));
        }
    }

    #[test]
    fn test_interval_beyond_timer_range_rejected() {
        let p = SessionParams {
            total_attempts: 2,
            interval_secs: 1e20,
            ..params()
        };
        assert!(matches!(p.validate(), Err(FrontrunnerError::Config(_))));
        assert!(matches!(p.interval(), Err(FrontrunnerError::Config(_))));
        assert_eq!(
            interval_from_secs(86_400.0).unwrap(),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn test_zero_gas_limit_rejected() {
        let p = SessionParams {
            gas_limit: 0,
            ..params()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_nonce_overflow_rejected() {
        let p = SessionParams {
            base_nonce: u64::MAX - 1,
            ..params()
        };
        assert!(p.validate().is_err());

        let p = SessionParams {
            base_nonce: u64::MAX - 2,
            ..params()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_record_confirm_path() {
        let hash = H256::from_low_u64_be(0xabc);
        let mut record = AttemptRecord::new(0, 10);
        assert_eq!(record.request(21_000).nonce, 10);

        record.mark_submitted(hash).unwrap();
        assert!(!record.outcome().is_terminal());
        record.mark_confirmed().unwrap();
        assert_eq!(record.outcome(), &AttemptOutcome::Confirmed(hash));
        assert!(record.outcome().is_terminal());
    }

    #[test]
    fn test_record_fails_directly() {
        let mut record = AttemptRecord::new(1, 11);
        record.mark_failed("nonce too low").unwrap();
        assert_eq!(
            record.outcome(),
            &AttemptOutcome::Failed("nonce too low".to_string())
        );
    }

    #[test]
    fn test_record_fails_after_submission() {
        let hash = H256::from_low_u64_be(0xdead);
        let mut record = AttemptRecord::new(2, 12);
        record.mark_submitted(hash).unwrap();
        record.mark_failed("reverted").unwrap();
        assert_eq!(record.outcome(), &AttemptOutcome::Failed("reverted".to_string()));
    }

    #[test]
    fn test_terminal_outcome_is_final() {
        let mut record = AttemptRecord::new(0, 0);
        record.mark_failed("boom").unwrap();
        assert!(matches!(
            record.mark_submitted(H256::zero()),
            Err(FrontrunnerError::InvalidStateTransition { .. })
        ));

        let mut record = AttemptRecord::new(0, 0);
        assert!(record.mark_confirmed().is_err());
    }
}
