//! Attempt sequencer
//!
//! Issues the attempts of a game session one at a time:
//! 1. Assigns nonce `base_nonce + i` to attempt `i`, without re-reading the chain
//! 2. Submits the call and waits for its terminal outcome
//! 3. Reports the outcome and keeps going on failure
//! 4. Waits the session interval before the next attempt

pub mod attempt;
pub mod engine;

pub use attempt::{
    interval_from_secs, AttemptOutcome, ProgressEvent, RunSummary, SequencerState, SessionParams,
};
pub use engine::AttemptSequencer;
