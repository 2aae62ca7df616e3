//! Session controller
//!
//! Turns a menu selection into session parameters, runs one sequencer per
//! game and prints its progress.

pub mod menu;
pub mod report;

pub use menu::{GameMode, Menu};

use crate::config::GameSettings;
use crate::contract::GameContract;
use crate::error::FrontrunnerResult;
use crate::sequencer::{AttemptSequencer, RunSummary, SessionParams};

use colored::Colorize;
use ethers::types::Address;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Attempt count and interval chosen for one game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GamePlan {
    pub total_attempts: u64,
    pub interval_secs: f64,
}

impl GamePlan {
    /// Plan for automatic mode
    pub fn automatic(game: &GameSettings) -> Self {
        Self {
            total_attempts: game.automatic_attempts,
            interval_secs: game.default_interval_secs,
        }
    }

    pub fn params(&self, base_nonce: u64, gas_limit: u64) -> SessionParams {
        SessionParams {
            total_attempts: self.total_attempts,
            interval_secs: self.interval_secs,
            base_nonce,
            gas_limit,
        }
    }
}

/// One player's games against the contract
pub struct Session<'a, C: ?Sized> {
    contract: &'a C,
    player: Address,
    gas_limit: u64,
}

impl<'a, C> Session<'a, C>
where
    C: GameContract + ?Sized,
{
    pub fn new(contract: &'a C, player: Address, gas_limit: u64) -> Self {
        Self {
            contract,
            player,
            gas_limit,
        }
    }

    /// Print the player's stats. A failed read never blocks the game.
    pub async fn show_score(&self) {
        match self.contract.get_score(self.player).await {
            Ok(score) => println!("\n{}", report::describe_score(&score).cyan()),
            Err(e) => {
                warn!("Failed to get score: {}", e);
                println!(
                    "\n{}",
                    format!("❌ Failed to get score: {} - Continuing without stats...", e).red()
                );
            }
        }
    }

    /// Run one game starting at `base_nonce`. Ctrl-C routed through
    /// `interrupts` stops it at the next attempt boundary.
    pub async fn play(
        &self,
        plan: GamePlan,
        base_nonce: u64,
        interrupts: &InterruptHandler,
    ) -> FrontrunnerResult<RunSummary> {
        let params = plan.params(base_nonce, self.gas_limit);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let sequencer = AttemptSequencer::new(events_tx);
        let printer = tokio::spawn(report::print_progress(events_rx));

        info!(
            "Starting game with {} attempts and {}s intervals",
            plan.total_attempts, plan.interval_secs
        );
        interrupts.arm(sequencer.shutdown_handle());
        let result = sequencer.run(&params, self.contract).await;
        interrupts.disarm();
        debug!("Sequencer left in state {}", sequencer.state().await);

        // Closing the channel lets the printer drain and finish
        drop(sequencer);
        if let Err(e) = printer.await {
            warn!("Progress printer stopped abnormally: {}", e);
        }

        result
    }
}

/// Routes Ctrl-C to the running game, or exits when no game is running
#[derive(Clone, Default)]
pub struct InterruptHandler {
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl InterruptHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route Ctrl-C to the game stopped by `token`
    pub fn arm(&self, token: CancellationToken) {
        if let Ok(mut active) = self.active.lock() {
            *active = Some(token);
        }
    }

    /// Forget the current game
    pub fn disarm(&self) {
        if let Ok(mut active) = self.active.lock() {
            *active = None;
        }
    }

    /// Cancel the running game. Returns false when there is none to cancel.
    pub fn interrupt(&self) -> bool {
        let token = self.active.lock().ok().and_then(|active| active.clone());
        match token {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Listen for Ctrl-C for the lifetime of the process
    pub fn spawn(&self) -> JoinHandle<()> {
        let handler = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }

                if handler.interrupt() {
                    println!(
                        "\n{}",
                        "🛑 Stopping after the current attempt...".yellow()
                    );
                } else {
                    println!("\n{}", "👋 Thanks for playing! See you next time!".yellow());
                    std::process::exit(130);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{CallRequest, MockGameContract};
    use crate::error::FrontrunnerError;
    use crate::sequencer::SequencerState;
    use ethers::types::H256;

    #[test]
    fn test_automatic_plan_uses_configured_attempts() {
        let settings =
            crate::config::Settings::from_toml(&crate::config::tests::sample_toml("")).unwrap();
        let plan = GamePlan::automatic(&settings.game_settings);
        assert_eq!(plan.total_attempts, 10_000_000);
        assert_eq!(plan.interval_secs, 1.0);

        let params = plan.params(42, 200_000);
        assert_eq!(params.base_nonce, 42);
        assert_eq!(params.gas_limit, 200_000);
    }

    #[test]
    fn test_interrupt_only_cancels_armed_game() {
        let handler = InterruptHandler::new();
        assert!(!handler.interrupt());

        let token = CancellationToken::new();
        handler.arm(token.clone());
        assert!(handler.interrupt());
        assert!(token.is_cancelled());
        // Already cancelled: a second Ctrl-C falls through to exit
        assert!(!handler.interrupt());

        handler.disarm();
        assert!(!handler.interrupt());

        let next = CancellationToken::new();
        handler.arm(next.clone());
        assert!(!next.is_cancelled());
    }

    #[tokio::test]
    async fn test_play_runs_from_base_nonce() {
        let mut contract = MockGameContract::new();
        contract
            .expect_submit_frontrun()
            .times(2)
            .withf(|req: &CallRequest| req.gas_limit == 150_000 && (req.nonce == 7 || req.nonce == 8))
            .returning(|req| Ok(H256::from_low_u64_be(req.nonce)));

        let session = Session::new(&contract, Address::zero(), 150_000);
        let plan = GamePlan {
            total_attempts: 2,
            interval_secs: 0.01,
        };
        let interrupts = InterruptHandler::new();
        let summary = session.play(plan, 7, &interrupts).await.unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.state, SequencerState::Completed);
        // Disarmed once the game ends
        assert!(!interrupts.interrupt());
    }

    #[tokio::test]
    async fn test_interrupt_stops_play_after_current_attempt() {
        let interrupts = InterruptHandler::new();
        let during_game = interrupts.clone();

        let mut contract = MockGameContract::new();
        contract
            .expect_submit_frontrun()
            .times(1)
            .returning(move |req| {
                assert!(during_game.interrupt());
                Ok(H256::from_low_u64_be(req.nonce))
            });

        let session = Session::new(&contract, Address::zero(), 200_000);
        let plan = GamePlan {
            total_attempts: 3,
            interval_secs: 30.0,
        };
        let summary = session.play(plan, 0, &interrupts).await.unwrap();
        assert_eq!(summary.attempted(), 1);
        assert_eq!(summary.state, SequencerState::Cancelled);
    }

    #[tokio::test]
    async fn test_play_rejects_oversized_interval_before_submitting() {
        let mut contract = MockGameContract::new();
        contract.expect_submit_frontrun().times(0);

        let session = Session::new(&contract, Address::zero(), 200_000);
        let plan = GamePlan {
            total_attempts: 2,
            interval_secs: 1e20,
        };
        let result = session.play(plan, 0, &InterruptHandler::new()).await;
        assert!(matches!(result, Err(FrontrunnerError::Config(_))));
    }

    #[tokio::test]
    async fn test_show_score_tolerates_failure() {
        let mut contract = MockGameContract::new();
        contract
            .expect_get_score()
            .times(1)
            .returning(|_| Err(FrontrunnerError::Contract("execution reverted".to_string())));

        Session::new(&contract, Address::zero(), 200_000)
            .show_score()
            .await;
    }
}
