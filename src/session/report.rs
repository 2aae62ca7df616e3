//! Console rendering of startup facts and run progress

use crate::contract::Score;
use crate::sequencer::{AttemptOutcome, ProgressEvent, SequencerState};

use colored::Colorize;
use tokio::sync::mpsc;

/// Lines to print for a progress event
pub fn render_event(event: &ProgressEvent) -> Vec<String> {
    match event {
        ProgressEvent::Attempt {
            attempt,
            total,
            outcome,
            ..
        } => {
            let result = match outcome {
                AttemptOutcome::Confirmed(tx_hash) => {
                    format!("✅ Transaction sent! Hash: {:?}", tx_hash)
                        .green()
                        .to_string()
                }
                AttemptOutcome::Failed(message) => {
                    format!("❌ Transaction failed! Error: {}", message)
                        .red()
                        .to_string()
                }
                AttemptOutcome::Pending | AttemptOutcome::Submitted(_) => {
                    format!("⏳ Attempt {} still in flight", attempt)
                        .yellow()
                        .to_string()
                }
            };
            vec![result, format!("🎮 Progress: {}/{}", attempt, total)]
        }
        ProgressEvent::Finished(summary) => {
            let headline = match summary.state {
                SequencerState::Cancelled => format!(
                    "🛑 Game stopped after {} attempts. Returning to main menu...",
                    summary.attempted()
                ),
                _ => "🏁 Game complete! Returning to main menu...".to_string(),
            };
            vec![
                headline.yellow().to_string(),
                format!(
                    "📊 {} confirmed | {} failed",
                    summary.succeeded, summary.failed
                ),
            ]
        }
    }
}

/// Print progress events until the sequencer drops its sender
pub async fn print_progress(mut events: mpsc::UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = events.recv().await {
        for line in render_event(&event) {
            println!("{}", line);
        }
    }
}

/// Game stats line for the start of a session
pub fn describe_score(score: &Score) -> String {
    if score.is_new_player() {
        "🎮 Welcome new player! Good luck on your first game!".to_string()
    } else {
        format!("🏆 Game Stats: {} Wins | {} Losses", score.wins, score.losses)
    }
}

pub fn print_banner() {
    let rule = "=".repeat(60);
    println!("{}", rule.cyan());
    println!("{}", "MONAD FRONTRUNNER".cyan().bold());
    println!("{}", rule.cyan());
}
