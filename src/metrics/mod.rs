//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Attempt outcomes and latency
//! - Runs by terminal state
//! - Wallet balance and gas price

use crate::error::{FrontrunnerError, FrontrunnerResult};
use crate::sequencer::SequencerState;

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    pub static ref ATTEMPTS_CONFIRMED: Counter = register_counter!(
        "frontrunner_attempts_confirmed_total",
        "Total frontrun attempts confirmed on chain"
    ).unwrap();

    pub static ref ATTEMPTS_FAILED: Counter = register_counter!(
        "frontrunner_attempts_failed_total",
        "Total frontrun attempts that failed"
    ).unwrap();

    pub static ref ATTEMPT_LATENCY: Histogram = register_histogram!(
        "frontrunner_attempt_latency_seconds",
        "Time from submission to terminal outcome",
        vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]
    ).unwrap();

    pub static ref RUNS: CounterVec = register_counter_vec!(
        "frontrunner_runs_total",
        "Sequencer runs by terminal state",
        &["state"]
    ).unwrap();

    pub static ref WALLET_BALANCE: Gauge = register_gauge!(
        "frontrunner_wallet_balance_mon",
        "Wallet balance in MON"
    ).unwrap();

    pub static ref GAS_PRICE: Gauge = register_gauge!(
        "frontrunner_gas_price_gwei",
        "Gas price in gwei at session start"
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> FrontrunnerResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| FrontrunnerError::Internal(format!("Metrics bind failed: {}", e)))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| FrontrunnerError::Internal(format!("Metrics server failed: {}", e)))?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, StatusCode> {
    render().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Encode all registered metrics in the text exposition format
pub fn render() -> FrontrunnerResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| FrontrunnerError::Internal(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| FrontrunnerError::Internal(e.to_string()))
}

// Helper functions to record metrics

pub fn record_attempt_confirmed() {
    ATTEMPTS_CONFIRMED.inc();
}

pub fn record_attempt_failed() {
    ATTEMPTS_FAILED.inc();
}

pub fn record_attempt_latency(latency_secs: f64) {
    ATTEMPT_LATENCY.observe(latency_secs);
}

pub fn record_run(state: SequencerState) {
    RUNS.with_label_values(&[&state.to_string()]).inc();
}

pub fn record_wallet_balance(balance: f64) {
    WALLET_BALANCE.set(balance);
}

pub fn record_gas_price(gwei: f64) {
    GAS_PRICE.set(gwei);
}
