//! Chain provider with multi-RPC support and automatic failover

use crate::error::{FrontrunnerError, FrontrunnerResult};

use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Multi-provider wrapper with automatic failover for read calls
pub struct ChainProvider {
    /// HTTP providers (multiple for failover)
    http_providers: Vec<Provider<Http>>,
    /// Current active provider index
    current_provider: AtomicUsize,
}

impl ChainProvider {
    /// Create a new chain provider from RPC URLs in priority order
    pub fn new(rpc_urls: &[String]) -> FrontrunnerResult<Self> {
        let mut http_providers = Vec::new();

        for url in rpc_urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    let provider = provider.interval(Duration::from_millis(500));
                    http_providers.push(provider);
                    debug!("Added HTTP provider: {}", url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        if http_providers.is_empty() {
            return Err(FrontrunnerError::Connectivity(
                "No valid RPC providers".to_string(),
            ));
        }

        Ok(Self {
            http_providers,
            current_provider: AtomicUsize::new(0),
        })
    }

    /// Get the active HTTP provider
    pub fn http(&self) -> &Provider<Http> {
        let idx = self.current_provider.load(Ordering::Relaxed);
        &self.http_providers[idx % self.http_providers.len()]
    }

    /// Number of configured providers
    pub fn provider_count(&self) -> usize {
        self.http_providers.len()
    }

    /// Switch to next available provider
    pub fn failover(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.http_providers.len();
        self.current_provider.store(next, Ordering::Relaxed);
        if self.http_providers.len() > 1 {
            warn!("Failover to provider {}", next);
        }
    }

    /// Get chain ID, used as the connectivity check
    pub async fn get_chain_id(&self) -> FrontrunnerResult<u64> {
        let mut last_error = String::from("no providers");
        for _ in 0..self.http_providers.len() {
            match self.http().get_chainid().await {
                Ok(chain_id) => return Ok(chain_id.as_u64()),
                Err(e) => {
                    warn!("Failed to get chain id: {}", e);
                    last_error = e.to_string();
                    self.failover();
                }
            }
        }

        Err(FrontrunnerError::Connectivity(format!(
            "All providers failed: {}",
            last_error
        )))
    }

    /// Get account balance in wei
    pub async fn get_balance(&self, address: Address) -> FrontrunnerResult<U256> {
        for _ in 0..self.http_providers.len() {
            match self.http().get_balance(address, None).await {
                Ok(balance) => return Ok(balance),
                Err(e) => {
                    warn!("Failed to get balance for {:?}: {}", address, e);
                    self.failover();
                }
            }
        }

        Err(FrontrunnerError::Connectivity(
            "All providers failed to get balance".to_string(),
        ))
    }

    /// Get current gas price in wei
    pub async fn get_gas_price(&self) -> FrontrunnerResult<U256> {
        for _ in 0..self.http_providers.len() {
            match self.http().get_gas_price().await {
                Ok(price) => return Ok(price),
                Err(e) => {
                    warn!("Failed to get gas price: {}", e);
                    self.failover();
                }
            }
        }

        Err(FrontrunnerError::Connectivity(
            "All providers failed to get gas price".to_string(),
        ))
    }

    /// Get the account's transaction count (next nonce)
    pub async fn get_transaction_count(&self, address: Address) -> FrontrunnerResult<u64> {
        for _ in 0..self.http_providers.len() {
            match self.http().get_transaction_count(address, None).await {
                Ok(count) => return Ok(count.as_u64()),
                Err(e) => {
                    warn!("Failed to get transaction count for {:?}: {}", address, e);
                    self.failover();
                }
            }
        }

        Err(FrontrunnerError::Connectivity(
            "All providers failed to get transaction count".to_string(),
        ))
    }
}
