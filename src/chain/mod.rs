//! Chain module - connectivity to the remote ledger
//!
//! This module provides:
//! - Multi-RPC provider management with failover for reads
//! - The signing client used for contract calls
//! - Account reads (balance, nonce) and fee data

pub mod provider;

pub use provider::ChainProvider;

use crate::config::Settings;
use crate::error::{FrontrunnerError, FrontrunnerResult};

use ethers::prelude::*;
use ethers::signers::{LocalWallet, Signer};
use std::sync::Arc;
use tracing::info;

/// Signing client used to send contract calls
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Gateway to the chain for one wallet
pub struct ChainGateway {
    /// Read provider with failover
    provider: ChainProvider,
    /// Wallet bound to the connected chain
    wallet: LocalWallet,
    /// Chain ID reported by the node (or configured)
    chain_id: u64,
}

impl ChainGateway {
    /// Connect to the configured RPC endpoints and bind the wallet.
    ///
    /// Fails with a connectivity error when no endpoint answers.
    pub async fn connect(settings: &Settings) -> FrontrunnerResult<Self> {
        let provider = ChainProvider::new(&settings.rpc_urls())?;

        let wallet = settings
            .wallet()
            .map_err(|e| FrontrunnerError::Wallet(e.to_string()))?;

        let remote_chain_id = provider.get_chain_id().await?;
        let chain_id = match settings.api_settings.chain_id {
            Some(configured) if configured != remote_chain_id => {
                return Err(FrontrunnerError::Config(format!(
                    "Configured chain id {} does not match node chain id {}",
                    configured, remote_chain_id
                )));
            }
            _ => remote_chain_id,
        };

        info!(
            "Connected to chain {} via {} RPC endpoint(s)",
            chain_id,
            provider.provider_count()
        );

        Ok(Self {
            provider,
            wallet: wallet.with_chain_id(chain_id),
            chain_id,
        })
    }

    /// Wallet address
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Connected chain ID
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Wallet balance in wei
    pub async fn balance(&self) -> FrontrunnerResult<U256> {
        self.provider.get_balance(self.address()).await
    }

    /// Current gas price in wei
    pub async fn gas_price(&self) -> FrontrunnerResult<U256> {
        self.provider.get_gas_price().await
    }

    /// Next nonce for the wallet as seen by the chain
    pub async fn next_nonce(&self) -> FrontrunnerResult<u64> {
        self.provider.get_transaction_count(self.address()).await
    }

    /// Build the signing client on the active provider
    pub fn signer_client(&self) -> Arc<SignerClient> {
        Arc::new(SignerMiddleware::new(
            self.provider.http().clone(),
            self.wallet.clone(),
        ))
    }
}

/// Worst-case cost of one attempt in wei
pub fn attempt_cost(gas_limit: u64, gas_price: U256) -> U256 {
    U256::from(gas_limit) * gas_price
}

/// Check the wallet balance against the threshold (in ether)
pub fn ensure_balance(balance: U256, threshold_eth: f64) -> FrontrunnerResult<()> {
    let threshold = ethers::utils::parse_ether(threshold_eth)
        .map_err(|e| FrontrunnerError::Config(format!("Invalid balance threshold: {}", e)))?;

    if balance < threshold {
        return Err(FrontrunnerError::InsufficientBalance {
            have: ethers::utils::format_ether(balance),
            need: ethers::utils::format_ether(threshold),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_cost() {
        let gas_price = U256::from(50_000_000_000u64); // 50 gwei
        assert_eq!(
            attempt_cost(200_000, gas_price),
            U256::from(10_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_balance_below_threshold() {
        let balance = ethers::utils::parse_ether("0.0005").unwrap();
        let err = ensure_balance(balance, 0.001).unwrap_err();
        assert!(matches!(err, FrontrunnerError::InsufficientBalance { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_balance_at_threshold() {
        let balance = ethers::utils::parse_ether("0.001").unwrap();
        assert!(ensure_balance(balance, 0.001).is_ok());
    }
}
