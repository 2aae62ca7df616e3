//! Frontrunner game contract binding
//!
//! The ABI is loaded at runtime from configuration, so the binding goes
//! through `ethers::contract::Contract` rather than generated types.

use crate::chain::SignerClient;
use crate::error::{FrontrunnerError, FrontrunnerResult};

use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::contract::Contract;
use ethers::providers::{JsonRpcClient, PendingTransaction};
use ethers::types::{Address, H256, U256, U64};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Parameters for one `frontrun()` submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRequest {
    pub gas_limit: u64,
    pub nonce: u64,
}

/// Player statistics as reported by `getScore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub played: U256,
    pub wins: U256,
    pub losses: U256,
}

impl Score {
    /// Whether the player has any recorded games
    pub fn is_new_player(&self) -> bool {
        self.wins.is_zero() && self.losses.is_zero()
    }
}

/// Operations the game exposes to the bot
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameContract: Send + Sync {
    /// Send `frontrun()` and wait for confirmation, yielding the tx hash.
    /// Failures after the transaction was accepted by the node carry its hash.
    async fn submit_frontrun(&self, request: CallRequest) -> FrontrunnerResult<H256>;

    /// Read the score of a player
    async fn get_score(&self, player: Address) -> FrontrunnerResult<Score>;
}

/// `GameContract` backed by a deployed contract
pub struct FrontrunnerContract {
    contract: Contract<SignerClient>,
    confirmations: usize,
    confirmation_timeout: Option<Duration>,
}

impl FrontrunnerContract {
    pub fn new(address: Address, abi: Abi, client: Arc<SignerClient>) -> Self {
        Self {
            contract: Contract::new(address, abi, client),
            confirmations: 1,
            confirmation_timeout: None,
        }
    }

    /// Number of blocks to wait for before an attempt counts as confirmed
    pub fn with_confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Upper bound on the confirmation wait of a single attempt
    pub fn with_confirmation_timeout(mut self, confirmation_timeout: Option<Duration>) -> Self {
        self.confirmation_timeout = confirmation_timeout;
        self
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    async fn send_and_confirm(&self, request: CallRequest) -> FrontrunnerResult<H256> {
        let call = self
            .contract
            .method::<_, ()>("frontrun", ())
            .map_err(|e| FrontrunnerError::Contract(e.to_string()))?
            .gas(request.gas_limit)
            .nonce(request.nonce);

        let pending = call
            .send()
            .await
            .map_err(|e| FrontrunnerError::Transaction(e.to_string()))?;
        debug!("Submitted {:?} with nonce {}", pending.tx_hash(), request.nonce);

        settle(pending, self.confirmations, self.confirmation_timeout).await
    }
}

/// Wait until a sent transaction is mined and map its receipt to an outcome
async fn settle<P: JsonRpcClient>(
    pending: PendingTransaction<'_, P>,
    confirmations: usize,
    limit: Option<Duration>,
) -> FrontrunnerResult<H256> {
    let tx_hash = pending.tx_hash();
    let confirmed = pending.confirmations(confirmations);

    let receipt = match limit {
        Some(limit) => timeout(limit, confirmed)
            .await
            .map_err(|_| FrontrunnerError::Timeout {
                operation: format!("confirmation of {:?}", tx_hash),
                tx_hash: Some(tx_hash),
            })?,
        None => confirmed.await,
    }
    .map_err(|e| FrontrunnerError::Transaction(e.to_string()))?
    .ok_or(FrontrunnerError::Dropped { tx_hash })?;

    if receipt.status != Some(U64::from(1)) {
        return Err(FrontrunnerError::Reverted { tx_hash });
    }

    Ok(tx_hash)
}

#[async_trait]
impl GameContract for FrontrunnerContract {
    async fn submit_frontrun(&self, request: CallRequest) -> FrontrunnerResult<H256> {
        self.send_and_confirm(request).await
    }

    async fn get_score(&self, player: Address) -> FrontrunnerResult<Score> {
        let (played, wins, losses) = self
            .contract
            .method::<_, (U256, U256, U256)>("getScore", player)
            .map_err(|e| FrontrunnerError::Contract(e.to_string()))?
            .call()
            .await
            .map_err(|e| FrontrunnerError::Contract(e.to_string()))?;

        Ok(Score {
            played,
            wins,
            losses,
        })
    }
}
