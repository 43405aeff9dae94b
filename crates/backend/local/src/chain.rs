//! In-memory [`ChainClient`] implementation.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use tokenrig_primitives::{
    ChainClient, ChainError, Deployment, ReadCall, TokenParams, TxOptions, WriteCall, WriteReceipt,
};

use crate::{
    InMemoryConfig,
    ledger::{Contract, Ledger, TokenState},
};

/// Endpoint reported by the in-memory chain.
pub const IN_MEMORY_ENDPOINT: &str = "memory://tokenrig";

/// A chain backend that lives entirely in process memory.
///
/// Each transaction is mined into its own block. The chain rejects every call
/// once [`ChainClient::shutdown`] has run.
#[derive(Debug)]
pub struct InMemoryChain {
    config: InMemoryConfig,
    ledger: Mutex<Ledger>,
    stopped: AtomicBool,
}

impl InMemoryChain {
    /// Create a new in-memory chain with `config.accounts` pre-funded accounts.
    pub fn new(config: InMemoryConfig) -> Self {
        let accounts = (0..config.accounts).map(Self::account).collect();
        let ledger = Ledger::new(accounts, config.gas_limit);
        tracing::debug!(accounts = config.accounts, gas_limit = config.gas_limit, "In-memory chain created");
        Self { config, ledger: Mutex::new(ledger), stopped: AtomicBool::new(false) }
    }

    /// Deterministic address of the account at `index`.
    #[must_use]
    pub fn account(index: u16) -> Address {
        let mut bytes = [0u8; 20];
        bytes[0] = 0xa0;
        bytes[16..].copy_from_slice(&(u32::from(index) + 1).to_be_bytes());
        Address::from(bytes)
    }

    /// Returns true once the chain has been shut down.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> Result<(), ChainError> {
        if self.is_stopped() {
            return Err(ChainError::Connection("in-memory chain has been shut down".to_string()));
        }
        Ok(())
    }

    async fn wait_for_mining(&self) -> Result<(), ChainError> {
        if !self.config.mining_delay.is_zero() {
            tokio::time::sleep(self.config.mining_delay).await;
        }
        self.ensure_running()
    }
}

impl Default for InMemoryChain {
    fn default() -> Self {
        Self::new(InMemoryConfig::default())
    }
}

#[async_trait]
impl ChainClient for InMemoryChain {
    fn endpoint(&self) -> &str {
        IN_MEMORY_ENDPOINT
    }

    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        self.ensure_running()?;
        Ok(self.ledger.lock().unwrap().accounts().to_vec())
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.ensure_running()?;
        Ok(self.ledger.lock().unwrap().head())
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ChainError> {
        self.ensure_running()?;
        Ok(self.ledger.lock().unwrap().code_at(&address))
    }

    async fn deploy_registry(&self, from: Address) -> Result<Address, ChainError> {
        self.ensure_running()?;
        self.wait_for_mining().await?;

        let (address, _, block_number) = self.ledger.lock().unwrap().deploy(from, Contract::Registry)?;
        tracing::debug!(%address, block_number, "Registry deployed");
        Ok(address)
    }

    async fn deploy_token(
        &self,
        params: &TokenParams,
        registry: Option<Address>,
        from: Address,
    ) -> Result<Deployment, ChainError> {
        self.ensure_running()?;
        if let Some(registry) = registry {
            if self.ledger.lock().unwrap().code_at(&registry).is_empty() {
                return Err(ChainError::Reverted(format!("registry {registry} has no code")));
            }
        }
        self.wait_for_mining().await?;

        let contract = Contract::Token(TokenState::new(params, from));
        let (address, tx_hash, block_number) = self.ledger.lock().unwrap().deploy(from, contract)?;
        tracing::debug!(%address, block_number, name = %params.name, "Token deployed");

        Ok(Deployment { address, deployer: from, tx_hash, block_number })
    }

    async fn read(
        &self,
        token: Address,
        call: &ReadCall,
        block: u64,
    ) -> Result<String, ChainError> {
        self.ensure_running()?;
        self.ledger.lock().unwrap().read(&token, call, block)
    }

    async fn write(
        &self,
        token: Address,
        call: &WriteCall,
        options: &TxOptions,
    ) -> Result<WriteReceipt, ChainError> {
        self.ensure_running()?;
        self.wait_for_mining().await?;

        let receipt = match call {
            WriteCall::OwnerMint { recipient, amount } => {
                self.ledger.lock().unwrap().owner_mint(&token, *recipient, *amount, options)?
            }
        };
        tracing::trace!(%call, block_number = receipt.block_number, "Write mined");
        Ok(receipt)
    }

    async fn shutdown(&mut self) -> Result<(), ChainError> {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!("In-memory chain shut down");
        }
        Ok(())
    }
}
