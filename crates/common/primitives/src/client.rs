//! Chain client trait.

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::{ChainError, Deployment, ReadCall, TokenParams, TxOptions, WriteCall, WriteReceipt};

/// Connection to a running chain backend.
///
/// Implementations:
/// - `AnvilBackend`: a spawned anvil process or an external node over HTTP/WS
/// - `InMemoryChain`: an in-process ledger with per-block snapshots
///
/// Every suspending method resolves only once the backend has answered; write
/// methods resolve once the transaction is mined.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// RPC endpoint of the backend.
    fn endpoint(&self) -> &str;

    /// Pre-funded accounts exposed by the backend.
    async fn accounts(&self) -> Result<Vec<Address>, ChainError>;

    /// Current head block number.
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Contract code at `address`, empty for accounts without code.
    async fn code_at(&self, address: Address) -> Result<Bytes, ChainError>;

    /// Deploys a naming registry from `from`. Blocks until mined.
    async fn deploy_registry(&self, from: Address) -> Result<Address, ChainError>;

    /// Deploys a token from `from`. Blocks until mined.
    ///
    /// When `registry` is set it is passed as the trailing constructor argument.
    async fn deploy_token(
        &self,
        params: &TokenParams,
        registry: Option<Address>,
        from: Address,
    ) -> Result<Deployment, ChainError>;

    /// Evaluates a read call against the state at `block`.
    async fn read(&self, token: Address, call: &ReadCall, block: u64)
    -> Result<String, ChainError>;

    /// Submits a write call. Blocks until mined.
    async fn write(
        &self,
        token: Address,
        call: &WriteCall,
        options: &TxOptions,
    ) -> Result<WriteReceipt, ChainError>;

    /// Terminates the backend and releases its listening port.
    ///
    /// Calling this more than once is a no-op.
    async fn shutdown(&mut self) -> Result<(), ChainError>;
}

/// A boxed chain client for dynamic dispatch.
pub type BoxedChainClient = Box<dyn ChainClient>;
