//! Anvil-backed chain client.

use std::{future::Future, path::Path, time::Duration};

use alloy::{
    eips::BlockId,
    network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
    node_bindings::{Anvil, AnvilInstance},
    primitives::{Address, B256, Bytes},
    providers::{Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    sol_types::SolCall,
};
use async_trait::async_trait;
use tokenrig_primitives::{
    BackendConfig, ChainClient, ChainError, Deployment, ReadCall, TokenParams, TxOptions,
    WriteCall, WriteReceipt,
};

use crate::{
    Artifacts, ContractArtifact,
    bindings::{self, INameRegistry},
};

/// Interval between readiness probes while waiting for the backend.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long shutdown waits for a spawned anvil to release its port.
const PORT_RELEASE_TIMEOUT: Duration = Duration::from_secs(3);

/// A boxed provider trait object for use with Anvil.
type BoxedProvider = Box<dyn Provider + Send + Sync>;

/// Chain client backed by anvil or any other node reachable over HTTP/WS.
///
/// When the backend was spawned by [`AnvilBackend::spawn`], shutting it down
/// (or dropping it) terminates the anvil process.
///
/// # Example
///
/// ```ignore
/// use tokenrig_anvil::{AnvilBackend, Artifacts};
/// use tokenrig_primitives::{BackendConfig, ChainClient};
///
/// let backend = AnvilBackend::spawn(&BackendConfig::default(), None, Artifacts::default()).await?;
/// println!("Anvil endpoint: {}", backend.endpoint());
/// ```
pub struct AnvilBackend {
    /// The running anvil instance, when spawned by us.
    anvil: Option<AnvilInstance>,
    /// Provider for the backend.
    provider: BoxedProvider,
    /// The endpoint URL.
    endpoint: String,
    /// Host the backend listens on.
    host: String,
    /// Contract artifacts to deploy from.
    artifacts: Artifacts,
    /// Gas limit used for deployments.
    deploy_gas: u64,
}

impl AnvilBackend {
    /// Spawn a new anvil instance and wait for it to accept connections.
    ///
    /// `binary` overrides the anvil executable; `None` resolves `anvil` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::PortUnavailable`] if a fixed port is already bound,
    /// [`ChainError::Spawn`] if anvil fails to start, or [`ChainError::Connection`]
    /// if it does not answer within `config.startup_timeout`.
    pub async fn spawn(
        config: &BackendConfig,
        binary: Option<&Path>,
        artifacts: Artifacts,
    ) -> Result<Self, ChainError> {
        tracing::info!(?config, "Spawning anvil");

        if let Some(port) = config.port {
            ensure_port_free(&config.host, port).await?;
        }

        let mut builder = match binary {
            Some(path) => Anvil::at(path),
            None => Anvil::new(),
        };
        if let Some(port) = config.port {
            builder = builder.port(port);
        }
        let anvil = builder
            .args([
                "--host".to_string(),
                config.host.clone(),
                "--gas-limit".to_string(),
                config.gas_limit.to_string(),
                "--accounts".to_string(),
                config.accounts.to_string(),
            ])
            .timeout(u64::try_from(config.startup_timeout.as_millis()).unwrap_or(u64::MAX))
            .try_spawn()
            .map_err(|e| ChainError::Spawn(e.to_string()))?;

        let endpoint = config.endpoint(anvil.port());
        tracing::info!(endpoint = %endpoint, "Anvil started");

        // Register every pre-funded key so writes can be sent from any account.
        let mut signers = anvil.keys().iter().map(|k| PrivateKeySigner::from(k.clone()));
        let first = signers
            .next()
            .ok_or_else(|| ChainError::Spawn("anvil exposed no accounts".to_string()))?;
        let mut wallet = EthereumWallet::from(first);
        for signer in signers {
            wallet.register_signer(signer);
        }

        let deadline = tokio::time::Instant::now() + config.startup_timeout;
        let provider = connect_until(
            &endpoint,
            deadline,
            ProviderBuilder::new().wallet(wallet).connect(&endpoint),
        )
        .await?;
        let chain_id = wait_ready(&provider, deadline).await?;
        tracing::debug!(chain_id, accounts = anvil.addresses().len(), "Anvil ready");

        Ok(Self {
            anvil: Some(anvil),
            provider: Box::new(provider),
            endpoint,
            host: config.host.clone(),
            artifacts,
            deploy_gas: config.gas_limit,
        })
    }

    /// Connect to an already-running node at `url`.
    ///
    /// Writes rely on the node signing for the `from` account, as anvil and
    /// other development nodes do for their pre-funded accounts.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Connection`] if the node does not answer within
    /// `config.startup_timeout`.
    pub async fn connect(
        url: &str,
        config: &BackendConfig,
        artifacts: Artifacts,
    ) -> Result<Self, ChainError> {
        tracing::info!(url, transport = %config.transport, "Connecting to external backend");

        let deadline = tokio::time::Instant::now() + config.startup_timeout;
        let provider = connect_until(url, deadline, ProviderBuilder::new().connect(url)).await?;
        let chain_id = wait_ready(&provider, deadline).await?;
        tracing::debug!(chain_id, "External backend ready");

        Ok(Self {
            anvil: None,
            provider: Box::new(provider),
            endpoint: url.to_string(),
            host: config.host.clone(),
            artifacts,
            deploy_gas: config.gas_limit,
        })
    }

    /// Returns true if this backend owns a spawned anvil process.
    #[must_use]
    pub const fn is_spawned(&self) -> bool {
        self.anvil.is_some()
    }

    fn artifact<'a>(
        artifact: Option<&'a ContractArtifact>,
        kind: &'static str,
    ) -> Result<&'a ContractArtifact, ChainError> {
        artifact.ok_or(ChainError::MissingArtifact(kind))
    }

    /// Sends `tx` and waits for its receipt, failing on a reverted status.
    async fn send_and_confirm(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionReceipt, ChainError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::from_rpc_error(&e.to_string()))?;
        let tx_hash = *pending.tx_hash();
        tracing::trace!(%tx_hash, "Transaction sent");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::from_rpc_error(&e.to_string()))?;

        if !receipt.status() {
            return Err(ChainError::Reverted(format!("transaction {tx_hash} reverted")));
        }
        Ok(receipt)
    }

    async fn deploy_code(
        &self,
        code: Vec<u8>,
        from: Address,
    ) -> Result<(Address, B256, u64), ChainError> {
        let tx = TransactionRequest::default()
            .from(from)
            .with_deploy_code(Bytes::from(code))
            .gas_limit(self.deploy_gas);

        let receipt = self.send_and_confirm(tx).await?;
        let address = receipt.contract_address().ok_or(ChainError::MissingAddress)?;
        Ok((address, receipt.transaction_hash(), receipt.block_number().unwrap_or_default()))
    }
}

impl std::fmt::Debug for AnvilBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnvilBackend")
            .field("endpoint", &self.endpoint)
            .field("spawned", &self.anvil.is_some())
            .field("deploy_gas", &self.deploy_gas)
            .finish()
    }
}

#[async_trait]
impl ChainClient for AnvilBackend {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        self.provider.get_accounts().await.map_err(|e| ChainError::from_rpc_error(&e.to_string()))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider.get_block_number().await.map_err(|e| ChainError::from_rpc_error(&e.to_string()))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ChainError> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| ChainError::from_rpc_error(&e.to_string()))
    }

    async fn deploy_registry(&self, from: Address) -> Result<Address, ChainError> {
        let artifact = Self::artifact(self.artifacts.registry.as_ref(), "registry")?;
        let (address, _, block_number) = self.deploy_code(artifact.bytecode.to_vec(), from).await?;

        // The root node must answer through the registry interface.
        let probe = TransactionRequest::default()
            .to(address)
            .with_input(INameRegistry::ownerCall { node: B256::ZERO }.abi_encode());
        let output = self
            .provider
            .call(probe)
            .await
            .map_err(|e| ChainError::from_rpc_error(&e.to_string()))?;
        let root_owner = INameRegistry::ownerCall::abi_decode_returns(&output)
            .map_err(|e| ChainError::Decode(e.to_string()))?;

        tracing::debug!(%address, block_number, %root_owner, "Registry deployed");
        Ok(address)
    }

    async fn deploy_token(
        &self,
        params: &TokenParams,
        registry: Option<Address>,
        from: Address,
    ) -> Result<Deployment, ChainError> {
        let artifact = Self::artifact(self.artifacts.token.as_ref(), "token")?;
        let mut code = artifact.bytecode.to_vec();
        code.extend(bindings::encode_constructor(params, registry));

        let (address, tx_hash, block_number) = self.deploy_code(code, from).await?;
        tracing::debug!(%address, block_number, name = %params.name, "Token deployed");

        Ok(Deployment { address, deployer: from, tx_hash, block_number })
    }

    async fn read(
        &self,
        token: Address,
        call: &ReadCall,
        block: u64,
    ) -> Result<String, ChainError> {
        let tx = TransactionRequest::default().to(token).with_input(bindings::encode_read(call));
        let output = self
            .provider
            .call(tx)
            .block(BlockId::number(block))
            .await
            .map_err(|e| ChainError::from_rpc_error(&e.to_string()))?;
        bindings::decode_read(call, &output)
    }

    async fn write(
        &self,
        token: Address,
        call: &WriteCall,
        options: &TxOptions,
    ) -> Result<WriteReceipt, ChainError> {
        let tx = TransactionRequest::default()
            .to(token)
            .from(options.from)
            .gas_limit(options.gas)
            .with_input(bindings::encode_write(call));

        let receipt = self.send_and_confirm(tx).await?;
        Ok(WriteReceipt {
            tx_hash: receipt.transaction_hash(),
            block_number: receipt.block_number().unwrap_or_default(),
            gas_used: receipt.gas_used(),
        })
    }

    async fn shutdown(&mut self) -> Result<(), ChainError> {
        // Dropping the instance kills the anvil child process.
        if let Some(anvil) = self.anvil.take() {
            let port = anvil.port();
            drop(anvil);
            wait_port_released(&self.host, port).await;
            tracing::info!(port, "Anvil terminated");
        }
        Ok(())
    }
}

/// Fails with [`ChainError::PortUnavailable`] if `host:port` is already bound.
async fn ensure_port_free(host: &str, port: u16) -> Result<(), ChainError> {
    match tokio::net::TcpListener::bind((host, port)).await {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(host, port, error = %e, "Backend port unavailable");
            Err(ChainError::PortUnavailable { host: host.to_string(), port })
        }
    }
}

/// Waits until `host:port` can be bound again, giving up after [`PORT_RELEASE_TIMEOUT`].
async fn wait_port_released(host: &str, port: u16) {
    let deadline = tokio::time::Instant::now() + PORT_RELEASE_TIMEOUT;
    while tokio::net::TcpListener::bind((host, port)).await.is_err() {
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(host, port, "Anvil port still bound after shutdown");
            return;
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}

/// Establishes the transport to `url`, failing with [`ChainError::Connection`]
/// once `deadline` passes. A WebSocket handshake that never completes would
/// otherwise hang.
async fn connect_until<P, E: std::fmt::Display>(
    url: &str,
    deadline: tokio::time::Instant,
    connecting: impl Future<Output = Result<P, E>>,
) -> Result<P, ChainError> {
    match tokio::time::timeout_at(deadline, connecting).await {
        Ok(Ok(provider)) => Ok(provider),
        Ok(Err(e)) => Err(ChainError::Connection(e.to_string())),
        Err(_) => Err(ChainError::Connection(format!("no connection to {url} before deadline"))),
    }
}

/// Polls `eth_chainId` until the backend answers or `deadline` passes.
async fn wait_ready<P: Provider>(
    provider: &P,
    deadline: tokio::time::Instant,
) -> Result<u64, ChainError> {
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        let last_error = match tokio::time::timeout(remaining, provider.get_chain_id()).await {
            Ok(Ok(chain_id)) => return Ok(chain_id),
            Ok(Err(e)) => e.to_string(),
            Err(_) => "readiness probe timed out".to_string(),
        };

        if tokio::time::Instant::now() + READY_POLL_INTERVAL >= deadline {
            return Err(ChainError::Connection(format!("backend not ready: {last_error}")));
        }
        tracing::trace!(error = %last_error, "Backend not ready yet");
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}
