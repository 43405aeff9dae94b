//! Test harness implementation.

use std::{future::Future, sync::Arc, time::Duration};

use tokenrig_anvil::AnvilBackend;
use tokenrig_local::{InMemoryChain, InMemoryConfig};
use tokenrig_primitives::{
    Address, B256, BoxedChainClient, ChainClient, ChainError, Deployment, ReadCall, TokenParams,
    TxOptions, U256, WriteCall, WriteReceipt,
};

use crate::{
    BackendKind, HarnessConfig, HarnessError, HarnessEvent, HarnessObserver, HarnessState,
    LoggingObserver, NamingDependency,
};

/// A deployed token contract instance.
///
/// Created once per test group and cloned read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHandle {
    /// Contract address.
    pub address: Address,
    /// Deploying account. Owner of the token.
    pub deployer: Address,
    /// Deployment transaction hash.
    pub tx_hash: B256,
    /// Block the deployment was mined in.
    pub block_number: u64,
    /// Constructor parameters.
    pub params: TokenParams,
}

impl TokenHandle {
    fn new(deployment: Deployment, params: TokenParams) -> Self {
        Self {
            address: deployment.address,
            deployer: deployment.deployer,
            tx_hash: deployment.tx_hash,
            block_number: deployment.block_number,
            params,
        }
    }
}

/// A decoded read result and the block it was evaluated at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// The read call.
    pub call: ReadCall,
    /// Decoded value. Numbers are rendered in base 10.
    pub value: String,
    /// Block the read was evaluated at.
    pub block_number: u64,
}

/// Contract-interaction test harness.
///
/// The harness owns one backend session and drives it through
/// [`HarnessState`]: start the backend, optionally resolve the naming
/// registry, deploy the token, then issue reads and writes.
///
/// - Writes take `&mut self`, so at most one is in flight and each resolves
///   once mined.
/// - Every suspending call is bounded by the configured timeout.
/// - Any failure before the token is deployed tears the backend down.
///
/// When dropped without [`stop`](Self::stop), the backend is released.
pub struct Harness {
    config: HarnessConfig,
    state: HarnessState,
    client: Option<BoxedChainClient>,
    accounts: Vec<Address>,
    registry: Option<Address>,
    observer: Arc<dyn HarnessObserver>,
}

impl Harness {
    /// Creates a harness that has not started its backend yet.
    pub fn new(config: HarnessConfig) -> Self {
        let observer = Arc::new(LoggingObserver::new(config.verbose));
        Self {
            config,
            state: HarnessState::NotStarted,
            client: None,
            accounts: Vec::new(),
            registry: None,
            observer,
        }
    }

    /// Creates a harness that drives an already constructed client.
    ///
    /// [`start_backend`](Self::start_backend) adopts `client` instead of
    /// starting the backend named by `config.kind`.
    pub fn with_client(config: HarnessConfig, client: BoxedChainClient) -> Self {
        let mut harness = Self::new(config);
        harness.client = Some(client);
        harness
    }

    /// Replaces the event observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn HarnessObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Creates a harness and starts its backend.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Startup`] if the backend cannot be started.
    pub async fn spawn(config: HarnessConfig) -> Result<Self, HarnessError> {
        let mut harness = Self::new(config);
        harness.start_backend().await?;
        Ok(harness)
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> HarnessState {
        self.state
    }

    /// Harness configuration.
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// The backend's pre-funded accounts. Empty until the backend runs.
    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    /// The pre-funded account at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoSuchAccount`] if `index` is out of range.
    pub fn account(&self, index: usize) -> Result<Address, HarnessError> {
        self.accounts
            .get(index)
            .copied()
            .ok_or(HarnessError::NoSuchAccount { index, available: self.accounts.len() })
    }

    /// Resolved naming registry, if any.
    pub const fn registry(&self) -> Option<Address> {
        self.registry
    }

    /// RPC endpoint of the running backend.
    pub fn endpoint(&self) -> Option<&str> {
        self.client.as_deref().map(|client| client.endpoint())
    }

    /// Starts the backend and waits until it answers RPC.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Startup`] if the port is taken, the process
    /// cannot be spawned, readiness is not reached in time, or the backend
    /// exposes no accounts. The harness is stopped on failure.
    pub async fn start_backend(&mut self) -> Result<(), HarnessError> {
        self.ensure_state("start backend", &[HarnessState::NotStarted])?;
        tracing::info!(backend = %self.config.kind, "Starting backend");

        let client = match self.client.take() {
            Some(client) => client,
            None => match self.connect_backend().await {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!(error = %e, "Backend failed to start");
                    self.transition(HarnessState::Stopped);
                    return Err(HarnessError::Startup(e));
                }
            },
        };
        let client = self.client.insert(client);

        let accounts = match bounded(self.config.backend.startup_timeout, client.accounts()).await {
            Ok(accounts) if accounts.is_empty() => {
                Err(ChainError::Rpc("backend exposes no accounts".to_string()))
            }
            other => other,
        };
        let accounts = match accounts {
            Ok(accounts) => accounts,
            Err(e) => return Err(self.abort(HarnessError::Startup(e)).await),
        };

        self.accounts = accounts;
        let endpoint = self.endpoint().unwrap_or_default().to_string();
        self.observer
            .on_event(&HarnessEvent::BackendStarted { endpoint, accounts: self.accounts.len() });
        self.transition(HarnessState::BackendRunning);
        Ok(())
    }

    /// Deploys or verifies the naming registry, per `config.naming`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Dependency`] if the registry cannot be deployed
    /// or the configured address holds no code. The harness is stopped on
    /// failure.
    pub async fn resolve_naming_dependency(&mut self) -> Result<Address, HarnessError> {
        self.ensure_state("resolve naming dependency", &[HarnessState::BackendRunning])?;
        let client = self.client()?;

        let resolved = match self.config.naming {
            NamingDependency::Deploy => {
                let from = self.accounts[0];
                bounded(self.config.deploy_timeout, client.deploy_registry(from)).await
            }
            NamingDependency::Existing(registry) => {
                match bounded(self.config.read_timeout, client.code_at(registry)).await {
                    Ok(code) if code.is_empty() => Err(ChainError::NoCode(registry)),
                    Ok(_) => Ok(registry),
                    Err(e) => Err(e),
                }
            }
        };

        match resolved {
            Ok(registry) => {
                self.registry = Some(registry);
                self.observer.on_event(&HarnessEvent::DependencyResolved { registry });
                self.transition(HarnessState::DependencyResolved);
                Ok(registry)
            }
            Err(e) => Err(self.abort(HarnessError::Dependency(e)).await),
        }
    }

    /// Deploys the token contract and waits until it is mined.
    ///
    /// The sender is `params.sender`, or the first account. A resolved
    /// registry is passed as the trailing constructor argument.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Deployment`] if the sender is not a backend
    /// account, the deployment reverts or times out, or no code is found at
    /// the deployed address. The harness is stopped on failure.
    pub async fn deploy_token(&mut self, params: TokenParams) -> Result<TokenHandle, HarnessError> {
        self.ensure_state(
            "deploy token",
            &[HarnessState::BackendRunning, HarnessState::DependencyResolved],
        )?;

        match self.deploy(&params).await {
            Ok(deployment) => {
                let token = TokenHandle::new(deployment, params);
                self.observer.on_event(&HarnessEvent::Deployed(token.clone()));
                self.transition(HarnessState::ContractDeployed);
                Ok(token)
            }
            Err(e) => Err(self.abort(HarnessError::Deployment(e)).await),
        }
    }

    async fn deploy(&self, params: &TokenParams) -> Result<Deployment, ChainError> {
        let Some(client) = self.client.as_deref() else {
            return Err(ChainError::Connection("backend is not running".to_string()));
        };
        let sender = params.sender.unwrap_or(self.accounts[0]);
        if !self.accounts.contains(&sender) {
            return Err(ChainError::UnknownAccount(sender));
        }

        tracing::debug!(name = %params.name, %sender, registry = ?self.registry, "Deploying token");
        let deployment = bounded(
            self.config.deploy_timeout,
            client.deploy_token(params, self.registry, sender),
        )
        .await?;

        if deployment.address.is_zero() {
            return Err(ChainError::MissingAddress);
        }
        let code = bounded(self.config.read_timeout, client.code_at(deployment.address)).await?;
        if code.is_empty() {
            return Err(ChainError::NoCode(deployment.address));
        }
        Ok(deployment)
    }

    /// Reads `call` at the current head.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Execution`] if the call fails or
    /// [`HarnessError::Timeout`] if it exceeds the read timeout.
    pub async fn read(
        &self,
        token: &TokenHandle,
        call: ReadCall,
    ) -> Result<Observation, HarnessError> {
        self.ensure_state("read", &[HarnessState::ContractDeployed])?;
        let block = bounded(self.config.read_timeout, self.client()?.block_number())
            .await
            .map_err(|e| call_error("eth_blockNumber", e))?;
        self.read_at(token, call, block).await
    }

    /// Reads `call` as of `block`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Execution`] if the call fails or
    /// [`HarnessError::Timeout`] if it exceeds the read timeout.
    pub async fn read_at(
        &self,
        token: &TokenHandle,
        call: ReadCall,
        block: u64,
    ) -> Result<Observation, HarnessError> {
        self.ensure_state("read", &[HarnessState::ContractDeployed])?;
        let value =
            bounded(self.config.read_timeout, self.client()?.read(token.address, &call, block))
                .await
                .map_err(|e| call_error(call.method(), e))?;

        let observation = Observation { call, value, block_number: block };
        self.observer.on_event(&HarnessEvent::Observed(observation.clone()));
        Ok(observation)
    }

    /// Reads `call` and checks the decoded value.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Assertion`] on mismatch, or any error of
    /// [`read`](Self::read).
    pub async fn expect(
        &self,
        token: &TokenHandle,
        call: ReadCall,
        expected: impl AsRef<str>,
    ) -> Result<Observation, HarnessError> {
        let observation = self.read(token, call).await?;
        let expected = expected.as_ref();
        if observation.value != expected {
            return Err(HarnessError::Assertion {
                call: call.to_string(),
                expected: expected.to_string(),
                actual: observation.value,
            });
        }
        Ok(observation)
    }

    /// Sends `call` and waits until it is mined.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Execution`] if the transaction reverts or is
    /// rejected, or [`HarnessError::Timeout`] if it is not mined within the
    /// write timeout.
    pub async fn write(
        &mut self,
        token: &TokenHandle,
        call: WriteCall,
        options: TxOptions,
    ) -> Result<WriteReceipt, HarnessError> {
        self.ensure_state("write", &[HarnessState::ContractDeployed])?;
        tracing::debug!(%call, from = %options.from, gas = options.gas, "Sending write");

        let receipt = bounded(
            self.config.write_timeout,
            self.client()?.write(token.address, &call, &options),
        )
        .await
        .map_err(|e| call_error(call.method(), e))?;

        self.observer.on_event(&HarnessEvent::Mined { call, receipt });
        Ok(receipt)
    }

    /// Mints `amount` to `recipient` from the token's deployer, using the
    /// configured default gas.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub async fn owner_mint(
        &mut self,
        token: &TokenHandle,
        recipient: Address,
        amount: U256,
    ) -> Result<WriteReceipt, HarnessError> {
        let options = TxOptions { gas: self.config.default_gas, from: token.deployer };
        self.write(token, WriteCall::OwnerMint { recipient, amount }, options).await
    }

    /// Stops the backend and releases its port.
    ///
    /// Valid from every state and idempotent. Shutdown failures are logged
    /// and otherwise ignored.
    pub async fn stop(&mut self) {
        if self.state.is_stopped() {
            return;
        }
        self.teardown().await;
    }

    async fn connect_backend(&self) -> Result<BoxedChainClient, ChainError> {
        let backend = &self.config.backend;
        let artifacts = self.config.artifacts.clone();
        let client: BoxedChainClient = match &self.config.kind {
            BackendKind::Anvil { binary } => {
                Box::new(AnvilBackend::spawn(backend, binary.as_deref(), artifacts).await?)
            }
            BackendKind::External { url } => {
                Box::new(AnvilBackend::connect(url, backend, artifacts).await?)
            }
            BackendKind::InMemory { mining_delay } => {
                Box::new(InMemoryChain::new(InMemoryConfig::from_backend(backend, *mining_delay)))
            }
        };
        Ok(client)
    }

    fn client(&self) -> Result<&dyn ChainClient, HarnessError> {
        self.client
            .as_deref()
            .ok_or(HarnessError::InvalidState { operation: "reach backend", state: self.state })
    }

    fn ensure_state(
        &self,
        operation: &'static str,
        allowed: &[HarnessState],
    ) -> Result<(), HarnessError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(HarnessError::InvalidState { operation, state: self.state })
        }
    }

    fn transition(&mut self, to: HarnessState) {
        let from = self.state;
        if from != to {
            self.state = to;
            self.observer.on_event(&HarnessEvent::StateChanged { from, to });
        }
    }

    /// Tears the backend down and hands back `err`.
    async fn abort(&mut self, err: HarnessError) -> HarnessError {
        tracing::warn!(error = %err, state = %self.state, "Aborting harness");
        self.teardown().await;
        err
    }

    async fn teardown(&mut self) {
        if let Some(mut client) = self.client.take() {
            if let Err(e) = client.shutdown().await {
                tracing::warn!(error = %e, "Backend shutdown failed");
            }
            tracing::info!("Backend stopped");
        }
        self.transition(HarnessState::Stopped);
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if self.client.take().is_some() && self.state.is_running() {
            tracing::warn!(state = %self.state, "Harness dropped without stop; releasing backend");
        }
    }
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("backend", &self.config.kind)
            .field("state", &self.state)
            .field("endpoint", &self.endpoint())
            .field("accounts", &self.accounts.len())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Bounds `fut` by `after`, mapping expiry to [`ChainError::Timeout`].
async fn bounded<T>(
    after: Duration,
    fut: impl Future<Output = Result<T, ChainError>>,
) -> Result<T, ChainError> {
    tokio::time::timeout(after, fut).await.map_err(|_| ChainError::Timeout(after))?
}

fn call_error(method: &'static str, err: ChainError) -> HarnessError {
    match err {
        ChainError::Timeout(after) => HarnessError::Timeout { operation: method.to_string(), after },
        source => HarnessError::Execution { method, source },
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::RecordingObserver;

    fn params() -> TokenParams {
        TokenParams::new("Reference Token", "XRT", 18)
    }

    fn in_memory() -> Harness {
        Harness::new(HarnessConfig::in_memory())
    }

    #[tokio::test]
    async fn lifecycle_transitions_are_observed() {
        let observer = Arc::new(RecordingObserver::default());
        let mut harness = in_memory().with_observer(observer.clone());

        harness.start_backend().await.unwrap();
        harness.resolve_naming_dependency().await.unwrap();
        harness.deploy_token(params()).await.unwrap();
        harness.stop().await;

        let transitions: Vec<_> = observer
            .events()
            .into_iter()
            .filter_map(|event| match event {
                HarnessEvent::StateChanged { to, .. } => Some(to),
                _ => None,
            })
            .collect();
        assert_eq!(
            transitions,
            vec![
                HarnessState::BackendRunning,
                HarnessState::DependencyResolved,
                HarnessState::ContractDeployed,
                HarnessState::Stopped,
            ]
        );
    }

    #[tokio::test]
    async fn deploy_before_start_is_invalid() {
        let mut harness = in_memory();
        let err = harness.deploy_token(params()).await.unwrap_err();
        assert_eq!(
            err,
            HarnessError::InvalidState { operation: "deploy token", state: HarnessState::NotStarted }
        );
        assert_eq!(harness.state(), HarnessState::NotStarted);
    }

    #[tokio::test]
    async fn start_twice_is_invalid() {
        let mut harness = in_memory();
        harness.start_backend().await.unwrap();
        let err = harness.start_backend().await.unwrap_err();
        assert!(matches!(err, HarnessError::InvalidState { state: HarnessState::BackendRunning, .. }));
        assert_eq!(harness.state(), HarnessState::BackendRunning);
    }

    #[tokio::test]
    async fn reads_require_a_deployed_contract() {
        let mut harness = in_memory();
        harness.start_backend().await.unwrap();

        let token = TokenHandle {
            address: Address::repeat_byte(0x01),
            deployer: harness.account(0).unwrap(),
            tx_hash: B256::ZERO,
            block_number: 0,
            params: params(),
        };
        let err = harness.read(&token, ReadCall::Name).await.unwrap_err();
        assert!(matches!(err, HarnessError::InvalidState { operation: "read", .. }));
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_terminal() {
        let mut harness = in_memory();
        harness.stop().await;
        assert_eq!(harness.state(), HarnessState::Stopped);
        harness.stop().await;

        let err = harness.start_backend().await.unwrap_err();
        assert_eq!(
            err,
            HarnessError::InvalidState { operation: "start backend", state: HarnessState::Stopped }
        );
    }

    #[tokio::test]
    async fn stop_after_abort_is_silent() {
        let observer = Arc::new(RecordingObserver::default());
        let mut harness = in_memory().with_observer(observer.clone());
        harness.start_backend().await.unwrap();

        let stranger = Address::repeat_byte(0xee);
        harness.deploy_token(params().with_sender(stranger)).await.unwrap_err();
        let events = observer.events().len();

        harness.stop().await;
        assert_eq!(observer.events().len(), events);
        assert!(harness.state().is_stopped());
    }

    #[tokio::test]
    async fn unknown_sender_aborts_deployment() {
        let mut harness = in_memory();
        harness.start_backend().await.unwrap();

        let stranger = Address::repeat_byte(0xee);
        let err = harness.deploy_token(params().with_sender(stranger)).await.unwrap_err();
        assert_eq!(err, HarnessError::Deployment(ChainError::UnknownAccount(stranger)));
        assert_eq!(harness.state(), HarnessState::Stopped);
        assert!(harness.endpoint().is_none());
    }

    #[tokio::test]
    async fn sender_override_owns_the_token() {
        let mut harness = in_memory();
        harness.start_backend().await.unwrap();
        let sender = harness.account(3).unwrap();

        let token = harness.deploy_token(params().with_sender(sender)).await.unwrap();
        assert_eq!(token.deployer, sender);
    }

    #[tokio::test]
    async fn existing_registry_without_code_fails() {
        let missing = Address::repeat_byte(0x42);
        let config =
            HarnessConfig { naming: NamingDependency::Existing(missing), ..HarnessConfig::in_memory() };
        let mut harness = Harness::new(config);
        harness.start_backend().await.unwrap();

        let err = harness.resolve_naming_dependency().await.unwrap_err();
        assert_eq!(err, HarnessError::Dependency(ChainError::NoCode(missing)));
        assert_eq!(harness.state(), HarnessState::Stopped);
    }

    #[tokio::test]
    async fn empty_account_set_fails_startup() {
        let config = HarnessConfig::in_memory();
        let chain = InMemoryChain::new(InMemoryConfig { accounts: 0, ..Default::default() });
        let mut harness = Harness::with_client(config, Box::new(chain));

        let err = harness.start_backend().await.unwrap_err();
        assert!(err.is_startup());
        assert_eq!(harness.state(), HarnessState::Stopped);
    }

    #[rstest]
    #[case(0, true)]
    #[case(9, true)]
    #[case(10, false)]
    #[tokio::test]
    async fn account_lookup(#[case] index: usize, #[case] present: bool) {
        let mut harness = in_memory();
        harness.start_backend().await.unwrap();

        match harness.account(index) {
            Ok(account) => {
                assert!(present);
                assert_eq!(account, InMemoryChain::account(index as u16));
            }
            Err(err) => {
                assert!(!present);
                assert_eq!(err, HarnessError::NoSuchAccount { index, available: 10 });
            }
        }
    }

    #[test]
    fn timeouts_map_to_timeout_errors() {
        let after = Duration::from_secs(6);
        assert_eq!(
            call_error("ownerMint", ChainError::Timeout(after)),
            HarnessError::Timeout { operation: "ownerMint".to_string(), after }
        );
        assert!(matches!(
            call_error("ownerMint", ChainError::Reverted("nope".to_string())),
            HarnessError::Execution { method: "ownerMint", .. }
        ));
    }

    #[test]
    fn harness_debug() {
        let debug = format!("{:?}", in_memory());
        assert!(debug.contains("Harness"));
        assert!(debug.contains("NotStarted"));
    }
}
