//! Configuration for the test harness.

use std::{path::PathBuf, time::Duration};

use tokenrig_anvil::Artifacts;
use tokenrig_primitives::{Address, BackendConfig};

/// Which backend the harness starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Spawn a local anvil process.
    Anvil {
        /// Path to the anvil executable. `None` resolves `anvil` on `PATH`.
        binary: Option<PathBuf>,
    },
    /// Connect to an already running node.
    External {
        /// RPC endpoint of the node.
        url: String,
    },
    /// Run the in-process ledger.
    InMemory {
        /// Artificial delay before each transaction is mined.
        mining_delay: Duration,
    },
}

impl Default for BackendKind {
    fn default() -> Self {
        Self::Anvil { binary: None }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anvil { .. } => write!(f, "anvil"),
            Self::External { url } => write!(f, "external({url})"),
            Self::InMemory { .. } => write!(f, "in-memory"),
        }
    }
}

/// How the naming registry dependency is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamingDependency {
    /// Deploy a fresh registry from the registry artifact.
    #[default]
    Deploy,
    /// Use a registry already deployed at this address.
    Existing(Address),
}

/// Configuration for the test harness.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Backend connection parameters.
    pub backend: BackendConfig,

    /// Backend to start.
    /// Default: anvil resolved on `PATH`
    pub kind: BackendKind,

    /// Compiled artifacts for the token and registry contracts.
    ///
    /// Ignored by the in-memory backend.
    pub artifacts: Artifacts,

    /// How the naming registry is resolved.
    /// Default: deploy a fresh registry
    pub naming: NamingDependency,

    /// Ceiling on deployments, including the registry.
    /// Default: 20s
    pub deploy_timeout: Duration,

    /// Ceiling on a write being mined.
    /// Default: 6s
    pub write_timeout: Duration,

    /// Ceiling on a single read.
    /// Default: 6s
    pub read_timeout: Duration,

    /// Gas supplied by [`Harness::owner_mint`](crate::Harness::owner_mint).
    /// Default: 300,000
    pub default_gas: u64,

    /// Log observations, addresses and receipts at `info` instead of `debug`.
    /// Default: false
    pub verbose: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            kind: BackendKind::default(),
            artifacts: Artifacts::default(),
            naming: NamingDependency::default(),
            deploy_timeout: Duration::from_secs(20),
            write_timeout: Duration::from_secs(6),
            read_timeout: Duration::from_secs(6),
            default_gas: 300_000,
            verbose: false,
        }
    }
}

impl HarnessConfig {
    /// Creates a new builder for configuring a harness.
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::default()
    }

    /// Configuration for the in-memory backend with no mining delay.
    pub fn in_memory() -> Self {
        Self { kind: BackendKind::InMemory { mining_delay: Duration::ZERO }, ..Default::default() }
    }
}

/// Builder for [`HarnessConfig`].
#[derive(Debug, Clone, Default)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    /// Sets the backend connection parameters.
    pub fn backend(mut self, backend: BackendConfig) -> Self {
        self.config.backend = backend;
        self
    }

    /// Sets the backend kind.
    pub fn kind(mut self, kind: BackendKind) -> Self {
        self.config.kind = kind;
        self
    }

    /// Sets the contract artifacts.
    pub fn artifacts(mut self, artifacts: Artifacts) -> Self {
        self.config.artifacts = artifacts;
        self
    }

    /// Sets how the naming registry is resolved.
    pub const fn naming(mut self, naming: NamingDependency) -> Self {
        self.config.naming = naming;
        self
    }

    /// Sets the deployment timeout.
    pub const fn deploy_timeout(mut self, deploy_timeout: Duration) -> Self {
        self.config.deploy_timeout = deploy_timeout;
        self
    }

    /// Sets the write timeout.
    pub const fn write_timeout(mut self, write_timeout: Duration) -> Self {
        self.config.write_timeout = write_timeout;
        self
    }

    /// Sets the read timeout.
    pub const fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.config.read_timeout = read_timeout;
        self
    }

    /// Sets the gas used by convenience writes.
    pub const fn default_gas(mut self, default_gas: u64) -> Self {
        self.config.default_gas = default_gas;
        self
    }

    /// Enables verbose observation logging.
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> HarnessConfig {
        self.config
    }
}
