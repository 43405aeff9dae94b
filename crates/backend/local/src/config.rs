//! Configuration for the in-memory chain.

use std::time::Duration;

use tokenrig_primitives::{BackendConfig, DEFAULT_ACCOUNTS, DEFAULT_GAS_LIMIT};

/// Configuration for an [`InMemoryChain`](crate::InMemoryChain).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryConfig {
    /// Number of pre-funded accounts.
    /// Default: 10
    pub accounts: u16,

    /// Block gas limit ceiling.
    /// Default: 5,800,000
    pub gas_limit: u64,

    /// Artificial delay before each transaction is mined.
    ///
    /// Zero mines instantly. Non-zero values let callers exercise
    /// their timeout handling.
    /// Default: 0
    pub mining_delay: Duration,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self { accounts: DEFAULT_ACCOUNTS, gas_limit: DEFAULT_GAS_LIMIT, mining_delay: Duration::ZERO }
    }
}

impl InMemoryConfig {
    /// Derives an in-memory configuration from backend connection parameters.
    #[must_use]
    pub const fn from_backend(backend: &BackendConfig, mining_delay: Duration) -> Self {
        Self { accounts: backend.accounts, gas_limit: backend.gas_limit, mining_delay }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_config_default() {
        let config = InMemoryConfig::default();
        assert_eq!(config.accounts, 10);
        assert_eq!(config.gas_limit, 5_800_000);
        assert_eq!(config.mining_delay, Duration::ZERO);
    }

    #[test]
    fn in_memory_config_from_backend() {
        let backend = BackendConfig { accounts: 3, gas_limit: 1_000_000, ..Default::default() };
        let config = InMemoryConfig::from_backend(&backend, Duration::from_millis(5));
        assert_eq!(config.accounts, 3);
        assert_eq!(config.gas_limit, 1_000_000);
        assert_eq!(config.mining_delay, Duration::from_millis(5));
    }
}
