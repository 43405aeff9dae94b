//! Backend connection parameters.

use std::time::Duration;

/// Default listening host for a spawned backend.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listening port for a spawned backend.
pub const DEFAULT_PORT: u16 = 8546;

/// Default block gas limit ceiling.
pub const DEFAULT_GAS_LIMIT: u64 = 5_800_000;

/// Default number of pre-funded accounts.
pub const DEFAULT_ACCOUNTS: u16 = 10;

/// RPC transport used to talk to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Plain HTTP request/response.
    #[default]
    Http,
    /// Streaming duplex over WebSocket.
    Ws,
}

impl Transport {
    /// URL scheme for this transport.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Ws => "ws",
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Connection parameters for an ephemeral chain backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Host the backend listens on.
    pub host: String,

    /// Port the backend listens on.
    ///
    /// `None` lets the backend pick a free port.
    /// Default: 8546
    pub port: Option<u16>,

    /// Transport used for the RPC connection.
    pub transport: Transport,

    /// Block gas limit ceiling.
    /// Default: 5,800,000
    pub gas_limit: u64,

    /// Number of pre-funded accounts.
    /// Default: 10
    pub accounts: u16,

    /// How long to wait for the backend to accept connections.
    /// Default: 10s
    pub startup_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: Some(DEFAULT_PORT),
            transport: Transport::Http,
            gas_limit: DEFAULT_GAS_LIMIT,
            accounts: DEFAULT_ACCOUNTS,
            startup_timeout: Duration::from_secs(10),
        }
    }
}

impl BackendConfig {
    /// Builds the RPC endpoint URL for the given port.
    #[must_use]
    pub fn endpoint(&self, port: u16) -> String {
        format!("{}://{}:{}", self.transport.scheme(), self.host, port)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn backend_config_default() {
        let config = BackendConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, Some(8546));
        assert_eq!(config.transport, Transport::Http);
        assert_eq!(config.gas_limit, 5_800_000);
        assert_eq!(config.accounts, 10);
        assert_eq!(config.startup_timeout, Duration::from_secs(10));
    }

    #[rstest]
    #[case(Transport::Http, 8546, "http://127.0.0.1:8546")]
    #[case(Transport::Ws, 8546, "ws://127.0.0.1:8546")]
    #[case(Transport::Ws, 9000, "ws://127.0.0.1:9000")]
    fn backend_config_endpoint(
        #[case] transport: Transport,
        #[case] port: u16,
        #[case] expected: &str,
    ) {
        let config = BackendConfig { transport, ..Default::default() };
        assert_eq!(config.endpoint(port), expected);
    }

    #[test]
    fn transport_display() {
        assert_eq!(Transport::Http.to_string(), "http");
        assert_eq!(Transport::Ws.to_string(), "ws");
    }
}
