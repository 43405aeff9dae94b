//! Chain backend error types.

use std::time::Duration;

use alloy_primitives::Address;
use thiserror::Error;

/// Errors returned by a [`ChainClient`](crate::ChainClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The backend process could not be spawned.
    #[error("Failed to spawn backend: {0}")]
    Spawn(String),

    /// The requested listening port is already bound.
    #[error("Port {port} on {host} is unavailable")]
    PortUnavailable {
        /// Listening host.
        host: String,
        /// Listening port.
        port: u16,
    },

    /// The backend did not accept connections.
    #[error("Failed to connect to backend: {0}")]
    Connection(String),

    /// Generic RPC failure.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The transaction or call reverted.
    #[error("Execution reverted: {0}")]
    Reverted(String),

    /// The sender is not one of the backend's accounts.
    #[error("Unknown account: {0}")]
    UnknownAccount(Address),

    /// Return data could not be decoded.
    #[error("Failed to decode return data: {0}")]
    Decode(String),

    /// No contract code at the given address.
    #[error("No code at {0}")]
    NoCode(Address),

    /// A deployment receipt carried no contract address.
    #[error("Deployment receipt has no contract address")]
    MissingAddress,

    /// A contract artifact required for the operation is not configured.
    #[error("Missing {0} artifact")]
    MissingArtifact(&'static str),

    /// A bounded wait elapsed.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl ChainError {
    /// Classifies an RPC error message into the appropriate variant.
    pub fn from_rpc_error(msg: &str) -> Self {
        let lower = msg.to_lowercase();

        if lower.contains("revert") || lower.contains("out of gas") {
            Self::Reverted(msg.to_string())
        } else if lower.contains("connection refused")
            || lower.contains("error sending request")
            || lower.contains("connection reset")
            || lower.contains("backend connection task has stopped")
        {
            Self::Connection(msg.to_string())
        } else {
            Self::Rpc(msg.to_string())
        }
    }

    /// Returns true if the error means the transaction or call reverted.
    pub const fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted(_))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("execution reverted: caller is not the owner", true)]
    #[case("Transaction reverted without a reason", true)]
    #[case("out of gas", true)]
    #[case("nonce too low", false)]
    #[case("connection refused", false)]
    fn classify_revert(#[case] msg: &str, #[case] is_revert: bool) {
        assert_eq!(ChainError::from_rpc_error(msg).is_revert(), is_revert);
    }

    #[test]
    fn classify_connection() {
        let err = ChainError::from_rpc_error("error sending request for url (http://127.0.0.1:1/)");
        assert!(matches!(err, ChainError::Connection(_)));
    }

    #[test]
    fn classify_fallback_rpc() {
        let err = ChainError::from_rpc_error("header not found");
        assert_eq!(err, ChainError::Rpc("header not found".to_string()));
    }

    #[test]
    fn port_unavailable_display() {
        let err = ChainError::PortUnavailable { host: "127.0.0.1".into(), port: 8546 };
        assert_eq!(err.to_string(), "Port 8546 on 127.0.0.1 is unavailable");
    }

    #[test]
    fn timeout_display() {
        let err = ChainError::Timeout(Duration::from_secs(20));
        assert_eq!(err.to_string(), "Timed out after 20s");
    }

    #[test]
    fn missing_artifact_display() {
        assert_eq!(ChainError::MissingArtifact("token").to_string(), "Missing token artifact");
    }
}
