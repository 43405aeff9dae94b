//! Harness error types.

use std::time::Duration;

use thiserror::Error;
use tokenrig_primitives::ChainError;

use crate::HarnessState;

/// Errors surfaced by the [`Harness`](crate::Harness).
///
/// Every error aborts the current scenario. Nothing is retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HarnessError {
    /// The backend could not be started or reached.
    #[error("Backend startup failed: {0}")]
    Startup(#[source] ChainError),

    /// The naming registry could not be deployed or verified.
    #[error("Naming dependency unavailable: {0}")]
    Dependency(#[source] ChainError),

    /// The token contract could not be deployed.
    #[error("Deployment failed: {0}")]
    Deployment(#[source] ChainError),

    /// A contract call reverted or the backend rejected it.
    #[error("Call {method} failed: {source}")]
    Execution {
        /// Solidity method name.
        method: &'static str,
        /// Backend error.
        #[source]
        source: ChainError,
    },

    /// A call did not complete within its ceiling.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation that timed out.
        operation: String,
        /// Configured ceiling.
        after: Duration,
    },

    /// An observed value differed from the expected one.
    #[error("Assertion failed for {call}: expected {expected:?}, got {actual:?}")]
    Assertion {
        /// Rendered call, e.g. `balanceOf(0x..)`.
        call: String,
        /// Expected value.
        expected: String,
        /// Observed value.
        actual: String,
    },

    /// The operation is not valid in the harness's current state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the harness was in.
        state: HarnessState,
    },

    /// An account index beyond the backend's account set.
    #[error("Account {index} out of range ({available} available)")]
    NoSuchAccount {
        /// Requested index.
        index: usize,
        /// Size of the account set.
        available: usize,
    },
}

impl HarnessError {
    /// Returns true for the startup category.
    pub const fn is_startup(&self) -> bool {
        matches!(self, Self::Startup(_))
    }

    /// Returns true if the failure was a contract revert.
    pub const fn is_revert(&self) -> bool {
        match self {
            Self::Deployment(source) | Self::Execution { source, .. } => source.is_revert(),
            _ => false,
        }
    }
}
