//! Harness lifecycle states.

/// Lifecycle state of a [`Harness`](crate::Harness).
///
/// ```text
/// NotStarted -> BackendRunning -> DependencyResolved -> ContractDeployed -> Stopped
///                      \___________________________________/
/// ```
///
/// Dependency resolution is optional. [`Stopped`](Self::Stopped) is reachable
/// from every state and is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HarnessState {
    /// No backend has been started.
    #[default]
    NotStarted,
    /// The backend answers RPC and exposes its accounts.
    BackendRunning,
    /// The naming registry is deployed or verified.
    DependencyResolved,
    /// The token contract is deployed. Reads and writes are allowed.
    ContractDeployed,
    /// The backend has been torn down.
    Stopped,
}

impl HarnessState {
    /// Returns true while a backend session is held.
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::BackendRunning | Self::DependencyResolved | Self::ContractDeployed)
    }

    /// Returns true once the harness has been stopped.
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl std::fmt::Display for HarnessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not started",
            Self::BackendRunning => "backend running",
            Self::DependencyResolved => "dependency resolved",
            Self::ContractDeployed => "contract deployed",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(HarnessState::NotStarted, false)]
    #[case(HarnessState::BackendRunning, true)]
    #[case(HarnessState::DependencyResolved, true)]
    #[case(HarnessState::ContractDeployed, true)]
    #[case(HarnessState::Stopped, false)]
    fn running_states(#[case] state: HarnessState, #[case] running: bool) {
        assert_eq!(state.is_running(), running);
    }

    #[test]
    fn default_is_not_started() {
        assert_eq!(HarnessState::default(), HarnessState::NotStarted);
        assert_eq!(HarnessState::ContractDeployed.to_string(), "contract deployed");
    }
}
