//! Backend selection for the harness.

use clap::ValueEnum;

/// Backend the harness runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum BackendMode {
    /// Spawn a local anvil process (default).
    #[default]
    Anvil,

    /// Connect to an already running node at `--rpc-url`.
    ///
    /// The node must sign for its own accounts.
    External,

    /// In-process ledger.
    ///
    /// Needs neither anvil nor compiled artifacts.
    InMemory,
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anvil => write!(f, "anvil"),
            Self::External => write!(f, "external"),
            Self::InMemory => write!(f, "in-memory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn backend_mode_default() {
        assert_eq!(BackendMode::default(), BackendMode::Anvil);
    }

    #[rstest]
    #[case(BackendMode::Anvil, "anvil")]
    #[case(BackendMode::External, "external")]
    #[case(BackendMode::InMemory, "in-memory")]
    fn backend_mode_display_parses_back(#[case] mode: BackendMode, #[case] name: &str) {
        assert_eq!(mode.to_string(), name);
        assert_eq!(BackendMode::from_str(name, false).unwrap(), mode);
    }
}
