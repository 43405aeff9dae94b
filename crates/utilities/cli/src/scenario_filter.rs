//! Scenario selection.

use clap::ValueEnum;

/// Which built-in scenarios to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ScenarioFilter {
    /// Every scenario (default).
    #[default]
    All,
    /// Token metadata checks only.
    Metadata,
    /// Owner mint checks only.
    Mint,
}

impl ScenarioFilter {
    /// Returns true if the metadata scenario is selected.
    pub const fn metadata(&self) -> bool {
        matches!(self, Self::All | Self::Metadata)
    }

    /// Returns true if the mint scenario is selected.
    pub const fn mint(&self) -> bool {
        matches!(self, Self::All | Self::Mint)
    }
}

impl std::fmt::Display for ScenarioFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Metadata => write!(f, "metadata"),
            Self::Mint => write!(f, "mint"),
        }
    }
}
