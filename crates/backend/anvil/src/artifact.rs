//! Compiled contract artifacts.
//!
//! Accepts the creation bytecode in the layouts emitted by common toolchains:
//!
//! - Truffle / Hardhat: `{"bytecode": "0x..."}`
//! - Foundry: `{"bytecode": {"object": "0x..."}}`
//! - solc standard JSON output: `{"evm": {"bytecode": {"object": "..."}}}`
//! - raw hex (`.bin` files), with or without a `0x` prefix

use std::path::Path;

use alloy::primitives::Bytes;
use serde::Deserialize;

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// IO error reading the file.
    #[error("failed to read artifact file: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("failed to parse artifact JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The artifact JSON carries no bytecode field.
    #[error("artifact has no bytecode")]
    MissingBytecode,

    /// The bytecode is not valid hex (for example, unlinked library placeholders).
    #[error("invalid bytecode hex: {0}")]
    Hex(String),

    /// The bytecode is empty (interfaces and abstract contracts).
    #[error("artifact bytecode is empty")]
    Empty,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

impl BytecodeField {
    fn into_hex(self) -> String {
        match self {
            Self::Hex(hex) | Self::Object { object: hex } => hex,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EvmSection {
    bytecode: BytecodeField,
}

#[derive(Debug, Deserialize)]
struct ArtifactJson {
    #[serde(default)]
    bytecode: Option<BytecodeField>,
    #[serde(default)]
    evm: Option<EvmSection>,
}

/// Creation bytecode of a compiled contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    /// Creation (init) bytecode, without constructor arguments.
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Load an artifact from a JSON or raw hex file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let contents = std::fs::read_to_string(path)?;
        if contents.trim_start().starts_with('{') {
            Self::from_json(&contents)
        } else {
            Self::from_hex(&contents)
        }
    }

    /// Parse an artifact from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or has no usable bytecode.
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: ArtifactJson = serde_json::from_str(json)?;
        let field = artifact
            .bytecode
            .or(artifact.evm.map(|evm| evm.bytecode))
            .ok_or(ArtifactError::MissingBytecode)?;
        Self::from_hex(&field.into_hex())
    }

    /// Parse an artifact from raw hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex is invalid or empty.
    pub fn from_hex(hex: &str) -> Result<Self, ArtifactError> {
        let bytecode: Bytes = hex.trim().parse().map_err(|e| ArtifactError::Hex(format!("{e}")))?;
        if bytecode.is_empty() {
            return Err(ArtifactError::Empty);
        }
        Ok(Self { bytecode })
    }
}

/// Artifacts the backend deploys from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    /// Token contract artifact.
    pub token: Option<ContractArtifact>,
    /// Naming registry artifact.
    pub registry: Option<ContractArtifact>,
}
