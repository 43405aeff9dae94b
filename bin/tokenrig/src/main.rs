//! Contract-interaction test harness binary.
//!
//! Runs the built-in token scenarios, each against a freshly started backend,
//! and exits non-zero if any scenario fails.
//!
//! # Backends
//!
//! - **Anvil** (default): spawns anvil and deploys from compiled artifacts
//! - **External**: connects to a running node at `--rpc-url`
//! - **In-memory**: in-process ledger, no anvil or artifacts needed

use std::{path::Path, str::FromStr, time::Duration};

use clap::Parser;
use eyre::{Result, WrapErr, bail, eyre};
use tokenrig_anvil::{Artifacts, ContractArtifact};
use tokenrig_cli::{BackendMode, TokenrigCli, init_tracing, wait_for_ctrlc};
use tokenrig_harness::{
    BackendKind, HarnessConfig, MetadataScenario, MintScenario, NamingDependency, Suite,
};
use tokenrig_primitives::{Address, BackendConfig, Transport};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TokenrigCli::parse();
    init_tracing(cli.verbosity);

    let config = harness_config(&cli)?;
    let mut suite = Suite::new(config);
    if cli.scenario.metadata() {
        suite = suite.with_scenario(MetadataScenario::default());
    }
    if cli.scenario.mint() {
        suite = suite.with_scenario(MintScenario::default());
    }
    tracing::info!(backend = %cli.backend, scenarios = suite.len(), "Running suite");

    let report = tokio::select! {
        report = suite.run() => report,
        res = wait_for_ctrlc() => {
            res?;
            bail!("Interrupted");
        }
    };

    println!("{report}");
    if !report.passed() {
        bail!("{} of {} scenarios failed", report.failures(), report.outcomes.len());
    }
    Ok(())
}

/// Builds the harness configuration from CLI arguments.
fn harness_config(cli: &TokenrigCli) -> Result<HarnessConfig> {
    let backend = BackendConfig {
        host: cli.host.clone(),
        port: (!cli.ephemeral_port).then_some(cli.port),
        transport: if cli.ws { Transport::Ws } else { Transport::Http },
        gas_limit: cli.gas_limit,
        accounts: cli.accounts,
        startup_timeout: Duration::from_secs(cli.startup_timeout_secs),
    };

    let kind = match cli.backend {
        BackendMode::Anvil => BackendKind::Anvil { binary: cli.anvil_path.clone() },
        BackendMode::External => {
            let url = cli
                .rpc_url
                .clone()
                .ok_or_else(|| eyre!("--rpc-url is required for the external backend"))?;
            BackendKind::External { url }
        }
        BackendMode::InMemory => {
            BackendKind::InMemory { mining_delay: Duration::from_millis(cli.mining_delay_ms) }
        }
    };

    let naming = match cli.registry.as_deref() {
        Some(address) => NamingDependency::Existing(
            Address::from_str(address)
                .wrap_err_with(|| format!("Invalid registry address: {address}"))?,
        ),
        None => NamingDependency::Deploy,
    };

    let artifacts = Artifacts {
        token: load_artifact(cli.token_artifact.as_deref())?,
        registry: load_artifact(cli.registry_artifact.as_deref())?,
    };
    if artifacts.token.is_none() && cli.backend != BackendMode::InMemory {
        tracing::warn!("No token artifact given; deployments will fail");
    }

    Ok(HarnessConfig::builder()
        .backend(backend)
        .kind(kind)
        .artifacts(artifacts)
        .naming(naming)
        .deploy_timeout(Duration::from_secs(cli.deploy_timeout_secs))
        .write_timeout(Duration::from_secs(cli.write_timeout_secs))
        .default_gas(cli.mint_gas)
        .verbose(cli.observe)
        .build())
}

fn load_artifact(path: Option<&Path>) -> Result<Option<ContractArtifact>> {
    path.map(|path| {
        ContractArtifact::from_file(path)
            .wrap_err_with(|| format!("Failed to load artifact {}", path.display()))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_config_from_cli() {
        let cli = TokenrigCli::parse_from([
            "tokenrig",
            "--backend",
            "in-memory",
            "--mining-delay-ms",
            "25",
            "--ephemeral-port",
            "--observe",
        ]);
        let config = harness_config(&cli).unwrap();

        assert_eq!(config.kind, BackendKind::InMemory { mining_delay: Duration::from_millis(25) });
        assert_eq!(config.backend.port, None);
        assert_eq!(config.naming, NamingDependency::Deploy);
        assert!(config.verbose);
    }

    #[test]
    fn existing_registry_is_parsed() {
        let registry = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
        let cli = TokenrigCli::parse_from(["tokenrig", "--registry", registry, "--ws"]);
        let config = harness_config(&cli).unwrap();

        assert_eq!(config.naming, NamingDependency::Existing(Address::from_str(registry).unwrap()));
        assert_eq!(config.backend.transport, Transport::Ws);
        assert_eq!(config.backend.port, Some(8546));
    }

    #[test]
    fn invalid_registry_is_rejected() {
        let cli = TokenrigCli::parse_from(["tokenrig", "--registry", "not-an-address"]);
        assert!(harness_config(&cli).is_err());
    }

    #[test]
    fn missing_artifact_file_is_rejected() {
        let cli = TokenrigCli::parse_from([
            "tokenrig",
            "--token-artifact",
            "/nonexistent/tokenrig/Token.json",
        ]);
        assert!(harness_config(&cli).is_err());
    }
}
