use std::path::PathBuf;

use clap::{ArgAction, Parser, builder::FalseyValueParser};

use crate::{BackendMode, ScenarioFilter};

/// Tokenrig CLI arguments.
///
/// Runs the built-in token scenarios against a fresh backend per scenario
/// and exits non-zero if any fails.
///
/// The anvil backend needs a compiled token artifact (`--token-artifact`);
/// the metadata scenario additionally needs a registry artifact unless
/// `--registry` names an existing one.
#[derive(Parser, Debug, Clone)]
#[command(name = "tokenrig", about = "Contract-interaction test harness", version)]
pub struct TokenrigCli {
    /// Backend to run against
    #[arg(short = 'b', long, default_value = "anvil")]
    pub backend: BackendMode,

    /// RPC URL of an external node (for the external backend)
    #[arg(short = 'r', long, env = "TOKENRIG_RPC_URL", required_if_eq("backend", "external"))]
    pub rpc_url: Option<String>,

    /// Host the spawned backend listens on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port the spawned backend listens on
    #[arg(short = 'p', long, default_value = "8546", conflicts_with = "ephemeral_port")]
    pub port: u16,

    /// Let anvil pick a free port
    #[arg(long)]
    pub ephemeral_port: bool,

    /// Connect over WebSocket instead of HTTP
    #[arg(long)]
    pub ws: bool,

    /// Block gas limit of the spawned backend
    #[arg(long, default_value = "5800000")]
    pub gas_limit: u64,

    /// Number of pre-funded accounts
    #[arg(long, default_value = "10")]
    pub accounts: u16,

    /// Path to the anvil executable
    #[arg(long, env = "ANVIL_PATH")]
    pub anvil_path: Option<PathBuf>,

    /// Compiled token artifact (JSON or raw hex)
    #[arg(long, env = "TOKENRIG_TOKEN_ARTIFACT")]
    pub token_artifact: Option<PathBuf>,

    /// Compiled naming registry artifact (JSON or raw hex)
    #[arg(long, env = "TOKENRIG_REGISTRY_ARTIFACT")]
    pub registry_artifact: Option<PathBuf>,

    /// Address of an already deployed naming registry
    #[arg(long)]
    pub registry: Option<String>,

    /// Scenarios to run
    #[arg(short = 's', long, default_value = "all")]
    pub scenario: ScenarioFilter,

    /// Seconds to wait for the backend to answer
    #[arg(long, default_value = "10")]
    pub startup_timeout_secs: u64,

    /// Seconds to wait for a deployment to be mined
    #[arg(long, default_value = "20")]
    pub deploy_timeout_secs: u64,

    /// Seconds to wait for a write to be mined
    #[arg(long, default_value = "6")]
    pub write_timeout_secs: u64,

    /// Gas supplied to each mint
    #[arg(long, default_value = "300000")]
    pub mint_gas: u64,

    /// Milliseconds the in-memory backend waits before mining
    #[arg(long, default_value = "0")]
    pub mining_delay_ms: u64,

    /// Log observations, addresses and receipts at info level
    #[arg(long, env = "TOKENRIG_VERBOSE", value_parser = FalseyValueParser::new())]
    pub observe: bool,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbosity: u8,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        TokenrigCli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = TokenrigCli::parse_from(["tokenrig"]);
        assert_eq!(cli.backend, BackendMode::Anvil);
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.port, 8546);
        assert_eq!(cli.gas_limit, 5_800_000);
        assert_eq!(cli.accounts, 10);
        assert_eq!(cli.deploy_timeout_secs, 20);
        assert_eq!(cli.write_timeout_secs, 6);
        assert_eq!(cli.scenario, ScenarioFilter::All);
        assert!(!cli.ws);
        assert_eq!(cli.verbosity, 0);
    }

    #[test]
    fn in_memory_with_verbosity() {
        let cli = TokenrigCli::parse_from([
            "tokenrig",
            "--backend",
            "in-memory",
            "--scenario",
            "mint",
            "--mining-delay-ms",
            "50",
            "-vv",
        ]);
        assert_eq!(cli.backend, BackendMode::InMemory);
        assert_eq!(cli.scenario, ScenarioFilter::Mint);
        assert_eq!(cli.mining_delay_ms, 50);
        assert_eq!(cli.verbosity, 2);
    }

    #[test]
    fn external_requires_rpc_url() {
        let err = TokenrigCli::try_parse_from(["tokenrig", "--backend", "external"]);
        // TOKENRIG_RPC_URL may be set in the environment running the tests.
        if std::env::var_os("TOKENRIG_RPC_URL").is_none() {
            assert!(err.is_err());
        }

        let cli = TokenrigCli::try_parse_from([
            "tokenrig",
            "--backend",
            "external",
            "--rpc-url",
            "ws://127.0.0.1:9546",
        ])
        .unwrap();
        assert_eq!(cli.rpc_url.as_deref(), Some("ws://127.0.0.1:9546"));
    }

    #[test]
    fn observe_reads_verbose_env() {
        let command = TokenrigCli::command();
        let observe = command.get_arguments().find(|a| a.get_id() == "observe").unwrap();
        assert_eq!(observe.get_env(), Some(std::ffi::OsStr::new("TOKENRIG_VERBOSE")));
    }

    #[test]
    fn ephemeral_port_conflicts_with_port() {
        let res = TokenrigCli::try_parse_from(["tokenrig", "--port", "9000", "--ephemeral-port"]);
        assert!(res.is_err());
    }
}
