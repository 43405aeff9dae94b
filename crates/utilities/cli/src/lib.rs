#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/tokenrig/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

/// Backend selection.
///
/// The [`BackendMode`] enum selects between spawning anvil, connecting to an
/// external node, and the in-process ledger.
mod backend_mode;
pub use backend_mode::BackendMode;

/// Scenario selection.
mod scenario_filter;
pub use scenario_filter::ScenarioFilter;

/// Tokenrig CLI argument parsing.
///
/// The [`TokenrigCli`] struct holds backend connection flags, artifact paths,
/// timeouts, and logging options for the `tokenrig` binary.
mod tokenrig_cli;
pub use tokenrig_cli::TokenrigCli;

/// Tracing initialization utilities.
///
/// The [`init_tracing`] function configures the tracing subscriber with a verbosity-based
/// log level and respects the `RUST_LOG` environment variable.
mod tracing_init;
pub use crate::tracing_init::{init_tracing, verbosity_level};

/// Ctrl+C signal handling.
mod ctrlc;
pub use crate::ctrlc::wait_for_ctrlc;
