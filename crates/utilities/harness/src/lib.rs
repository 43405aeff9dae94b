#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/tokenrig/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::{BackendKind, HarnessConfig, HarnessConfigBuilder, NamingDependency};

mod error;
pub use error::HarnessError;

mod harness;
pub use harness::{Harness, Observation, TokenHandle};

mod observer;
pub use observer::{HarnessEvent, HarnessObserver, LoggingObserver, RecordingObserver};

mod scenario;
pub use scenario::{MetadataScenario, MintScenario, Scenario, ScenarioReport};

mod state;
pub use state::HarnessState;

mod suite;
pub use suite::{ScenarioOutcome, Suite, SuiteReport};
