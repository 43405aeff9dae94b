#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/tokenrig/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod chain;
pub use chain::{IN_MEMORY_ENDPOINT, InMemoryChain};

mod config;
pub use config::InMemoryConfig;

mod ledger;
pub use ledger::{DEPLOY_GAS, MINT_GAS, REGISTRY_DEPLOY_GAS};
