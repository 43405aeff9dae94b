#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/tokenrig/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod client;
pub use client::{BoxedChainClient, ChainClient};

mod config;
pub use config::{
    BackendConfig, DEFAULT_ACCOUNTS, DEFAULT_GAS_LIMIT, DEFAULT_HOST, DEFAULT_PORT, Transport,
};

mod error;
pub use error::ChainError;

mod token;
pub use token::{Deployment, ReadCall, TokenParams, TxOptions, WriteCall, WriteReceipt};

pub use alloy_primitives::{Address, B256, Bytes, U256};
