#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/refcell/tokenrig/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod artifact;
pub use artifact::{ArtifactError, Artifacts, ContractArtifact};

mod backend;
pub use backend::AnvilBackend;

pub mod bindings;

// Re-export useful types from alloy for convenience
pub use alloy::primitives::Address;
