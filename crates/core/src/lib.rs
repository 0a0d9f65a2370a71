//! cPOP Core
//!
//! Types shared by the commitment engine and its callers: the 32-byte node
//! shape, the claim record behind each leaf, and tree configuration.

mod config;
mod types;

pub use config::{
    ConfigError, TreeConfig, DEFAULT_MAX_BUFFER_SIZE, DEFAULT_MAX_DEPTH, MAX_SUPPORTED_DEPTH,
};
pub use types::*;
