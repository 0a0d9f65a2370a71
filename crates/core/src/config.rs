//! Tree configuration
//!
//! Program constants (tree height, change-log buffer, canopy) are passed
//! around as a value instead of living in globals, so the engine can be
//! exercised in isolation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::NODE_LEN;

/// Height of the event tree (supports 2^20 leaves)
pub const DEFAULT_MAX_DEPTH: u32 = 20;

/// Number of concurrent changes the on-chain tree buffers
pub const DEFAULT_MAX_BUFFER_SIZE: u32 = 64;

/// Upper bound on `max_depth` accepted by `validate`
pub const MAX_SUPPORTED_DEPTH: u32 = 30;

/// Fixed header bytes of a concurrent tree account
const ACCOUNT_HEADER_LEN: u64 = 40;

/// Slack added on top of the computed account size
const ACCOUNT_PADDING: u64 = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_depth must be at least 1")]
    ZeroDepth,

    #[error("max_depth {0} exceeds supported maximum {}", MAX_SUPPORTED_DEPTH)]
    DepthTooLarge(u32),

    #[error("canopy_depth {canopy} exceeds max_depth {depth}")]
    CanopyTooDeep { canopy: u32, depth: u32 },
}

/// Shape and policy of a commitment tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum tree height; capacity is `2^max_depth` leaves
    pub max_depth: u32,
    /// Change-log buffer size of the on-chain account
    pub max_buffer_size: u32,
    /// Number of upper levels cached on-chain (0 = none)
    pub canopy_depth: u32,
    /// Refuse hashers that cannot be reproduced by the on-chain verifier
    pub require_circuit_friendly: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            canopy_depth: 0,
            require_circuit_friendly: false,
        }
    }
}

impl TreeConfig {
    /// Configuration for roots that will be published on-chain.
    pub fn production() -> Self {
        Self {
            require_circuit_friendly: true,
            ..Default::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Maximum number of leaves; saturates at `u64::MAX` for unvalidated depths.
    pub fn capacity(&self) -> u64 {
        1u64.checked_shl(self.max_depth).unwrap_or(u64::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(ConfigError::DepthTooLarge(self.max_depth));
        }
        if self.canopy_depth > self.max_depth {
            return Err(ConfigError::CanopyTooDeep {
                canopy: self.canopy_depth,
                depth: self.max_depth,
            });
        }
        Ok(())
    }

    /// Estimated byte size of the on-chain tree account.
    ///
    /// `header + nodes * 32 + buffer * 32 + canopy + padding`. This is an
    /// upper-bound estimate used for rent calculation, not the exact layout
    /// of the account-compression program. Saturates at `u64::MAX` for
    /// unvalidated depths.
    pub fn account_space(&self) -> u64 {
        let node = NODE_LEN as u64;
        let nodes = self.capacity().saturating_mul(2) - 1;
        let tree = node.saturating_mul(nodes).saturating_add(ACCOUNT_HEADER_LEN);
        let buffer = self.max_buffer_size as u64 * node;
        let canopy_nodes = 1u64
            .checked_shl(self.canopy_depth)
            .map_or(u64::MAX, |n| n - 1);
        let canopy = canopy_nodes.saturating_mul(node);
        tree.saturating_add(buffer)
            .saturating_add(canopy)
            .saturating_add(ACCOUNT_PADDING)
    }
}
