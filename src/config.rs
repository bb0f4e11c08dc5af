//! Manager configuration (spec §6 "Configuration options").

use serde::{Deserialize, Serialize};

use crate::error::PddError;

/// Default ceiling on the number of node slots a manager will grow to: 2^24.
pub const DEFAULT_MAX_NUM_NODES: usize = 1 << 24;

/// Options controlling a [`crate::PddManager`](crate::manager::PddManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// All coefficient arithmetic happens in GF(2); `minus` is the identity
    /// and `mul` uses the optimised Karatsuba-style identity (spec §4.2).
    pub mod2_semantics: bool,
    /// Hard ceiling on the number of node slots. Exceeding it raises
    /// [`PddError::OutOfMemory`].
    pub max_num_nodes: usize,
    /// Skip GC inside `insert_node`; out-of-memory then triggers growth only.
    pub disable_gc: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            mod2_semantics: false,
            max_num_nodes: DEFAULT_MAX_NUM_NODES,
            disable_gc: false,
        }
    }
}

impl ManagerConfig {
    /// Parses a [`ManagerConfig`] from a TOML document, as produced by
    /// e.g. a `pdd.toml` file sitting next to a Gröbner-basis driver.
    /// Missing fields fall back to [`ManagerConfig::default`].
    pub fn from_toml_str(data: &str) -> Result<Self, PddError> {
        toml::from_str(data)
            .map_err(|e| PddError::InvariantViolation(format!("invalid manager config: {e}")))
    }
}
