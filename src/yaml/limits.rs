//! Resource limits for YAML loading.
//!
//! Anchors and aliases let a few bytes of YAML describe an exponentially
//! large tree, so every alias expansion is charged against a node budget.
//!
//! - Input size: rejected before parsing
//! - Nesting depth: sequences and mappings counted together
//! - Node budget: scalars and collections, including alias expansions

/// Resource limits for loading a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum input size in bytes
    pub max_input_size: u64,
    /// Maximum nesting depth for sequences and mappings
    pub max_nesting_depth: u64,
    /// Maximum number of nodes after alias expansion
    pub max_nodes: u64,
}

impl Limits {
    /// Limits suitable for configuration files in a build pipeline.
    pub const fn standard() -> Self {
        Self {
            max_input_size: 64 * 1024 * 1024, // 64 MiB
            max_nesting_depth: 512,
            max_nodes: 4_000_000,
        }
    }

    /// Whether an input of `len` bytes may be parsed.
    pub fn allows_input(&self, len: usize) -> bool {
        (len as u64) <= self.max_input_size
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::standard()
    }
}
