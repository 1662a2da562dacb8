//! Aggregate statistics over the memory graph.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub entity_count: usize,
    pub relationship_count: usize,
    pub fact_count: usize,
    /// Relationships past their absolute-age cutoff.
    pub stale_relationship_count: usize,
}
