//! Configuration types for relmem.
//!
//! `MemoryConfig` represents the `config.toml` in the data directory that
//! tunes confidence defaults, decay thresholds and the sweep period.

use serde::{Deserialize, Serialize};

/// Tunables for the memory graph. All fields have defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Confidence of new relationships and facts without an override.
    #[serde(default = "default_confidence")]
    pub default_confidence: f64,

    /// Decayed confidence below this marks a record stale by decay.
    #[serde(default = "default_decay_stale_threshold")]
    pub decay_stale_threshold: f64,

    /// Decayed confidence below this gets a relationship hard-deleted by the sweep.
    #[serde(default = "default_prune_threshold")]
    pub prune_threshold: f64,

    /// Seconds between periodic decay sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Maximum number of recent interests rendered into the context string.
    #[serde(default = "default_recent_interest_limit")]
    pub recent_interest_limit: usize,

    /// Confidence added when a record is re-observed.
    #[serde(default = "default_confirm_boost")]
    pub confirm_boost: f64,
}

fn default_confidence() -> f64 {
    0.8
}

fn default_decay_stale_threshold() -> f64 {
    0.3
}

fn default_prune_threshold() -> f64 {
    0.1
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_recent_interest_limit() -> usize {
    5
}

fn default_confirm_boost() -> f64 {
    0.1
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            default_confidence: default_confidence(),
            decay_stale_threshold: default_decay_stale_threshold(),
            prune_threshold: default_prune_threshold(),
            sweep_interval_secs: default_sweep_interval_secs(),
            recent_interest_limit: default_recent_interest_limit(),
            confirm_boost: default_confirm_boost(),
        }
    }
}
