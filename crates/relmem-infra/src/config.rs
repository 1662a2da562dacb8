//! Configuration loader for relmem.
//!
//! Reads `config.toml` from the data directory (`~/.relmem/` in production)
//! and deserializes it into [`MemoryConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use relmem_types::config::MemoryConfig;

/// Name of the config file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Load memory configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`MemoryConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
/// - Values that make no sense (negative thresholds, a zero sweep period) are
///   clamped back to their defaults with a warning.
pub async fn load_memory_config(data_dir: &Path) -> MemoryConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return MemoryConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return MemoryConfig::default();
        }
    };

    match toml::from_str::<MemoryConfig>(&content) {
        Ok(config) => sanitize(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            MemoryConfig::default()
        }
    }
}

fn sanitize(mut config: MemoryConfig) -> MemoryConfig {
    let defaults = MemoryConfig::default();

    let unit_range = |v: f64| (0.0..=1.0).contains(&v);
    if !unit_range(config.default_confidence) {
        tracing::warn!(value = config.default_confidence, "default_confidence out of range, using default");
        config.default_confidence = defaults.default_confidence;
    }
    if !unit_range(config.decay_stale_threshold) {
        tracing::warn!(value = config.decay_stale_threshold, "decay_stale_threshold out of range, using default");
        config.decay_stale_threshold = defaults.decay_stale_threshold;
    }
    if !unit_range(config.prune_threshold) {
        tracing::warn!(value = config.prune_threshold, "prune_threshold out of range, using default");
        config.prune_threshold = defaults.prune_threshold;
    }
    if !unit_range(config.confirm_boost) {
        tracing::warn!(value = config.confirm_boost, "confirm_boost out of range, using default");
        config.confirm_boost = defaults.confirm_boost;
    }
    if config.sweep_interval_secs == 0 {
        tracing::warn!("sweep_interval_secs must be > 0, using default");
        config.sweep_interval_secs = defaults.sweep_interval_secs;
    }
    config
}
