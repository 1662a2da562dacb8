//! Memory status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display graph counts, storage location and active tunables.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let stats = state.graph.stats().await;
    let config = state.graph.config();
    let storage = if state.ephemeral {
        "in-memory"
    } else {
        "SQLite (WAL mode)"
    };

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "storage": storage,
            "stats": stats,
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} relmem v{}", style("*").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Memory ──").dim());
    println!("  Entities:      {}", style(stats.entity_count).bold());
    println!("  Relationships: {}", style(stats.relationship_count).bold());
    if stats.stale_relationship_count > 0 {
        println!(
            "  Stale:         {}",
            style(stats.stale_relationship_count).yellow()
        );
    }
    println!("  Facts:         {}", style(stats.fact_count).bold());
    println!();

    println!("  {}", style("── Decay ──").dim());
    println!("  Stale below:   {:.2}", config.decay_stale_threshold);
    println!("  Prune below:   {:.2}", config.prune_threshold);
    println!("  Sweep every:   {}s", config.sweep_interval_secs);
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Storage:  {}", style(storage).dim());
    println!();

    Ok(())
}
