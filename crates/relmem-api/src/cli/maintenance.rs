//! Housekeeping commands: prune and clear.

use std::time::Duration;

use anyhow::Result;
use console::style;
use dialoguer::Confirm;

use relmem_core::decay::sweeper::DecaySweeper;

use crate::state::AppState;

/// Run one decay sweep, or keep sweeping on the configured interval with `--watch`.
pub async fn prune(state: &AppState, watch: bool, json: bool) -> Result<()> {
    let removed = state.graph.prune_decayed().await;

    if json {
        println!("{}", serde_json::json!({ "pruned": removed }));
    } else {
        println!();
        println!(
            "  {} Pruned {} decayed relationships {}",
            style("ok").green(),
            style(removed).bold(),
            style(format!("(threshold {:.2})", state.graph.config().prune_threshold)).dim(),
        );
        println!();
    }

    if !watch {
        return Ok(());
    }

    let period = Duration::from_secs(state.graph.config().sweep_interval_secs);
    let sweeper = DecaySweeper::spawn(state.graph.clone(), period);
    if !json {
        println!(
            "  {} Sweeping every {}s. Press Ctrl+C to stop.",
            style("i").blue().bold(),
            period.as_secs()
        );
    }

    tokio::signal::ctrl_c().await?;
    sweeper.shutdown().await;

    if !json {
        println!();
        println!("  Stopped.");
    }
    Ok(())
}

/// Wipe every entity, relationship and fact.
pub async fn clear(state: &AppState, force: bool, json: bool) -> Result<()> {
    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Erase {} of everything remembered?",
                style("all").red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let before = state.graph.stats().await;
    state.graph.clear().await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "cleared": before }))?
        );
    } else {
        println!();
        println!(
            "  {} Cleared {} entities, {} relationships, {} facts",
            style("ok").green(),
            before.entity_count,
            before.relationship_count,
            before.fact_count,
        );
        println!();
    }

    Ok(())
}
