//! Browsing memory commands: visit, searched, history, forget-page.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use relmem_core::browsing::{TITLE_ATTR, last_visit, visit_count};
use relmem_types::entity::Entity;

use crate::state::AppState;

/// Record a page visit.
pub async fn visit(state: &AppState, url: &str, title: Option<&str>, json: bool) -> Result<()> {
    let page = state.graph.record_visit(url, title).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        println!();
        println!(
            "  {} Visited {} {}",
            style("ok").green(),
            style(&page.name).cyan(),
            style(format!("({} visits)", visit_count(&page))).dim(),
        );
        println!();
    }

    Ok(())
}

/// Record a search query.
pub async fn searched(state: &AppState, query: &str, json: bool) -> Result<()> {
    let entity = state.graph.record_search(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entity)?);
    } else {
        println!();
        println!(
            "  {} Noted search for {}",
            style("ok").green(),
            style(&entity.name).cyan(),
        );
        println!();
    }

    Ok(())
}

/// List visited pages, newest first, or keyword matches with `--find`.
pub async fn history(state: &AppState, limit: usize, find: Option<&str>, json: bool) -> Result<()> {
    let pages = match find {
        Some(query) => state.graph.search_visits(query, limit).await,
        None => state.graph.recent_visits(limit).await,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&pages)?);
        return Ok(());
    }

    if pages.is_empty() {
        println!();
        println!("  {} No visited pages.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("URL").fg(Color::White),
        Cell::new("Visits").fg(Color::White),
        Cell::new("Last visit").fg(Color::White),
    ]);

    for page in &pages {
        table.add_row(vec![
            Cell::new(title_of(page)).fg(Color::Cyan),
            Cell::new(&page.name).fg(Color::DarkGrey),
            Cell::new(visit_count(page)),
            Cell::new(last_visit(page).format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

/// Forget a visited page.
pub async fn forget_page(state: &AppState, url: &str, json: bool) -> Result<()> {
    let removed = state.graph.forget_visit(url).await;

    if json {
        println!("{}", serde_json::json!({ "url": url, "deleted": removed }));
        return Ok(());
    }
    if !removed {
        bail!("No visit to '{url}' is remembered");
    }

    println!();
    println!("  {} Forgot {}", style("ok").green(), style(url).cyan());
    println!();
    Ok(())
}

fn title_of(page: &Entity) -> &str {
    page.attributes
        .get(TITLE_ATTR)
        .and_then(|v| v.as_str())
        .unwrap_or("-")
}
