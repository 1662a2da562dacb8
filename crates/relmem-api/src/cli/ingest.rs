//! Text ingestion and context rendering commands.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Run extraction over `text` and report what was learned.
///
/// # Examples
///
/// ```bash
/// relmem ingest "I live in Austin and I work at Acme"
/// relmem ingest --topic food "I love ramen"
/// ```
pub async fn ingest(state: &AppState, text: &str, topic: Option<&str>, json: bool) -> Result<()> {
    let result = state.graph.extract_from_text(text, topic).await;

    if json {
        let out = serde_json::json!({
            "entities": result.entities,
            "relationships": result.relationships,
            "facts": result.facts,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    if result.is_empty() {
        println!(
            "  {} Nothing recognizable in that text.",
            style("i").blue().bold()
        );
        println!();
        return Ok(());
    }

    println!(
        "  {} Learned {} entities, {} relationships, {} facts",
        style("ok").green(),
        result.entities.len(),
        result.relationships.len(),
        result.facts.len(),
    );
    println!();

    for entity in &result.entities {
        println!(
            "  {} {} {}",
            style("+").green(),
            style(&entity.name).cyan(),
            style(format!("({})", entity.id)).dim(),
        );
    }
    for rel in &result.relationships {
        println!(
            "  {} {} {} {}",
            style("~").yellow(),
            rel.from,
            style(&rel.rel_type).bold(),
            rel.to,
        );
    }
    for fact in &result.facts {
        println!(
            "  {} {} = {}",
            style("#").blue(),
            style(&fact.predicate).bold(),
            fact.object,
        );
    }
    println!();

    Ok(())
}

/// Print the context string built from current knowledge.
pub async fn context(state: &AppState, json: bool) -> Result<()> {
    let snapshot = state.graph.query_for_context().await;
    let rendered = snapshot.render(state.graph.config().recent_interest_limit);

    if json {
        let out = serde_json::json!({
            "context": rendered,
            "snapshot": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if rendered.is_empty() {
        println!();
        println!(
            "  {} Nothing known yet. Teach me with: relmem ingest \"<text>\"",
            style("i").blue().bold()
        );
        println!();
        return Ok(());
    }

    println!("{rendered}");
    Ok(())
}
