//! Entity browsing and management commands: entities, show, add, forget.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use relmem_types::entity::{EntityId, EntityQuery, EntityType};
use relmem_types::relationship::RelationshipQuery;

use crate::cli::parse_attrs;
use crate::state::AppState;

/// List entities matching the given filters.
pub async fn list_entities(
    state: &AppState,
    entity_type: Option<EntityType>,
    name: Option<String>,
    attr: Option<String>,
    json: bool,
) -> Result<()> {
    let mut query = EntityQuery {
        entity_type,
        ..EntityQuery::default()
    };
    if let Some(name) = name {
        query = query.with_name(name);
    }
    if let Some(attr) = attr {
        let parsed = parse_attrs(std::slice::from_ref(&attr))?;
        if let Some((key, value)) = parsed.into_iter().next() {
            query = query.with_attribute(key, value);
        }
    }

    let entities = state.graph.find_entities(&query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&entities)?);
        return Ok(());
    }

    if entities.is_empty() {
        println!();
        println!("  {} No matching entities.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Accessed").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for entity in &entities {
        table.add_row(vec![
            Cell::new(entity.id.as_str()).fg(Color::DarkGrey),
            Cell::new(entity.entity_type.as_str()),
            Cell::new(&entity.name).fg(Color::Cyan),
            Cell::new(entity.access_count),
            Cell::new(entity.updated.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} entities", entities.len());
    println!();

    Ok(())
}

/// Show one entity with all relationships touching it and its facts.
pub async fn show_entity(state: &AppState, id: &str, json: bool) -> Result<()> {
    let id = EntityId::from(id);
    let entity = state
        .graph
        .get_entity(&id)
        .await
        .with_context(|| format!("Entity '{id}' not found"))?;

    let relationships = state
        .graph
        .get_relationships(&id, &RelationshipQuery::default().include_stale(true))
        .await;
    let facts = state.graph.get_facts(&id, None).await;

    if json {
        let rels: Vec<serde_json::Value> = relationships
            .iter()
            .map(|r| {
                serde_json::json!({
                    "relationship": r,
                    "stale": state.graph.is_stale(r),
                    "decayed_confidence": state.graph.decayed_confidence_of(r),
                })
            })
            .collect();
        let out = serde_json::json!({
            "entity": entity,
            "relationships": rels,
            "facts": facts,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style(&entity.name).cyan().bold(),
        style(format!("[{}]", entity.entity_type)).dim(),
    );
    println!("  Id:       {}", style(&entity.id).dim());
    println!("  Created:  {}", entity.created.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Updated:  {}", entity.updated.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Accessed: {} times", entity.access_count);
    for (key, value) in &entity.attributes {
        println!("  {}: {}", style(key).bold(), value);
    }
    println!();

    if !relationships.is_empty() {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Id").fg(Color::White),
            Cell::new("Relationship").fg(Color::White),
            Cell::new("Confidence").fg(Color::White),
            Cell::new("Decayed").fg(Color::White),
            Cell::new("State").fg(Color::White),
        ]);

        for rel in &relationships {
            let stale = state.graph.is_stale(rel);
            table.add_row(vec![
                Cell::new(rel.id.to_string()).fg(Color::DarkGrey),
                Cell::new(format!("{} -[{}]-> {}", rel.from, rel.rel_type, rel.to)),
                Cell::new(format!("{:.2}", rel.confidence)),
                Cell::new(format!("{:.2}", state.graph.decayed_confidence_of(rel))),
                if stale {
                    Cell::new("stale").fg(Color::Yellow)
                } else {
                    Cell::new("fresh").fg(Color::Green)
                },
            ]);
        }
        println!("{table}");
        println!();
    }

    if !facts.is_empty() {
        println!("  {}", style("── Facts ──").dim());
        for fact in &facts {
            println!(
                "  {} = {} {}",
                style(&fact.predicate).bold(),
                fact.object,
                style(format!("({:.2}, {})", fact.confidence, fact.source)).dim(),
            );
        }
        println!();
    }

    Ok(())
}

/// Add or merge an entity.
pub async fn add_entity(
    state: &AppState,
    entity_type: EntityType,
    name: &str,
    attrs: &[String],
    json: bool,
) -> Result<()> {
    let attributes = parse_attrs(attrs)?;
    let entity = state.graph.add_entity(entity_type, name, attributes).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entity)?);
    } else {
        println!();
        println!(
            "  {} Remembered {} {}",
            style("ok").green(),
            style(&entity.name).cyan(),
            style(format!("({})", entity.id)).dim(),
        );
        println!();
    }

    Ok(())
}

/// Forget an entity (with cascade), or a relationship or fact by UUID.
pub async fn forget(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        let kind = if state.graph.remove_relationship(&uuid).await {
            Some("relationship")
        } else if state.graph.remove_fact(&uuid).await {
            Some("fact")
        } else {
            None
        };
        return report_forget(id, kind, None, json);
    }

    let entity_id = EntityId::from(id);
    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Forget '{}' and every relationship and fact about it?",
                style(id).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let report = state.graph.delete_entity(&entity_id).await;
    report_forget(
        id,
        report.map(|_| "entity"),
        report.map(|r| (r.relationships_removed, r.facts_removed)),
        json,
    )
}

fn report_forget(
    id: &str,
    kind: Option<&str>,
    cascade: Option<(usize, usize)>,
    json: bool,
) -> Result<()> {
    if json {
        let out = serde_json::json!({
            "id": id,
            "deleted": kind,
            "relationships_removed": cascade.map(|c| c.0),
            "facts_removed": cascade.map(|c| c.1),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    match kind {
        Some(kind) => {
            println!("  {} Forgot {} '{}'", style("ok").green(), kind, style(id).cyan());
            if let Some((rels, facts)) = cascade {
                println!(
                    "     Also removed {} relationships and {} facts",
                    rels, facts
                );
            }
        }
        None => {
            println!(
                "  {} Nothing stored under '{}'",
                style("i").blue().bold(),
                style(id).cyan()
            );
        }
    }
    println!();
    Ok(())
}
