//! Relationship and fact commands: relate, fact, confirm.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use console::style;
use uuid::Uuid;

use relmem_types::attr::AttrValue;
use relmem_types::entity::EntityId;
use relmem_types::relationship::CONFIDENCE_ATTR;

use crate::cli::parse_attrs;
use crate::state::AppState;

/// What to confirm.
#[derive(Subcommand)]
pub enum ConfirmTarget {
    /// Confirm a relationship by UUID.
    Relationship {
        /// Relationship UUID (see `relmem show`).
        id: String,
    },

    /// Confirm the fact with this predicate.
    Fact {
        /// Predicate of the fact.
        predicate: String,

        /// Subject entity id (defaults to the user).
        #[arg(long)]
        subject: Option<String>,
    },
}

fn check_confidence(confidence: Option<f64>) -> Result<Option<f64>> {
    match confidence {
        Some(c) if !(0.0..=1.0).contains(&c) => bail!("Confidence must be between 0 and 1, got {c}"),
        other => Ok(other),
    }
}

async fn subject_or_self(state: &AppState, subject: Option<String>) -> EntityId {
    match subject {
        Some(subject) => EntityId::from(subject),
        None => state.graph.ensure_self_entity().await,
    }
}

/// Create or merge a relationship between two existing entities.
pub async fn relate(
    state: &AppState,
    from: &str,
    rel_type: &str,
    to: &str,
    confidence: Option<f64>,
    attrs: &[String],
    json: bool,
) -> Result<()> {
    let mut attributes = parse_attrs(attrs)?;
    if let Some(c) = check_confidence(confidence)? {
        attributes.insert(CONFIDENCE_ATTR.to_string(), AttrValue::Number(c));
    }

    let from = EntityId::from(from);
    let to = EntityId::from(to);
    let rel = state
        .graph
        .add_relationship(&from, &to, rel_type, attributes)
        .await
        .with_context(|| format!("Cannot link '{from}' to '{to}': both entities must exist"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rel)?);
    } else {
        println!();
        println!(
            "  {} {} {} {}",
            style("ok").green(),
            style(&rel.from).cyan(),
            style(&rel.rel_type).bold(),
            style(&rel.to).cyan(),
        );
        println!("     Id: {}", style(rel.id).dim());
        println!();
    }

    Ok(())
}

/// Record or replace a fact.
pub async fn fact(
    state: &AppState,
    predicate: &str,
    object: &str,
    subject: Option<String>,
    confidence: Option<f64>,
    json: bool,
) -> Result<()> {
    let mut attributes = relmem_types::attr::Attributes::new();
    if let Some(c) = check_confidence(confidence)? {
        attributes.insert(CONFIDENCE_ATTR.to_string(), AttrValue::Number(c));
    }

    let subject = subject_or_self(state, subject).await;
    let fact = state.graph.add_fact(&subject, predicate, object, attributes).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&fact)?);
    } else {
        println!();
        println!(
            "  {} {}: {} = {}",
            style("ok").green(),
            style(&fact.subject).cyan(),
            style(&fact.predicate).bold(),
            fact.object,
        );
        println!();
    }

    Ok(())
}

/// Confirm a relationship or fact.
pub async fn confirm(state: &AppState, target: ConfirmTarget, json: bool) -> Result<()> {
    let (label, confidence, value) = match target {
        ConfirmTarget::Relationship { id } => {
            let uuid = Uuid::parse_str(&id).with_context(|| format!("'{id}' is not a UUID"))?;
            let rel = state
                .graph
                .confirm_relationship(&uuid)
                .await
                .with_context(|| format!("Relationship '{id}' not found"))?;
            (
                format!("{} {} {}", rel.from, rel.rel_type, rel.to),
                rel.confidence,
                serde_json::to_value(&rel)?,
            )
        }
        ConfirmTarget::Fact { predicate, subject } => {
            let subject = subject_or_self(state, subject).await;
            let fact = state
                .graph
                .confirm_fact(&subject, &predicate)
                .await
                .with_context(|| format!("No '{predicate}' fact about '{subject}'"))?;
            (
                format!("{}: {} = {}", fact.subject, fact.predicate, fact.object),
                fact.confidence,
                serde_json::to_value(&fact)?,
            )
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!();
        println!(
            "  {} Confirmed {} {}",
            style("ok").green(),
            style(label).cyan(),
            style(format!("(confidence {confidence:.2})")).dim(),
        );
        println!();
    }

    Ok(())
}
