//! CLI command definitions for the `relmem` binary.
//!
//! Uses clap derive macros for argument parsing. Every exposed memory
//! operation has a subcommand; handlers live in the sibling modules.

pub mod browsing;
pub mod entity;
pub mod ingest;
pub mod link;
pub mod maintenance;
pub mod status;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use clap_complete::Shell;

use relmem_types::attr::{AttrValue, Attributes};
use relmem_types::entity::EntityType;

/// Remember what a user tells you: entities, relationships and facts.
#[derive(Parser)]
#[command(name = "relmem", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Keep memory in-process only; nothing is read from or written to disk.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract entities, relationships and facts from a piece of text.
    Ingest {
        /// Text to learn from (multiple words are joined with spaces).
        #[arg(required = true)]
        text: Vec<String>,

        /// Topic label attached to extracted preferences.
        #[arg(long)]
        topic: Option<String>,
    },

    /// Print the context string a language model would receive.
    Context,

    /// Memory statistics and storage location.
    Status,

    /// List entities, optionally filtered.
    #[command(alias = "ls")]
    Entities {
        /// Only entities of this type.
        #[arg(long = "type", short = 't')]
        entity_type: Option<EntityType>,

        /// Case-insensitive substring of the name.
        #[arg(long)]
        name: Option<String>,

        /// Attribute containment filter as key=value.
        #[arg(long)]
        attr: Option<String>,
    },

    /// Show one entity with its relationships and facts.
    Show {
        /// Entity id (e.g. person:jane_doe, self:user).
        id: String,
    },

    /// Add an entity, or merge attributes into an existing one.
    Add {
        /// Entity type (person, organization, location, ...).
        entity_type: EntityType,

        /// Entity name.
        name: String,

        /// Attribute as key=value (repeatable).
        #[arg(long = "attr", short = 'a')]
        attrs: Vec<String>,
    },

    /// Link two entities with a typed relationship.
    Relate {
        /// Source entity id.
        from: String,

        /// Relationship type (works_at, spouse, prefers, ...).
        rel_type: String,

        /// Target entity id.
        to: String,

        /// Confidence override in [0, 1].
        #[arg(long)]
        confidence: Option<f64>,

        /// Attribute as key=value (repeatable).
        #[arg(long = "attr", short = 'a')]
        attrs: Vec<String>,
    },

    /// Record a fact (subject defaults to the user).
    Fact {
        /// Predicate, e.g. employer.
        predicate: String,

        /// Object value.
        object: String,

        /// Subject entity id.
        #[arg(long)]
        subject: Option<String>,

        /// Confidence override in [0, 1].
        #[arg(long)]
        confidence: Option<f64>,
    },

    /// Re-observe a relationship or fact, raising its confidence.
    Confirm {
        #[command(subcommand)]
        target: link::ConfirmTarget,
    },

    /// Delete an entity (cascading), or a relationship/fact by UUID.
    #[command(alias = "rm")]
    Forget {
        /// Entity id or relationship/fact UUID.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Remember a page visit.
    Visit {
        /// Absolute URL of the page.
        url: String,

        /// Page title.
        #[arg(long)]
        title: Option<String>,
    },

    /// Remember a search the user ran.
    Searched {
        /// Search query (multiple words are joined with spaces).
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// List visited pages, newest first.
    History {
        /// Maximum number of pages.
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,

        /// Only pages whose URL or title contains one of these words.
        #[arg(long)]
        find: Option<String>,
    },

    /// Forget a visited page.
    ForgetPage {
        /// URL of the page.
        url: String,
    },

    /// Remove relationships whose decayed confidence fell below the prune threshold.
    Prune {
        /// Keep running and sweep on the configured interval until Ctrl+C.
        #[arg(long)]
        watch: bool,
    },

    /// Wipe all entities, relationships and facts.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Parse `key=value` attribute arguments.
///
/// Values that parse as a finite number or a boolean are stored as such;
/// anything else is text.
pub fn parse_attrs(pairs: &[String]) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Attribute '{pair}' must be in key=value form");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Attribute '{pair}' has an empty key");
        }
        attributes.insert(key.to_string(), parse_attr_value(value.trim()));
    }
    Ok(attributes)
}

fn parse_attr_value(raw: &str) -> AttrValue {
    if let Ok(b) = raw.parse::<bool>() {
        return AttrValue::Bool(b);
    }
    // "nan" and "inf" parse as floats but have no JSON form; keep them as text.
    if let Some(n) = raw.parse::<f64>().ok().filter(|n| n.is_finite()) {
        return AttrValue::Number(n);
    }
    AttrValue::from(raw)
}
