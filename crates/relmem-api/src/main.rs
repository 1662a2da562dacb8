//! relmem CLI entry point.
//!
//! Binary name: `relmem`
//!
//! Parses CLI arguments, opens the memory graph, then dispatches to the
//! appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,relmem=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "relmem", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.ephemeral).await?;

    match cli.command {
        Commands::Ingest { text, topic } => {
            let text = text.join(" ");
            cli::ingest::ingest(&state, &text, topic.as_deref(), cli.json).await?;
        }

        Commands::Context => {
            cli::ingest::context(&state, cli.json).await?;
        }

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Entities {
            entity_type,
            name,
            attr,
        } => {
            cli::entity::list_entities(&state, entity_type, name, attr, cli.json).await?;
        }

        Commands::Show { id } => {
            cli::entity::show_entity(&state, &id, cli.json).await?;
        }

        Commands::Add {
            entity_type,
            name,
            attrs,
        } => {
            cli::entity::add_entity(&state, entity_type, &name, &attrs, cli.json).await?;
        }

        Commands::Relate {
            from,
            rel_type,
            to,
            confidence,
            attrs,
        } => {
            cli::link::relate(&state, &from, &rel_type, &to, confidence, &attrs, cli.json)
                .await?;
        }

        Commands::Fact {
            predicate,
            object,
            subject,
            confidence,
        } => {
            cli::link::fact(&state, &predicate, &object, subject, confidence, cli.json).await?;
        }

        Commands::Confirm { target } => {
            cli::link::confirm(&state, target, cli.json).await?;
        }

        Commands::Forget { id, force } => {
            cli::entity::forget(&state, &id, force, cli.json).await?;
        }

        Commands::Visit { url, title } => {
            cli::browsing::visit(&state, &url, title.as_deref(), cli.json).await?;
        }

        Commands::Searched { query } => {
            let query = query.join(" ");
            cli::browsing::searched(&state, &query, cli.json).await?;
        }

        Commands::History { limit, find } => {
            cli::browsing::history(&state, limit, find.as_deref(), cli.json).await?;
        }

        Commands::ForgetPage { url } => {
            cli::browsing::forget_page(&state, &url, cli.json).await?;
        }

        Commands::Prune { watch } => {
            cli::maintenance::prune(&state, watch, cli.json).await?;
        }

        Commands::Clear { force } => {
            cli::maintenance::clear(&state, force, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
