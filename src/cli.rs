use crate::generate::{generate, Collaborators};
use crate::html::RegexHtml;
use crate::load_config::load_config;
use crate::snapshot::SnapshotStore;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for ado-skin: build a document skin from a test plan snapshot.
#[derive(Parser)]
#[clap(
    name = "ado-skin",
    version,
    about = "Reconcile Azure DevOps test plans and trace queries into a styled row/cell skin"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a skin document from a snapshot using the given config file
    Generate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Path to the JSON snapshot to read from
        #[clap(long)]
        snapshot: PathBuf,
        /// Where to write the skin JSON (stdout when omitted)
        #[clap(long)]
        output: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let result = match cli.command {
        Commands::Generate {
            config,
            snapshot,
            output,
        } => generate_command(config, snapshot, output).await,
    };

    let exit_span = tracing::info_span!("exit");
    exit_span.in_scope(|| {
        tracing::info!(success = result.is_ok(), "cli finished");
    });

    result
}

async fn generate_command(
    config: PathBuf,
    snapshot: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config)?;
    let store = SnapshotStore::from_path(snapshot)?;
    let html = RegexHtml::new();
    let collaborators = Collaborators {
        plan: &store,
        queries: &store,
        history: &store,
        attachments: &store,
        rich_text: &html,
        html: &html,
    };

    let document = match generate(&config, &collaborators).await {
        Ok(document) => document,
        Err(e) => {
            eprintln!("[ERROR] Skin generation failed: {}", e);
            return Err(anyhow::Error::new(e));
        }
    };
    let json = serde_json::to_string_pretty(&document).context("Failed to serialize skin")?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write skin to {:?}", path))?;
            eprintln!("Skin generation complete: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
