//! WDX CLI — Wikidata graph explorer for LLM agents
//!
//! Commands: serve, search, statements, values, hierarchy, sparql

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rmcp::{transport::stdio, ServiceExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wdx_client::{Endpoints, WikidataClient};
use wdx_core::EntityKind;
use wdx_mcp::WdxService;
use wdx_retrieval::{executor, formatter, hierarchy, router};

#[derive(Parser)]
#[command(name = "wdx")]
#[command(version)]
#[command(about = "Wikidata graph explorer for LLM agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the MCP server on stdio
    Serve,
    /// Search items or properties
    #[command(alias = "s")]
    Search {
        /// Natural-language description or name of what to find
        query: String,
        /// Entity kind to search: item or property
        #[arg(long, default_value = "item")]
        kind: String,
        /// Language code for labels and descriptions
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// List an entity's statements in compact triplet form
    Statements {
        /// A QID or PID such as Q42 or P31
        entity_id: String,
        /// Include external identifiers linking to other databases
        #[arg(long)]
        external_ids: bool,
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Show every value of one entity/property pair, with provenance
    Values {
        /// A QID or PID such as Q42 or P31
        entity_id: String,
        /// A PID such as P106
        property_id: String,
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Walk the instance-of/subclass-of hierarchy above an entity
    Hierarchy {
        /// The QID to start from
        entity_id: String,
        #[arg(long, default_value_t = 5)]
        max_depth: u32,
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Execute a SPARQL query and print up to K rows as delimited text
    Sparql {
        /// A valid SPARQL query string
        query: String,
        /// Maximum number of result rows
        #[arg(short, long, default_value_t = 10)]
        k: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let client = Arc::new(WikidataClient::new(Endpoints::from_env())?);

    match cli.command {
        Commands::Serve => serve(client).await?,
        Commands::Search { query, kind, lang } => {
            let kind: EntityKind = kind.parse()?;
            let outcome = router::search(&*client, &*client, &query, kind, &lang).await?;
            if outcome.hits().is_empty() {
                println!("No matches for '{query}'");
            } else {
                println!("{}", router::render_hits(outcome.hits()));
            }
        }
        Commands::Statements {
            entity_id,
            external_ids,
            lang,
        } => {
            let text = formatter::format_compact(&*client, &entity_id, external_ids, &lang).await?;
            println!("{text}");
        }
        Commands::Values {
            entity_id,
            property_id,
            lang,
        } => {
            let text = formatter::format_full(&*client, &entity_id, &property_id, &lang).await?;
            println!("{text}");
        }
        Commands::Hierarchy {
            entity_id,
            max_depth,
            lang,
        } => {
            let graph = hierarchy::walk(&*client, &entity_id, max_depth, &lang).await?;
            let nested = hierarchy::to_nested_json(&graph, max_depth);
            println!("{}", serde_json::to_string_pretty(&nested)?);
        }
        Commands::Sparql { query, k } => {
            let result = executor::execute(&*client, &query, k).await?;
            print!("{}", executor::encode_delimited(&result));
        }
    }
    Ok(())
}

async fn serve(client: Arc<WikidataClient>) -> anyhow::Result<()> {
    info!("starting WDX MCP server on stdio");
    let service = WdxService::new(client)
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service
        .waiting()
        .await
        .context("MCP server terminated abnormally")?;
    Ok(())
}

fn init_tracing() {
    // stdout must stay JSON-RPC clean for MCP, so all logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}
