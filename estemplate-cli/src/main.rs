use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use estemplate::{banner, ClientRegistry, DocumentTemplate, EsConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "estemplate")]
#[command(about = "estemplate CLI - document operations across search clusters")]
#[command(version)]
struct Cli {
    /// Path to the cluster configuration file
    #[arg(short, long, env = "ESTEMPLATE_CONFIG", default_value = "estemplate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List configured clusters and whether they answer a ping
    Clusters,

    /// Ping one cluster
    Ping {
        /// Cluster name
        cluster: String,
    },

    /// Fetch a document by id
    Get {
        #[arg(short, long)]
        cluster: String,

        #[arg(short, long)]
        index: String,

        /// Document id
        id: String,

        /// Fields to return (comma-separated)
        #[arg(short, long)]
        fields: Option<String>,
    },

    /// Check whether a document exists
    Exists {
        #[arg(short, long)]
        cluster: String,

        #[arg(short, long)]
        index: String,

        /// Document id
        id: String,
    },

    /// Search an index
    Search {
        #[arg(short, long)]
        cluster: String,

        #[arg(short, long)]
        index: String,

        /// Raw JSON query clause; match_all when omitted
        #[arg(short, long)]
        query: Option<String>,

        #[arg(long, default_value = "0")]
        from: usize,

        #[arg(long, default_value = "10")]
        size: usize,

        /// Fields to return (comma-separated)
        #[arg(short, long)]
        fields: Option<String>,

        /// Sort ascending on this field before score
        #[arg(long)]
        sort: Option<String>,

        /// Keep a scroll open for N minutes and page through every hit
        #[arg(long)]
        scroll: Option<u32>,
    },

    /// Delete every document in an index
    DeleteAll {
        #[arg(short, long)]
        cluster: String,

        #[arg(short, long)]
        index: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,estemplate=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = EsConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if config.print_banner {
        tracing::info!("{}", banner::render());
    }

    let registry = Arc::new(ClientRegistry::initialize(&config.clusters));
    let template = DocumentTemplate::new(registry.clone());

    let result = run(&template, cli.command).await;
    registry.shutdown();
    result
}

async fn run(template: &DocumentTemplate, command: Commands) -> Result<()> {
    match command {
        Commands::Clusters => commands::run_clusters(template).await,
        Commands::Ping { cluster } => commands::run_ping(template, &cluster).await,
        Commands::Get {
            cluster,
            index,
            id,
            fields,
        } => commands::run_get(template, &cluster, &index, &id, split_fields(fields)).await,
        Commands::Exists { cluster, index, id } => {
            commands::run_exists(template, &cluster, &index, &id).await
        }
        Commands::Search {
            cluster,
            index,
            query,
            from,
            size,
            fields,
            sort,
            scroll,
        } => {
            let options = commands::SearchOptions {
                query,
                from,
                size,
                fields: split_fields(fields),
                sort,
                scroll,
            };
            commands::run_search(template, &cluster, &index, options).await
        }
        Commands::DeleteAll { cluster, index } => {
            commands::run_delete_all(template, &cluster, &index).await
        }
    }
}

fn split_fields(fields: Option<String>) -> Option<Vec<String>> {
    fields.map(|f| {
        f.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
