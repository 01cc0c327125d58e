use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use rustyvec::{
    CancellationToken, Document, SearchOptions, VectorStore, config::Config, logging,
    qdrant::QdrantService, store::ContentHashDeduplicator,
};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(
    name = "rustyvec",
    about = "Store and search text documents in Qdrant"
)]
struct Cli {
    /// Override the configured collection.
    #[arg(long, global = true)]
    collection: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the collection sized for the configured embedder when missing.
    Init,
    /// Embed and store documents.
    Add {
        /// Document text; repeat for several documents.
        #[arg(long)]
        text: Vec<String>,
        /// Metadata applied to every `--text` document, as `key=value`.
        #[arg(long = "meta", value_parser = parse_key_value)]
        metadata: Vec<(String, Value)>,
        /// JSON lines file of documents (`{"page_content": ..., "metadata": {...}}`).
        #[arg(long)]
        file: Option<PathBuf>,
        /// Skip documents whose text repeats within this run.
        #[arg(long)]
        dedupe: bool,
    },
    /// Similarity search for a query.
    Search {
        query: String,
        #[arg(long, default_value_t = 4)]
        limit: usize,
        #[arg(long)]
        score_threshold: Option<f32>,
        /// Qdrant filter as JSON.
        #[arg(long)]
        filter: Option<String>,
    },
    /// List stored documents matching a filter.
    Scroll {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Qdrant filter as JSON.
        #[arg(long)]
        filter: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    logging::init_tracing();
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;
    let store = VectorStore::from_config(&config).context("failed to build vector store")?;

    let ctx = CancellationToken::new();
    tokio::spawn({
        let ctx = ctx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received; cancelling");
                ctx.cancel();
            }
        }
    });

    let mut options = SearchOptions::new();
    if let Some(collection) = cli.collection.clone() {
        options = options.with_collection(collection);
    }

    match cli.command {
        Command::Init => {
            let collection = store.collection_for(&options);
            let service = QdrantService::new(&config.qdrant_url, config.qdrant_api_key.clone())
                .context("failed to build Qdrant client")?;
            service
                .create_collection_if_not_exists(collection, store.embedder().dimension() as u64)
                .await
                .with_context(|| format!("failed to ensure collection {collection}"))?;
            println!("{}", serde_json::json!({ "collection": collection }));
        }
        Command::Add {
            text,
            metadata,
            file,
            dedupe,
        } => {
            let documents = collect_documents(text, metadata, file)?;
            if dedupe {
                options = options.with_deduplicator(Arc::new(ContentHashDeduplicator::new()));
            }
            let ids = store
                .add_documents(&ctx, &documents, &options)
                .await
                .context("failed to add documents")?;
            println!("{}", serde_json::to_string(&ids)?);
        }
        Command::Search {
            query,
            limit,
            score_threshold,
            filter,
        } => {
            if let Some(threshold) = score_threshold {
                options = options.with_score_threshold(threshold);
            }
            if let Some(filter) = filter {
                options = options.with_filters(parse_filter(&filter)?);
            }
            let documents = store
                .similarity_search(&ctx, &query, limit, &options)
                .await
                .context("similarity search failed")?;
            print_documents(&documents)?;
        }
        Command::Scroll { limit, filter } => {
            if let Some(filter) = filter {
                options = options.with_filters(parse_filter(&filter)?);
            }
            let documents = store
                .payload_search(&ctx, limit, &options)
                .await
                .context("payload search failed")?;
            print_documents(&documents)?;
        }
    }

    Ok(())
}

fn collect_documents(
    texts: Vec<String>,
    metadata: Vec<(String, Value)>,
    file: Option<PathBuf>,
) -> Result<Vec<Document>> {
    let shared: Map<String, Value> = metadata.into_iter().collect();
    let mut documents: Vec<Document> = texts
        .into_iter()
        .map(|text| Document::new(text).with_metadata(shared.clone()))
        .collect();

    if let Some(path) = file {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let document: Document = serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid document", path.display(), index + 1))?;
            documents.push(document);
        }
    }

    if documents.is_empty() {
        bail!("no documents supplied; use --text or --file");
    }
    Ok(documents)
}

fn parse_key_value(input: &str) -> Result<(String, Value)> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{input}'"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("metadata key must not be empty");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn parse_filter(input: &str) -> Result<Value> {
    serde_json::from_str(input).context("filter must be valid JSON")
}

fn print_documents(documents: &[Document]) -> Result<()> {
    for document in documents {
        println!("{}", serde_json::to_string(document)?);
    }
    Ok(())
}
