use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use legal_rag_core::{
    build_index_entries, ingest_folder, load_artifacts, write_artifacts, Embedder,
    ExactMemoryIndex, HashingTrigramEmbedder, IngestionOptions, LegalAssistant, OpenAiChatClient,
    PineconeIndex, RetrievalQuery, Retriever, Settings, VectorIndex,
};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "legal-rag", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the chunk table and embedding matrix artifacts.
    #[arg(long, env = "LEGAL_RAG_DATA_DIR", default_value = "Data")]
    data_dir: String,

    /// Use the hosted Pinecone index instead of the in-process index.
    #[arg(long, default_value_t = false)]
    remote: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a PDF folder: clean, chunk, embed, persist artifacts, upsert.
    Ingest {
        /// Folder that contains PDFs recursively.
        #[arg(long)]
        folder: String,
    },
    /// Retrieve ranked passages for a query, without generation.
    Search {
        /// Query text.
        #[arg(long)]
        query: String,
        /// Number of candidates to return.
        #[arg(long)]
        top_k: Option<usize>,
        /// Similarity floor; matches below it are dropped.
        #[arg(long)]
        min_score: Option<f32>,
    },
    /// Ask a question and get an answer grounded in retrieved passages.
    Ask {
        /// Question text.
        #[arg(long)]
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let embedder = HashingTrigramEmbedder::default();
    let data_dir = Path::new(&cli.data_dir);

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "legal-rag boot"
    );

    match cli.command {
        Command::Ingest { folder } => {
            let report = ingest_folder(Path::new(&folder), IngestionOptions::default())?;

            if !report.skipped.is_empty() {
                warn!(skipped = report.skipped.len(), folder = %folder, "documents skipped");
                for skipped in &report.skipped {
                    warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped document");
                }
            }

            let texts: Vec<&str> = report.chunks.iter().map(|c| c.text.as_str()).collect();
            let embeddings = embedder.embed_batch(&texts);

            std::fs::create_dir_all(data_dir)
                .with_context(|| format!("creating {}", data_dir.display()))?;
            write_artifacts(data_dir, &report.chunks, &embeddings, embedder.dimensions())?;

            if cli.remote {
                let index = pinecone_index(&settings, embedder.dimensions())?;
                index.ensure_index().await?;
                // Reuse the matrix written above instead of embedding again.
                let entries = build_index_entries(&report.chunks, embeddings)?;
                index.upsert(&entries).await?;
                info!(entry_count = entries.len(), "remote index updated");
            }

            println!(
                "{} chunks from {} documents ingested at {} (artifacts in {})",
                report.chunks.len(),
                report.documents.len(),
                Utc::now().to_rfc3339(),
                data_dir.display()
            );
        }
        Command::Search {
            query,
            top_k,
            min_score,
        } => {
            let mut retrieval_query = RetrievalQuery::new(query);
            retrieval_query.top_k = top_k.unwrap_or(settings.top_k);
            retrieval_query.min_score = min_score.unwrap_or(settings.min_score);

            if cli.remote {
                let index = pinecone_index(&settings, embedder.dimensions())?;
                run_search(embedder, index, &settings, &retrieval_query).await?;
            } else {
                let index = local_index(data_dir, &embedder).await?;
                run_search(embedder, index, &settings, &retrieval_query).await?;
            }
        }
        Command::Ask { query } => {
            let mut retrieval_query = RetrievalQuery::new(query);
            retrieval_query.top_k = settings.top_k;
            retrieval_query.min_score = settings.min_score;

            let openai = settings.openai()?;
            let generator = OpenAiChatClient::new(&openai.endpoint, openai.api_key);

            if cli.remote {
                let index = pinecone_index(&settings, embedder.dimensions())?;
                run_ask(embedder, index, generator, &settings, &retrieval_query).await?;
            } else {
                let index = local_index(data_dir, &embedder).await?;
                run_ask(embedder, index, generator, &settings, &retrieval_query).await?;
            }
        }
    }

    Ok(())
}

fn pinecone_index(settings: &Settings, dimensions: usize) -> anyhow::Result<PineconeIndex> {
    let pinecone = settings.pinecone()?;
    Ok(PineconeIndex::new(
        &pinecone.control_endpoint,
        &pinecone.index_host,
        pinecone.index_name,
        pinecone.api_key,
        dimensions,
    )?)
}

// Rebuilds the exact in-process index from the persisted artifact pair.
async fn local_index(
    data_dir: &Path,
    embedder: &HashingTrigramEmbedder,
) -> anyhow::Result<ExactMemoryIndex> {
    let (chunks, embeddings) = load_artifacts(data_dir)
        .with_context(|| format!("loading artifacts from {}; run ingest first", data_dir.display()))?;

    let index = ExactMemoryIndex::new(embedder.dimensions());
    let entries = build_index_entries(&chunks, embeddings)?;
    index.upsert(&entries).await?;

    info!(entry_count = index.len().await, "local index ready");
    Ok(index)
}

fn retriever<I: VectorIndex>(
    embedder: HashingTrigramEmbedder,
    index: I,
    settings: &Settings,
) -> Retriever<HashingTrigramEmbedder, I> {
    let timeout = if settings.search_timeout > Duration::ZERO {
        settings.search_timeout
    } else {
        legal_rag_core::DEFAULT_SEARCH_TIMEOUT
    };
    Retriever::new(embedder, index).with_timeout(timeout)
}

async fn run_search<I: VectorIndex>(
    embedder: HashingTrigramEmbedder,
    index: I,
    settings: &Settings,
    query: &RetrievalQuery,
) -> anyhow::Result<()> {
    let result = retriever(embedder, index, settings).retrieve(query).await?;

    println!("query: {}", result.query);
    if result.is_empty() {
        println!("no passages cleared the relevance filter");
        return Ok(());
    }

    for (rank, passage) in result.passages.iter().enumerate() {
        println!(
            "{}. score={:.4} source={}",
            rank + 1,
            passage.score,
            passage.file_name
        );
        println!("   {}", passage.text);
    }

    Ok(())
}

async fn run_ask<I: VectorIndex>(
    embedder: HashingTrigramEmbedder,
    index: I,
    generator: OpenAiChatClient,
    settings: &Settings,
    query: &RetrievalQuery,
) -> anyhow::Result<()> {
    let assistant = LegalAssistant::new(retriever(embedder, index, settings), generator);
    let answer = assistant.answer(query).await?;

    println!("{}", answer.text);
    if !answer.passages.is_empty() {
        println!("\nsources:");
        for passage in &answer.passages {
            println!("  {} (score {:.4})", passage.file_name, passage.score);
        }
    }

    Ok(())
}
