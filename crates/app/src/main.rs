use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use faq_search_core::{
    read_faq_jsonl, IngestionPipeline, JinaEmbedder, QdrantStore, SearchPipeline, VectorIndex,
    DEFAULT_EMBEDDING_DIMENSIONS,
};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "faq-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL
    #[arg(long, default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Collection holding the FAQ points
    #[arg(long, default_value = "faq_multivector")]
    collection: String,

    /// API key for the embedding service
    #[arg(long, env = "JINA_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Attempts per remote call before giving up
    #[arg(long, default_value = "3")]
    max_attempts: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Create the multivector collection in Qdrant.
    Init,
    /// Embed a JSONL FAQ file and upsert it into the collection.
    Ingest {
        /// Newline-delimited JSON source file.
        #[arg(long)]
        file: String,
    },
    /// Interactive query loop; type :q to quit.
    Search {
        /// Number of matches to return per query.
        #[arg(long, default_value = "5")]
        top_k: usize,
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

    let embedder = JinaEmbedder::new(&cli.api_key)?;
    let index = QdrantStore::new(&cli.qdrant_url, DEFAULT_EMBEDDING_DIMENSIONS);

    info!(
        version = app_version,
        collection = %cli.collection,
        started_at = %Utc::now().to_rfc3339(),
        "faq-search boot"
    );

    match cli.command {
        Command::Init => {
            index
                .create_multivector_collection(&cli.collection)
                .await
                .with_context(|| format!("creating collection {}", cli.collection))?;
            println!("collection {} created", cli.collection);
        }
        Command::Ingest { file } => {
            let source = read_faq_jsonl(Path::new(&file)).with_context(|| format!("reading {file}"))?;

            for line in &source.skipped {
                warn!(line = line.line, reason = %line.reason, "skipped source line");
            }

            let pipeline =
                IngestionPipeline::new(embedder, index).with_max_attempts(cli.max_attempts);

            let started = Instant::now();
            let report = pipeline.ingest(&source.records, &cli.collection).await?;
            print_elapsed(started, "ingest faq file");

            for record in &report.skipped {
                warn!(faq_id = %record.faq_id, reason = %record.reason, "skipped faq record");
            }

            println!(
                "{} records ingested, {} skipped ({} unparseable lines)",
                report.ingested.len(),
                report.skipped.len(),
                source.skipped.len()
            );
        }
        Command::Search { top_k } => {
            let pipeline = SearchPipeline::new(embedder, index).with_max_attempts(cli.max_attempts);

            println!("Type your search query (or :q to quit)");
            let stdin = io::stdin();

            loop {
                print!("Query : ");
                io::stdout().flush()?;

                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }

                let query = line.trim();
                if query == ":q" {
                    println!("Exiting. Goodbye!");
                    break;
                }
                if query.is_empty() {
                    continue;
                }

                let started = Instant::now();
                match pipeline.search(query, top_k, &cli.collection).await {
                    Ok(results) => {
                        print_elapsed(started, "search faq");
                        if results.is_empty() {
                            println!("Search query did not match any faq");
                        }
                        for result in results {
                            println!(
                                "[{}] score={:.4} {} - {}",
                                result.id, result.score, result.title, result.description
                            );
                        }
                    }
                    Err(error) => {
                        warn!(error = %error, "search failed");
                        println!("search failed: {error}");
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_elapsed(started: Instant, action: &str) {
    let elapsed = started.elapsed();
    println!(
        "Time taken to {} is {:.2}s ({} ms)",
        action,
        elapsed.as_secs_f64(),
        elapsed.as_millis()
    );
}
