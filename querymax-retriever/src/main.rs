use clap::{Parser, Subcommand};
use querymax_retriever::{
    RetrievalConfig, RetrievalService, demo,
    schema::{SchemaIntrospector, SchemaSnapshot},
    storage::database::Database,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Schema-aware semantic retrieval over a SQLite database.
///
/// Settings default to the QM_DB_PATH, QM_OLLAMA_URL, QM_EMBED_MODEL and
/// QM_TOPK environment variables; flags override them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQLite database holding the schema and the retrieval index
    #[arg(long)]
    db: Option<PathBuf>,

    /// Base URL of the embedding service
    #[arg(long)]
    ollama_url: Option<String>,

    /// Embedding model name
    #[arg(long)]
    embed_model: Option<String>,

    /// Default number of documents returned by `retrieve`
    #[arg(long)]
    top_k: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the retrieval index tables
    Init,
    /// Print the live schema
    Schema {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Regenerate the document corpus from the live schema
    Rebuild,
    /// Print the schema documents most relevant to a question
    Retrieve {
        /// Natural-language question
        question: String,
        /// Number of documents to return
        #[arg(short)]
        k: Option<usize>,
    },
    /// Show index statistics
    Stats {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Show row counts of the database tables
    Dbinfo {
        /// Also list internal tables (sqlite_, rag_, cache_, _ai_)
        #[arg(long)]
        include_internal: bool,
    },
    /// Create the demo retail schema
    Demo {
        /// Create the tables without inserting demo rows
        #[arg(long)]
        no_seed: bool,
    },
    /// Delete the database, recreate the demo schema and rebuild the index
    Reset {
        /// Recreate the tables without inserting demo rows
        #[arg(long)]
        no_seed: bool,
        /// Skip rebuilding the retrieval index
        #[arg(long)]
        no_rebuild: bool,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Full,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "full" => Ok(OutputFormat::Full),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct SchemaOutput<'a> {
    hash: &'a str,
    text: &'a str,
    snapshot: &'a SchemaSnapshot,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RebuildOutcome {
    Indexed {
        documents_indexed: usize,
        embedding_dim: usize,
        duration_ms: f64,
    },
    Failed {
        error: String,
    },
}

#[derive(Serialize)]
struct ResetOutput {
    deleted_db: bool,
    reseeded: bool,
    rebuild: Option<RebuildOutcome>,
    table_counts: BTreeMap<String, Option<i64>>,
    duration_ms: f64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn load_config(args: &Args) -> anyhow::Result<RetrievalConfig> {
    let mut config = RetrievalConfig::from_env()?;
    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    if let Some(url) = &args.ollama_url {
        config.embed.base_url = url.clone();
    }
    if let Some(model) = &args.embed_model {
        config.embed.model_name = model.clone();
    }
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }
    Ok(config)
}

/// Remove the database file and its WAL side files.
///
/// Returns whether the main file existed.
fn remove_database(path: &Path) -> io::Result<bool> {
    let mut existed = false;
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_os_string();
        file.push(suffix);
        match std::fs::remove_file(&file) {
            Ok(()) => existed |= suffix.is_empty(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(existed)
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command {
        Commands::Init => {
            let db = Database::open(&config.db_path).await?;
            db.close().await;
            println!("Initialized retrieval tables in {}", config.db_path.display());
            Ok(())
        }
        Commands::Schema { format } => {
            let (service, _db) = RetrievalService::open(&config).await?;
            let context = service.get_schema_context().await?;

            match format {
                OutputFormat::Json => {
                    let output = SchemaOutput {
                        hash: &context.hash,
                        text: &context.text,
                        snapshot: &context.snapshot,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Summary => {
                    println!("Schema hash: {}", context.hash);
                    println!("Tables: {}", context.snapshot.tables.len());
                    println!("{}", context.text);
                }
                OutputFormat::Full => {
                    println!("Schema hash: {}", context.hash);
                    for (name, table) in &context.snapshot.tables {
                        println!("\n{name}");
                        for column in &table.columns {
                            println!(
                                "  {} {}{}{}",
                                column.name,
                                column.declared_type,
                                if column.primary_key { " PRIMARY KEY" } else { "" },
                                if column.nullable { "" } else { " NOT NULL" }
                            );
                        }
                        for fk in &table.foreign_keys {
                            println!(
                                "  FOREIGN KEY ({}) REFERENCES {}({})",
                                fk.from,
                                fk.table,
                                fk.to.as_deref().unwrap_or("")
                            );
                        }
                    }
                }
            }
            Ok(())
        }
        Commands::Rebuild => {
            let (service, _db) = RetrievalService::open(&config).await?;
            service.startup().await?;
            let report = service.rebuild_from_schema().await?;
            println!("Documents indexed: {}", report.documents_indexed);
            println!("Embedding dimension: {}", report.embedding_dim);
            println!("Duration: {:.1} ms", report.duration_ms());
            Ok(())
        }
        Commands::Retrieve { question, k } => {
            let (service, _db) = RetrievalService::open(&config).await?;
            service.startup().await?;
            let results = service.retrieve(&question, k).await?;
            if results.is_empty() {
                println!("No documents indexed; run `rebuild` first");
            }
            for text in results {
                println!("{text}");
            }
            Ok(())
        }
        Commands::Stats { format } => {
            let (service, _db) = RetrievalService::open(&config).await?;
            service.startup().await?;
            let stats = service.stats().await?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                }
                OutputFormat::Summary | OutputFormat::Full => {
                    println!("Index Statistics:");
                    println!("  Documents: {}", stats.documents);
                    println!("  Embedding dimension: {}", stats.embed_dim);
                    println!(
                        "  Last schema hash: {}",
                        stats.last_hash.as_deref().unwrap_or("none")
                    );
                    println!(
                        "  Last rebuilt at: {}",
                        stats.last_rebuilt_at.as_deref().unwrap_or("never")
                    );
                    if format == OutputFormat::Full {
                        println!("  Database: {}", config.db_path.display());
                        println!("  Embedding model: {}", config.embed.model_name);
                        println!("  Embedding endpoint: {}", config.embed.endpoint_url());
                        println!("  Default top-k: {}", config.top_k);
                    }
                }
            }
            Ok(())
        }
        Commands::Dbinfo { include_internal } => {
            let db = Database::open(&config.db_path).await?;
            let counts = SchemaIntrospector::new(db.pool().clone())
                .table_counts(include_internal)
                .await?;

            println!("Tables in {}:", config.db_path.display());
            for (table, count) in counts {
                match count {
                    Some(count) => println!("  {table}: {count} rows"),
                    None => println!("  {table}: unreadable"),
                }
            }
            Ok(())
        }
        Commands::Demo { no_seed } => {
            let db = Database::open(&config.db_path).await?;
            demo::init_schema(db.pool()).await?;
            println!("Created {} demo tables", demo::DEMO_TABLES.len());

            if !no_seed {
                if demo::seed(db.pool()).await? {
                    println!("Inserted demo rows");
                } else {
                    println!("Demo rows already present");
                }
            }
            db.close().await;
            Ok(())
        }
        Commands::Reset {
            no_seed,
            no_rebuild,
            format,
        } => {
            let started = Instant::now();
            let deleted_db = remove_database(&config.db_path)?;

            let (service, db) = RetrievalService::open(&config).await?;
            demo::init_schema(db.pool()).await?;
            let reseeded = !no_seed && demo::seed(db.pool()).await?;
            service.startup().await?;

            // Rebuild failures are reported in the output, not returned
            let rebuild = if no_rebuild {
                None
            } else {
                Some(match service.rebuild_from_schema().await {
                    Ok(report) => RebuildOutcome::Indexed {
                        documents_indexed: report.documents_indexed,
                        embedding_dim: report.embedding_dim,
                        duration_ms: report.duration_ms(),
                    },
                    Err(e) => {
                        tracing::warn!("Rebuild after reset failed: {}", e);
                        RebuildOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                })
            };

            let table_counts = SchemaIntrospector::new(db.pool().clone())
                .table_counts(false)
                .await?;
            db.close().await;

            let output = ResetOutput {
                deleted_db,
                reseeded,
                rebuild,
                table_counts,
                duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            };

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Summary | OutputFormat::Full => {
                    println!("Reset {}", config.db_path.display());
                    println!("  Deleted database: {}", output.deleted_db);
                    println!("  Reseeded: {}", output.reseeded);
                    match &output.rebuild {
                        None => println!("  Rebuild: skipped"),
                        Some(RebuildOutcome::Indexed {
                            documents_indexed,
                            embedding_dim,
                            duration_ms,
                        }) => println!(
                            "  Rebuild: {documents_indexed} documents, dimension {embedding_dim}, {duration_ms:.1} ms"
                        ),
                        Some(RebuildOutcome::Failed { error }) => {
                            println!("  Rebuild failed: {error}")
                        }
                    }
                    println!("  Tables:");
                    for (table, count) in &output.table_counts {
                        match count {
                            Some(count) => println!("    {table}: {count} rows"),
                            None => println!("    {table}: unreadable"),
                        }
                    }
                    println!("  Duration: {:.1} ms", output.duration_ms);
                }
            }
            Ok(())
        }
    }
}
