use clap::Parser;
use relgraph_api::RestApi;
use relgraph_core::{Corpus, MemoryCorpus};
use relgraph_engine::{EngineConfig, RelatednessEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// A relatedness scoring engine over an in-memory document corpus
#[derive(Parser, Debug)]
#[command(name = "relgraph")]
#[command(about = "Relatedness scoring over a document corpus", long_about = None)]
struct Args {
    /// Newline-delimited JSON documents to load at startup
    #[arg(short, long)]
    corpus: Option<PathBuf>,

    /// Engine configuration (defaults and invariants) as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, default_value_t = 8983)]
    http_port: u16,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Worker threads for count and facet tasks; overrides the config file
    #[arg(long)]
    worker_threads: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting relgraph v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP API port: {}", args.http_port);

    let mut config = match &args.config {
        Some(path) => {
            info!("Configuration: {:?}", path);
            EngineConfig::from_file(path)?
        }
        None => EngineConfig::default(),
    };
    if args.worker_threads.is_some() {
        config.worker_threads = args.worker_threads;
    }

    let corpus = Arc::new(MemoryCorpus::new());
    match &args.corpus {
        Some(path) => {
            corpus.load_jsonl(path)?;
        }
        None => warn!("No corpus given; starting empty (index documents with PUT /documents)"),
    }
    info!("Corpus ready: {} documents, {} fields", corpus.len(), corpus.fields().len());

    let engine_corpus: Arc<dyn Corpus> = corpus.clone();
    let engine = Arc::new(RelatednessEngine::new(engine_corpus, config)?);
    info!("Engine initialized with {} worker threads", engine.pool().threads());

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(engine, corpus, http_port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("relgraph started successfully");
    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
