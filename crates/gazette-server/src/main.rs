//! Gazette: historical newspaper OCR archive server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gazette_core::GazetteConfig;
use gazette_resolve::{SearchEngine, SearchMode, DEFAULT_LIMIT};
use gazette_runtime::PipelineContext;
use gazette_server::{build_router, AppState};
use gazette_store::SqliteStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("GAZETTE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn open_store(config: &GazetteConfig) -> anyhow::Result<SqliteStore> {
    SqliteStore::open(&config.data_paths.db)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))
}

fn print_help() {
    println!("Gazette — historical newspaper OCR archive");
    println!();
    println!("Usage: gazette [command]");
    println!();
    println!("Commands:");
    println!("  (none) | serve                        Start the HTTP server");
    println!("  process <file> [name]                 Ingest one PDF or image");
    println!("  search <query> [content|keyword] [n]  Search stored articles (default: content)");
    println!("  help                                  Show this help message");
    println!();
    println!("Environment: GAZETTE_DATA_DIR, PORT, POPPLER_PATH, GAZETTE_RECOGNIZER,");
    println!("             RENDER_DPI, KEYWORD_TOP_K, MAX_UPLOAD_MB, GAZETTE_USER_DICT,");
    println!("             RUST_LOG");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("serve") => serve().await,
        Some("process") => {
            let Some(file) = args.get(2) else {
                eprintln!("Usage: gazette process <file> [name]");
                std::process::exit(1);
            };
            process(Path::new(file), args.get(3).map(String::as_str))
        }
        Some("search") => {
            let Some(query) = args.get(2) else {
                eprintln!("Usage: gazette search <query> [keyword|content] [limit]");
                std::process::exit(1);
            };
            let mode: SearchMode = match args.get(3) {
                Some(m) => m.parse()?,
                None => SearchMode::default(),
            };
            let limit = match args.get(4) {
                Some(n) => n.parse()?,
                None => DEFAULT_LIMIT,
            };
            search(query, mode, limit)
        }
        Some("--help" | "-h" | "help") => {
            print_help();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}. Use 'gazette help' for usage.", other);
            std::process::exit(1);
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = GazetteConfig::from_env(&data_dir)?;
    let port = config.port;
    let store = open_store(&config)?;
    let pipeline = PipelineContext::initialize(&config)?;
    if !pipeline.recognizer_available() {
        tracing::warn!("Recognition engine unavailable; uploads will fail until one is configured");
    }

    let state = Arc::new(AppState::new(config, store, pipeline));
    let app = build_router(state.clone());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gazette server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.pipeline.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn process(file: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let config = GazetteConfig::from_env(resolve_data_dir())?;
    let store = open_store(&config)?;
    let pipeline = PipelineContext::initialize(&config)?;

    let result = pipeline.process_document(&store, file, name);
    pipeline.shutdown();
    let id = result?;

    let detail = store.get_newspaper_detail(id)?;
    let pages = detail.map(|d| d.pages.len()).unwrap_or(0);
    println!("Processed {} as newspaper {} ({} page(s))", file.display(), id, pages);
    Ok(())
}

fn search(query: &str, mode: SearchMode, limit: usize) -> anyhow::Result<()> {
    let config = GazetteConfig::from_env(resolve_data_dir())?;
    let store = open_store(&config)?;
    let results = SearchEngine::new(&store).search(query, mode, limit)?;

    if results.is_empty() {
        println!("No articles match '{}'", query);
        return Ok(());
    }
    for hit in &results {
        println!(
            "[{}] {} — {} p.{} {}",
            hit.id,
            hit.title,
            hit.newspaper,
            hit.page_number,
            hit.date.as_deref().unwrap_or("")
        );
        println!("    {}", hit.content.replace('\n', " "));
        if !hit.keywords.is_empty() {
            println!("    keywords: {}", hit.keywords.join(", "));
        }
    }
    Ok(())
}
