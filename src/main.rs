use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qrserve::{routes, AppState, Config, PngQrEncoder};

#[derive(Parser, Debug)]
#[command(name = "qrserve")]
#[command(about = "Static media server with scannable QR codes for every file")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "QRSERVE_PORT", default_value = "3000")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "QRSERVE_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Directory of media files to serve
    #[arg(short, long, env = "QRSERVE_ROOT", default_value = "public")]
    root: PathBuf,

    /// Base URL advertised inside generated QR codes
    #[arg(long, env = "QRSERVE_HOST", default_value = "http://localhost:3000")]
    host: String,

    /// Generate QR codes for every file, print the report, and exit
    #[arg(short, long, env = "QRSERVE_GENERATE")]
    generate: bool,

    /// Enable verbose logging
    #[arg(short, long, env = "QRSERVE_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "QRSERVE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "qrserve=debug,tower_http=debug"
    } else {
        "qrserve=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    // Resolve media directory to absolute path
    let media_root = cli.root.canonicalize().unwrap_or_else(|_| cli.root.clone());

    if !media_root.exists() {
        return Err(format!("Media directory does not exist: {}", media_root.display()).into());
    }

    if !media_root.is_dir() {
        return Err(format!("Media path is not a directory: {}", media_root.display()).into());
    }

    let base_host = cli.host.trim_end_matches('/').to_string();

    // One-shot batch mode replaces the server loop
    if cli.generate {
        let report = qrserve::batch::run(
            &media_root,
            &base_host,
            &config.qr_dir,
            &config.render,
            &PngQrEncoder,
        )?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    info!("Serving media from: {}", media_root.display());
    info!("Advertised base URL: {}", base_host);

    let state = AppState::new(media_root, base_host, config);

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .merge(routes::media_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    info!("Starting qrserve on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
