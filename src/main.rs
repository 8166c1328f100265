use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use partner_match::{db, routes, AppState, Config};

const DEFAULT_CONFIG_PATH: &str = "./etc/partner-match.toml";
const FALLBACK_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);

fn print_usage() {
    println!("Usage: partner-match [OPTIONS]");
    println!("Options:");
    println!("  -config <path>  Path to configuration file (default: {})", DEFAULT_CONFIG_PATH);
    println!("  -help, --help   Print this help message");
}

/// Value following `-config`, if any
fn config_path_from(args: &[String]) -> String {
    args.iter()
        .skip_while(|arg| arg.as_str() != "-config")
        .nth(1)
        .cloned()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

fn init_tracing(level: &str) {
    // RUST_LOG wins over the config file
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-help" || arg == "--help") {
        print_usage();
        return Ok(());
    }

    let config_path = config_path_from(&args);

    // Logging is configured from the file, so load it before anything logs
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Could not load config file: {}, using defaults", e);
        Config::default()
    });
    init_tracing(&config.log.level);

    info!("Starting Partner Match server, config: {}", config_path);

    let db_conn = db::init_database(&config.database).await.map_err(|e| {
        tracing::error!("Database initialization failed: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;

    let addr: SocketAddr = config.addr.parse().unwrap_or_else(|_| {
        warn!("Invalid address '{}', using default 0.0.0.0:8080", config.addr);
        SocketAddr::from(FALLBACK_ADDR)
    });

    let app = routes::create_router(AppState::new(db_conn, config));

    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
