//! lumen-api - Flashlight collection service
//!
//! Serves the record API by default. Admin subcommands create users and
//! issue credentials against the same database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lumen_common::api::{create_session, issue_api_token};
use lumen_common::config::LumenConfig;
use lumen_common::db::{create_user, init_database, load_user};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use lumen_api::{build_router, AppState};

/// Command-line arguments for lumen-api
#[derive(Parser, Debug)]
#[command(name = "lumen-api")]
#[command(about = "Flashlight collection service")]
#[command(version)]
struct Cli {
    /// Config file (overrides LUMEN_CONFIG and the platform default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true, env = "LUMEN_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Longest session `issue-session` will open (one year)
const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Socket address to listen on
        #[arg(long, env = "LUMEN_BIND")]
        bind: Option<String>,
    },
    /// Register a collection owner
    AddUser {
        #[arg(long)]
        email: String,
    },
    /// Issue a long-lived bearer token for a user
    IssueToken {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        label: Option<String>,
    },
    /// Open a browser session for a user
    IssueSession {
        #[arg(long)]
        user: Uuid,
        #[arg(
            long,
            default_value_t = 24 * 14,
            value_parser = clap::value_parser!(i64).range(1..=MAX_SESSION_TTL_HOURS)
        )]
        ttl_hours: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = LumenConfig::resolve(cli.config.as_deref())?;
    if let Some(path) = cli.database {
        config.database.path = Some(path);
    }

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lumen_api={0},lumen_common={0},tower_http=info", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting lumen-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            serve(pool, config).await
        }
        Command::AddUser { email } => {
            let user = create_user(&pool, &email).await?;
            println!("{}", user.guid);
            Ok(())
        }
        Command::IssueToken { user, label } => {
            ensure_user(&pool, user).await?;
            let token = issue_api_token(&pool, user, label.as_deref()).await?;
            println!("{}", token);
            Ok(())
        }
        Command::IssueSession { user, ttl_hours } => {
            ensure_user(&pool, user).await?;
            let token = create_session(&pool, user, session_ttl(ttl_hours)?).await?;
            println!("{}", token);
            Ok(())
        }
    }
}

fn session_ttl(hours: i64) -> Result<chrono::Duration> {
    chrono::Duration::try_hours(hours).with_context(|| format!("Session ttl out of range: {} hours", hours))
}

async fn ensure_user(pool: &sqlx::SqlitePool, user: Uuid) -> Result<()> {
    load_user(pool, user)
        .await?
        .map(|_| ())
        .with_context(|| format!("No such user: {}", user))
}

async fn serve(pool: sqlx::SqlitePool, config: LumenConfig) -> Result<()> {
    let bind = config.server.bind.clone();
    if config.import.create_missing_manufacturers {
        info!("Bulk import will create unknown manufacturers");
    }

    let app = build_router(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("lumen-api listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
