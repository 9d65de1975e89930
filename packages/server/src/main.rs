use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, info};

use filedrop::config::AppConfig;
use filedrop::database::init_db;
use filedrop::state::AppState;

#[derive(Parser)]
#[command(name = "filedrop", version, about = "File drop server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create the database schema and the upload directory, then exit.
    Initdb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load config")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Initdb => initdb(config).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let db = init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    let state = AppState::new(config.clone(), db)
        .await
        .context("Failed to open upload directory")?;

    let app = filedrop::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!(
        upload_dir = %config.storage.upload_dir.display(),
        "Server running at http://{}", addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn initdb(config: AppConfig) -> anyhow::Result<()> {
    let db = init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    AppState::new(config, db)
        .await
        .context("Failed to create upload directory")?;

    println!("Initialized the database.");
    Ok(())
}
