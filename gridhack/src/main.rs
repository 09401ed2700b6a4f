//! Gridhack game server entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gridhack::api::{self, AppState, GameState};
use gridhack::config::ServerConfig;
use gridhack_core::account::AccountStore;
use gridhack_core::fs::Vfs;
use gridhack_core::mission::MissionTable;

#[derive(Parser)]
#[command(name = "gridhack")]
#[command(about = "Gridhack game server")]
struct Cli {
    /// Path to the server configuration file
    #[arg(short, long, default_value = "server.json")]
    config: PathBuf,

    /// Listen address override (host:port)
    #[arg(long)]
    addr: Option<String>,

    /// Account save directory override
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(&cli.config)?;
    let addr = cli.addr.unwrap_or_else(|| config.listen_addr());
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir.clone());

    let accounts = AccountStore::new(&data_dir)?;
    let missions = match &config.missions_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read mission file {path:?}"))?;
            MissionTable::from_json(&text)?
        }
        None => MissionTable::builtin(),
    };

    let game = Arc::new(Mutex::new(GameState::new(Vfs::game_world(), missions)));
    let app = axum::Router::new()
        .merge(api::router(AppState {
            game: game.clone(),
            accounts,
        }))
        .route("/health", axum::routing::get(|| async { "OK" }));

    tokio::spawn(gridhack::admin::console(game));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "gridhack server listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
