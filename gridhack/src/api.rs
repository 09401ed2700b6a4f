//! HTTP API layer: the remote protocol over the shared game state.
//!
//! All world state sits behind one coarse lock; the workload is
//! human-paced, so handlers simply take the lock for the duration of a
//! request. Account files are written per-request with no cross-request
//! locking; concurrent saves to the same account are last-write-wins.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use gridhack_core::account::{Account, AccountError, AccountStore};
use gridhack_core::chat::{ChatLog, ChatMessage, Moderation};
use gridhack_core::command::{command_table, Command, CommandError};
use gridhack_core::fs::{render_listing, Location, Vfs};
use gridhack_core::mission::MissionTable;
use gridhack_core::proto::{
    AvailabilityResponse, ChatSinceQuery, CommandInfo, CommandRequest, KickedResponse, Outcome,
    SaveRequest, UsernameRequest,
};

/// Everything the server owns in memory: the world tree, the mission
/// table, the chat log, moderation sets, and the authoritative per-player
/// locations for live sessions.
pub struct GameState {
    pub vfs: Vfs,
    pub missions: MissionTable,
    pub chat: ChatLog,
    pub moderation: Moderation,
    pub sessions: HashMap<String, Location>,
}

impl GameState {
    pub fn new(vfs: Vfs, missions: MissionTable) -> Self {
        GameState {
            vfs,
            missions,
            chat: ChatLog::new(),
            moderation: Moderation::new(),
            sessions: HashMap::new(),
        }
    }
}

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<Mutex<GameState>>,
    pub accounts: AccountStore,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/check_username", post(check_username))
        .route("/register", post(register))
        .route("/reconnect", post(reconnect))
        .route("/disconnect", post(disconnect))
        .route("/save", post(save))
        .route("/command", post(command))
        .route("/chat/history", get(chat_history))
        .route("/chat/since", get(chat_since))
        .route("/kicked/{username}", get(kicked))
        .route("/commands", get(commands))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A saved location can stop resolving when the world tree changes shape
/// between runs. Resume from the start location instead of failing the
/// session.
fn clamped_location(vfs: &Vfs, account: &Account) -> Location {
    if vfs.contains(&account.location) {
        account.location.clone()
    } else {
        warn!(
            username = %account.username,
            location = %account.location,
            "saved location no longer resolves; clamping to start"
        );
        Location::start()
    }
}

async fn check_username(
    State(state): State<AppState>,
    Json(req): Json<UsernameRequest>,
) -> Json<AvailabilityResponse> {
    Json(AvailabilityResponse {
        is_available: state.accounts.is_available(&req.username),
    })
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<UsernameRequest>,
) -> Json<Outcome> {
    match state.accounts.register(&req.username) {
        Ok(account) => {
            let mut game = state.game.lock().await;
            game.sessions
                .insert(account.username.clone(), account.location.clone());
            info!(username = %account.username, "new account registered");
            Json(Outcome::success("User created."))
        }
        Err(e @ AccountError::UsernameTaken(_)) => {
            warn!(username = %req.username, "registration attempt for existing user");
            Json(Outcome::error(e.to_string()))
        }
        Err(e) => Json(Outcome::error(e.to_string())),
    }
}

async fn reconnect(
    State(state): State<AppState>,
    Json(req): Json<UsernameRequest>,
) -> Json<Outcome> {
    let account = match state.accounts.load(&req.username) {
        Ok(account) => account,
        Err(AccountError::UnknownUser(name)) => {
            return Json(Outcome::error(format!(
                "No account for '{name}'. Register first."
            )));
        }
        Err(e) => return Json(Outcome::error(e.to_string())),
    };
    let mut game = state.game.lock().await;
    let location = clamped_location(&game.vfs, &account);
    game.sessions.insert(account.username.clone(), location);
    info!(username = %req.username, "user reconnected");
    Json(Outcome::success("Reconnection logged."))
}

async fn disconnect(
    State(state): State<AppState>,
    Json(req): Json<UsernameRequest>,
) -> Json<Outcome> {
    let mut game = state.game.lock().await;
    game.sessions.remove(&req.username);
    info!(username = %req.username, "client disconnected");
    Json(Outcome::success("Disconnect logged."))
}

async fn save(State(state): State<AppState>, Json(req): Json<SaveRequest>) -> Json<Outcome> {
    let mut data = req.data;
    data.username = req.username.clone();
    {
        // While a session is live the server's location is the record of
        // authority; the client's copy may be stale.
        let game = state.game.lock().await;
        if let Some(location) = game.sessions.get(&req.username) {
            data.location = location.clone();
        }
    }
    info!(username = %req.username, "saving client progress");
    match state.accounts.save(&data) {
        Ok(()) => Json(Outcome::success("Progress saved to server.")),
        Err(e) => {
            warn!(username = %req.username, error = %e, "save failed");
            Json(Outcome::error("Failed to save progress on server."))
        }
    }
}

async fn command(State(state): State<AppState>, Json(req): Json<CommandRequest>) -> Json<Outcome> {
    let cmd = match Command::parse(&req.command, &req.args) {
        Ok(cmd) => cmd,
        Err(CommandError::Unknown(name)) => {
            return Json(Outcome::error(format!(
                "Command '{name}' not found on server."
            )));
        }
        Err(e @ CommandError::Usage(_)) => return Json(Outcome::error(e.to_string())),
    };

    let mut game = state.game.lock().await;
    let Some(location) = game.sessions.get(&req.username).cloned() else {
        return Json(Outcome::error("Not connected. Reconnect first."));
    };

    let outcome = match cmd {
        Command::List => match game.vfs.list(&location) {
            Ok(entries) => Outcome::success(render_listing(&entries)),
            Err(e) => Outcome::error(e.to_string()),
        },
        Command::ChangeDir { target } => match game.vfs.change_dir(&location, &target) {
            Ok(new_location) => {
                let message = format!("moved to {new_location}");
                game.sessions.insert(req.username.clone(), new_location);
                Outcome::success(message)
            }
            Err(e) => Outcome::error(e.to_string()),
        },
        Command::ReadFile { name } => match game.vfs.read_file(&location, &name) {
            Ok(content) => Outcome::success(content.to_string()),
            Err(e) => Outcome::error(e.to_string()),
        },
        Command::Chat { message } => match game.moderation.check(&req.username) {
            Ok(()) => {
                game.chat.append(&req.username, &message);
                Outcome::success("Message sent.")
            }
            Err(e) => Outcome::error(e.to_string()),
        },
        Command::Hack { mission, password } => {
            let Some(mission) = mission else {
                return Json(Outcome::error("usage: hack <mission-id> <password>"));
            };
            let outcome = game.missions.attempt(mission, &password);
            if let gridhack_core::mission::HackOutcome::Hacked(_) = outcome {
                info!(username = %req.username, mission, "mission hacked");
            }
            if outcome.is_success() {
                Outcome::success(outcome.message())
            } else {
                Outcome::error(outcome.message())
            }
        }
        Command::Echo { args } => Outcome::success(args.join(" ")),
    };
    Json(outcome)
}

async fn chat_history(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    let game = state.game.lock().await;
    Json(game.chat.history().to_vec())
}

async fn chat_since(
    State(state): State<AppState>,
    Query(query): Query<ChatSinceQuery>,
) -> Json<Vec<ChatMessage>> {
    let game = state.game.lock().await;
    Json(game.chat.since(query.after))
}

async fn kicked(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Json<KickedResponse> {
    let mut game = state.game.lock().await;
    let kicked = game.moderation.take_kick(&username);
    if kicked {
        game.sessions.remove(&username);
        info!(username = %username, "kick delivered");
    }
    Json(KickedResponse { kicked })
}

async fn commands() -> Json<Vec<CommandInfo>> {
    Json(
        command_table()
            .into_iter()
            .map(|(name, description)| CommandInfo {
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect(),
    )
}
