//! Drives the real interactive shell against a live server: the connect
//! handshake, remote dispatch, kick delivery, and degradation back to
//! local mode when the server goes away.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::util::ServiceExt;

use gridhack::api::{self, AppState, GameState};
use gridhack_core::account::AccountStore;
use gridhack_core::fs::Vfs;
use gridhack_core::mission::MissionTable;
use gridhack_shell::link::Link;
use gridhack_shell::remote::Remote;
use gridhack_shell::shell::Shell;

struct TestServer {
    base: String,
    state: AppState,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

async fn spawn_server(data_dir: &std::path::Path) -> TestServer {
    let state = AppState {
        game: Arc::new(Mutex::new(GameState::new(
            Vfs::game_world(),
            MissionTable::builtin(),
        ))),
        accounts: AccountStore::new(data_dir).unwrap(),
    };
    let app = api::router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(axum::serve(listener, app.into_make_service()).into_future());
    TestServer {
        base: format!("http://{addr}"),
        state,
        handle,
    }
}

fn shell_for(
    local_dir: &std::path::Path,
    username: &str,
    base: &str,
    poll: Duration,
) -> Shell<Vec<u8>> {
    let store = AccountStore::new(local_dir).unwrap();
    let account = store.register(username).unwrap();
    let link = Link::new(Remote::new(base).unwrap(), poll);
    Shell::new(store, account, link, Vec::new())
}

#[tokio::test]
async fn connect_registers_and_dispatches_remotely() {
    let tempdir = tempfile::tempdir().unwrap();
    let server = spawn_server(&tempdir.path().join("cloud")).await;
    let mut shell = shell_for(
        &tempdir.path().join("local"),
        "alice",
        &server.base,
        Duration::from_secs(60),
    );

    shell.execute("connect").await.unwrap();
    assert!(shell.link().is_connected());
    // The handshake registered the account server-side.
    assert!(!server.state.accounts.is_available("alice"));

    shell.execute("help").await.unwrap();
    shell.execute("cd documents").await.unwrap();
    shell.execute("cat mission1.txt").await.unwrap();
    shell.execute("chat hello from the shell").await.unwrap();
    shell.execute("connect").await.unwrap();

    let game = server.state.game.lock().await;
    assert_eq!(game.chat.history().len(), 1);
    assert_eq!(game.chat.history()[0].sender, "alice");
    assert_eq!(
        game.sessions.get("alice").unwrap().to_string(),
        "/root/home/user/documents"
    );
    drop(game);

    let out = String::from_utf8(shell.into_writer()).unwrap();
    assert!(out.contains("Connected as alice."));
    assert!(out.contains("Server commands:"));
    assert!(out.contains("Echoes back the arguments provided"));
    assert!(out.contains("moved to /root/home/user/documents"));
    assert!(out.contains("access_code"));
    assert!(out.contains("Already connected."));

    server.handle.abort();
}

#[tokio::test]
async fn second_connect_reconnects_instead_of_registering() {
    let tempdir = tempfile::tempdir().unwrap();
    let server = spawn_server(&tempdir.path().join("cloud")).await;

    let mut shell = shell_for(
        &tempdir.path().join("local"),
        "bob",
        &server.base,
        Duration::from_secs(60),
    );
    shell.execute("connect").await.unwrap();
    shell.execute("disconnect").await.unwrap();
    assert!(!shell.link().is_connected());
    shell.execute("connect").await.unwrap();
    assert!(shell.link().is_connected());

    let out = String::from_utf8(shell.into_writer()).unwrap();
    assert!(out.contains("Disconnected from server."));
    // No duplicate-registration complaint on the way back in.
    assert!(!out.contains("already exists"));

    server.handle.abort();
}

#[tokio::test]
async fn failed_request_degrades_to_local_mode() {
    let tempdir = tempfile::tempdir().unwrap();
    let server = spawn_server(&tempdir.path().join("cloud")).await;
    let mut shell = shell_for(
        &tempdir.path().join("local"),
        "carol",
        &server.base,
        Duration::from_secs(60),
    );

    shell.execute("connect").await.unwrap();
    assert!(shell.link().is_connected());

    // Kill the server out from under the session.
    server.handle.abort();
    tokio::time::sleep(Duration::from_millis(100)).await;

    shell.execute("ls").await.unwrap();
    assert!(!shell.link().is_connected());

    // Always-local commands still work, and the next `ls` is served by
    // the offline world.
    shell.execute("help").await.unwrap();
    shell.execute("ls").await.unwrap();

    let out = String::from_utf8(shell.into_writer()).unwrap();
    assert!(out.contains("Connection lost"));
    assert!(out.contains("Offline commands:"));
    assert!(out.contains("bin/  documents/"));
}

#[tokio::test]
async fn connect_refused_leaves_local_play_available() {
    let tempdir = tempfile::tempdir().unwrap();
    // Bind a port, then free it: nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut shell = shell_for(
        &tempdir.path().join("local"),
        "dana",
        &base,
        Duration::from_secs(60),
    );
    shell.execute("connect").await.unwrap();
    assert!(!shell.link().is_connected());
    shell.execute("ls").await.unwrap();

    let out = String::from_utf8(shell.into_writer()).unwrap();
    assert!(out.contains("Could not reach the server"));
    assert!(out.contains("Local play remains available."));
    assert!(out.contains("bin/  documents/"));
}

#[tokio::test]
async fn kick_reaches_the_client_through_the_poll() {
    let tempdir = tempfile::tempdir().unwrap();
    let server = spawn_server(&tempdir.path().join("cloud")).await;
    let mut shell = shell_for(
        &tempdir.path().join("local"),
        "eve",
        &server.base,
        Duration::from_millis(100),
    );

    shell.execute("connect").await.unwrap();
    assert!(!shell.link().kicked());

    server.state.game.lock().await.moderation.kick("eve");
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(shell.link().kicked());

    server.handle.abort();
}

#[tokio::test]
async fn command_table_is_advertised() {
    let tempdir = tempfile::tempdir().unwrap();
    let state = AppState {
        game: Arc::new(Mutex::new(GameState::new(
            Vfs::game_world(),
            MissionTable::builtin(),
        ))),
        accounts: AccountStore::new(tempdir.path()).unwrap(),
    };
    let app: Router = api::router(state);

    let req = axum::http::Request::builder()
        .method("GET")
        .uri("/commands")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.status().is_success());
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("\"echo\""));
    assert!(text.contains("Echoes back the arguments provided"));
}
