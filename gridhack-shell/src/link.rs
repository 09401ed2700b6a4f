//! Connectivity: the Remote/Local mode state machine and the background
//! poll task that watches for kicks and new chat while connected.
//!
//! The rules are deliberately simple: connecting is user-initiated with a
//! bounded handshake and no retry loop, and any failed authoritative
//! request drops the link so every later command runs locally until the
//! user reconnects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use gridhack_core::account::Account;
use gridhack_core::proto::{CommandInfo, Outcome};

use crate::remote::{LinkError, Remote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

pub struct Link {
    remote: Remote,
    state: LinkState,
    /// Set by the poll task when the server reports a forced kick; read
    /// by the prompt loop before each command.
    kicked: Arc<AtomicBool>,
    poll: Option<JoinHandle<()>>,
    poll_interval: Duration,
    remote_commands: Vec<CommandInfo>,
}

impl Link {
    pub fn new(remote: Remote, poll_interval: Duration) -> Self {
        Link {
            remote,
            state: LinkState::Disconnected,
            kicked: Arc::new(AtomicBool::new(false)),
            poll: None,
            poll_interval,
            remote_commands: Vec::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    pub fn kicked(&self) -> bool {
        self.kicked.load(Ordering::SeqCst)
    }

    /// The command table the server advertised at connect time.
    pub fn remote_commands(&self) -> &[CommandInfo] {
        &self.remote_commands
    }

    /// User-initiated handshake: check the username against the server,
    /// then register (new there) or log a reconnection (known there). On
    /// any failure the link stays down and the report reminds the player
    /// that local play still works. Returns the text to display.
    pub async fn connect(&mut self, account: &Account) -> String {
        if self.is_connected() {
            return "Already connected.".to_string();
        }
        self.state = LinkState::Connecting;

        let available = match self.remote.check_username(&account.username).await {
            Ok(available) => available,
            Err(e) => return self.handshake_failed(e),
        };
        let outcome = if available {
            self.remote.register(&account.username).await
        } else {
            self.remote.reconnect(&account.username).await
        };
        match outcome {
            Ok(outcome) if outcome.is_success() => {}
            Ok(outcome) => {
                self.state = LinkState::Disconnected;
                return format!("Server refused the connection: {}", outcome.message);
            }
            Err(e) => return self.handshake_failed(e),
        }

        self.state = LinkState::Connected;
        self.kicked.store(false, Ordering::SeqCst);

        // Advisory extras: a failure here is not worth dropping the fresh
        // link over.
        self.remote_commands = self.remote.command_table().await.unwrap_or_default();
        let mut report = vec![format!("Connected as {}.", account.username)];
        let mut watermark = DateTime::<Utc>::UNIX_EPOCH;
        match self.remote.chat_history().await {
            Ok(history) => {
                for m in &history {
                    report.push(format!("[chat] {}: {}", m.sender, m.message));
                }
                if let Some(last) = history.last() {
                    watermark = last.timestamp;
                }
            }
            Err(e) => debug!(error = %e, "chat history fetch failed"),
        }
        self.spawn_poll(account.username.clone(), watermark);
        report.join("\n")
    }

    fn handshake_failed(&mut self, error: LinkError) -> String {
        self.state = LinkState::Disconnected;
        format!("Could not reach the server ({error}). Local play remains available.")
    }

    /// Best-effort teardown: tell the server, but a lost notification
    /// never stops the disconnect. Reports as a no-op when already down.
    pub async fn disconnect(&mut self, username: &str) -> String {
        if self.state == LinkState::Disconnected {
            return "Not connected.".to_string();
        }
        if let Err(e) = self.remote.disconnect(username).await {
            debug!(error = %e, "disconnect notification lost");
        }
        self.drop_link();
        "Disconnected from server.".to_string()
    }

    /// Forward a command verbatim for authoritative dispatch. A transport
    /// failure demotes the link and is reported as the command's error.
    pub async fn submit(&mut self, username: &str, command: &str, args: &[String]) -> Outcome {
        match self.remote.command(username, command, args).await {
            Ok(outcome) => outcome,
            Err(e) => self.demote("command", e),
        }
    }

    /// Push the account record to the server's cloud saves.
    pub async fn push_save(&mut self, account: &Account) -> Outcome {
        match self.remote.save(account).await {
            Ok(outcome) => outcome,
            Err(e) => self.demote("save", e),
        }
    }

    fn demote(&mut self, context: &str, error: LinkError) -> Outcome {
        warn!(context, error = %error, "authoritative request failed; dropping link");
        self.drop_link();
        Outcome::error(format!(
            "Connection lost ({context}: {error}). Falling back to local mode."
        ))
    }

    fn drop_link(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.abort();
        }
        self.remote_commands.clear();
        self.state = LinkState::Disconnected;
    }

    fn spawn_poll(&mut self, username: String, watermark: DateTime<Utc>) {
        let remote = self.remote.clone();
        let kicked = self.kicked.clone();
        let interval = self.poll_interval;
        self.poll = Some(tokio::spawn(poll_loop(
            remote, username, kicked, watermark, interval,
        )));
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.abort();
        }
    }
}

/// Background poll while connected: kick notices end the session, new
/// chat messages are printed and the watermark advanced past them so
/// nothing is ever re-delivered.
async fn poll_loop(
    remote: Remote,
    username: String,
    kicked: Arc<AtomicBool>,
    mut watermark: DateTime<Utc>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; skip it.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match remote.kicked(&username).await {
            Ok(true) => {
                println!();
                println!("** You have been kicked by an operator. Press Enter to exit. **");
                kicked.store(true, Ordering::SeqCst);
                return;
            }
            Ok(false) => {}
            Err(e) => debug!(error = %e, "kick poll failed"),
        }
        match remote.chat_since(watermark).await {
            Ok(messages) => {
                for m in &messages {
                    println!("[chat] {}: {}", m.sender, m.message);
                    if m.timestamp > watermark {
                        watermark = m.timestamp;
                    }
                }
            }
            Err(e) => debug!(error = %e, "chat poll failed"),
        }
    }
}
