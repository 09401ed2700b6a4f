//! Operator console: a line-oriented loop on stdin that mutates the same
//! moderation sets the request handlers consult, under the same lock.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::info;

use crate::api::GameState;

const HELP: &str = "admin commands: mute <user> | unmute <user> | ban <user> | unban <user> \
                    | kick <user> | muted | banned | help";

pub async fn console(game: Arc<Mutex<GameState>>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let arg = parts.next();
        let mut game = game.lock().await;
        match (cmd, arg) {
            ("mute", Some(user)) => {
                game.moderation.mute(user);
                info!(user, "muted by operator");
                println!("{user} muted");
            }
            ("unmute", Some(user)) => {
                if game.moderation.unmute(user) {
                    println!("{user} unmuted");
                } else {
                    println!("{user} was not muted");
                }
            }
            ("ban", Some(user)) => {
                game.moderation.ban(user);
                info!(user, "banned by operator");
                println!("{user} banned");
            }
            ("unban", Some(user)) => {
                if game.moderation.unban(user) {
                    println!("{user} unbanned");
                } else {
                    println!("{user} was not banned");
                }
            }
            ("kick", Some(user)) => {
                game.moderation.kick(user);
                info!(user, "kick queued by operator");
                println!("{user} will be kicked on their next poll");
            }
            ("muted", None) => println!("muted: {}", game.moderation.muted_users().join(", ")),
            ("banned", None) => println!("banned: {}", game.moderation.banned_users().join(", ")),
            ("help", _) => println!("{HELP}"),
            _ => println!("unknown admin command: {line}"),
        }
    }
}
