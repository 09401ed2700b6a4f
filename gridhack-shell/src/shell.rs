//! The interactive shell: prompt loop, the always-local command set, and
//! mode-dependent dispatch of everything else.
//!
//! Output goes through a generic writer so tests can drive the shell and
//! read back exactly what a player would have seen.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use gridhack_core::account::{Account, AccountStore};
use gridhack_core::command::{Command, CommandError};
use gridhack_core::fs::Location;

use crate::link::Link;
use crate::offline::OfflineWorld;

/// Result of executing a single command line.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandStatus {
    Continue,
    Quit,
}

pub struct Shell<W: Write> {
    store: AccountStore,
    account: Account,
    link: Link,
    offline: OfflineWorld,
    history: Vec<String>,
    writer: W,
}

impl<W: Write> Shell<W> {
    pub fn new(store: AccountStore, mut account: Account, link: Link, writer: W) -> Self {
        let offline = OfflineWorld::new();
        // A location saved under an older world layout may no longer
        // resolve; resume from the start location rather than stranding
        // the player somewhere that does not exist.
        if !offline.vfs().contains(&account.location) {
            warn!(
                username = %account.username,
                location = %account.location,
                "saved location no longer resolves; clamping to start"
            );
            account.location = Location::start();
        }
        Shell {
            store,
            account,
            link,
            offline,
            history: Vec::new(),
            writer,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Consume the shell and return the writer, for tests that inspect
    /// the transcript.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn prompt(&self) -> String {
        if self.link.is_connected() {
            format!("{}@grid> ", self.account.username)
        } else {
            format!("{}@local:{}> ", self.account.username, self.account.location)
        }
    }

    /// Read and execute commands until exit, EOF, ctrl-c, or a forced
    /// kick. Always attempts a local save on the way out.
    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            if self.link.kicked() {
                writeln!(self.writer, "Kicked by an operator. Saving and exiting.")?;
                break;
            }
            let prompt = self.prompt();
            write!(self.writer, "{prompt}")?;
            self.writer.flush()?;
            tokio::select! {
                line = lines.next_line() => match line? {
                    None => {
                        writeln!(self.writer)?;
                        break;
                    }
                    Some(line) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        if self.execute(&line).await? == CommandStatus::Quit {
                            break;
                        }
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    writeln!(self.writer)?;
                    break;
                }
            }
        }
        self.shutdown().await
    }

    /// Best-effort teardown: notify the server if connected, then save
    /// locally. Neither step failing aborts the other.
    async fn shutdown(&mut self) -> Result<()> {
        if self.link.is_connected() {
            let farewell = self.link.disconnect(&self.account.username).await;
            writeln!(self.writer, "{farewell}")?;
        }
        self.save_local()?;
        Ok(())
    }

    fn save_local(&mut self) -> Result<()> {
        match self.store.save(&self.account) {
            Ok(()) => writeln!(self.writer, "Progress saved locally.")?,
            Err(e) => writeln!(self.writer, "Could not save locally: {e}")?,
        }
        Ok(())
    }

    /// Execute a single command line.
    pub async fn execute(&mut self, line: &str) -> Result<CommandStatus> {
        self.history.push(line.to_string());
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(CommandStatus::Continue);
        };
        let args: Vec<String> = parts.map(str::to_string).collect();

        // The always-local set manages the connection itself or local
        // persistence and behaves identically in both modes.
        match name {
            "help" => self.help()?,
            "history" => {
                for (i, entry) in self.history.iter().enumerate() {
                    writeln!(self.writer, "{:>4}  {entry}", i + 1)?;
                }
            }
            "save" => {
                self.save_local()?;
                if self.link.is_connected() {
                    let outcome = self.link.push_save(&self.account).await;
                    writeln!(self.writer, "{}", outcome.message)?;
                }
            }
            "connect" => {
                let report = self.link.connect(&self.account).await;
                writeln!(self.writer, "{report}")?;
            }
            "disconnect" => {
                if self.link.is_connected() {
                    let report = self.link.disconnect(&self.account.username).await;
                    self.save_local()?;
                    writeln!(self.writer, "{report}")?;
                } else {
                    writeln!(self.writer, "Not connected.")?;
                }
            }
            "exit" | "quit" => return Ok(CommandStatus::Quit),
            _ => self.dispatch(name, &args).await?,
        }
        Ok(CommandStatus::Continue)
    }

    /// Everything outside the always-local set: forwarded verbatim while
    /// connected, decoded against the offline subset otherwise.
    async fn dispatch(&mut self, name: &str, args: &[String]) -> Result<()> {
        if self.link.is_connected() {
            let outcome = self.link.submit(&self.account.username, name, args).await;
            writeln!(self.writer, "{}", outcome.message)?;
            return Ok(());
        }
        match Command::parse(name, args) {
            Ok(command) => {
                let outcome = self.offline.dispatch(command, &mut self.account.location);
                writeln!(self.writer, "{}", outcome.message)?;
            }
            Err(CommandError::Unknown(name)) => {
                writeln!(self.writer, "Command '{name}' not found.")?;
            }
            Err(e) => writeln!(self.writer, "{e}")?,
        }
        Ok(())
    }

    fn help(&mut self) -> Result<()> {
        writeln!(
            self.writer,
            "Local commands: help, history, save, connect, disconnect, exit"
        )?;
        if self.link.is_connected() {
            writeln!(self.writer, "Server commands:")?;
            for info in self.link.remote_commands() {
                writeln!(self.writer, "  {:<6} {}", info.name, info.description)?;
            }
        } else {
            writeln!(
                self.writer,
                "Offline commands: ls, cd, cat, hack, chat (chat needs a connection to land)"
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::remote::Remote;

    // A link pointing at the discard port: these tests never go online,
    // so nothing is ever sent.
    fn dead_link() -> Link {
        let remote = Remote::new("http://127.0.0.1:9").unwrap();
        Link::new(remote, Duration::from_secs(3))
    }

    fn offline_shell(dir: &std::path::Path) -> Shell<Vec<u8>> {
        let store = AccountStore::new(dir).unwrap();
        let account = store.register("tester").unwrap();
        Shell::new(store, account, dead_link(), Vec::new())
    }

    fn transcript(shell: &Shell<Vec<u8>>) -> String {
        String::from_utf8(shell.writer.clone()).unwrap()
    }

    #[tokio::test]
    async fn offline_navigation_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = offline_shell(dir.path());
        shell.execute("ls").await.unwrap();
        shell.execute("cd documents").await.unwrap();
        shell.execute("cat mission1.txt").await.unwrap();
        shell.execute("cd ..").await.unwrap();

        let out = transcript(&shell);
        assert!(out.contains("bin/  documents/"));
        assert!(out.contains("moved to /root/home/user/documents"));
        assert!(out.contains("access_code"));
        assert_eq!(shell.account.location, Location::start());
    }

    #[tokio::test]
    async fn ascending_stops_at_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = offline_shell(dir.path());
        shell.execute("cd ..").await.unwrap(); // /root/home
        shell.execute("cd ..").await.unwrap(); // /root
        shell.execute("cd ..").await.unwrap(); // AtRoot, a no-op
        let out = transcript(&shell);
        assert!(out.contains("moved to /root/home"));
        assert!(out.contains("already at the top of the file system"));
        assert_eq!(shell.account.location.to_string(), "/root");
    }

    #[tokio::test]
    async fn unknown_commands_are_mode_qualified() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = offline_shell(dir.path());
        shell.execute("frobnicate").await.unwrap();
        shell.execute("echo hi").await.unwrap();
        let out = transcript(&shell);
        assert!(out.contains("Command 'frobnicate' not found."));
        assert!(out.contains("Command 'echo' is not available offline."));
    }

    #[tokio::test]
    async fn offline_hack_grants_the_reward_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = offline_shell(dir.path());
        shell.execute("hack wrongpass").await.unwrap();
        shell.execute("hack d3adb33f").await.unwrap();
        shell.execute("hack d3adb33f").await.unwrap();
        let out = transcript(&shell);
        assert!(out.contains("Access denied."));
        assert!(out.contains("Access granted. 500 credits"));
        assert!(out.contains("Mission already completed."));
        assert_eq!(out.matches("Access granted").count(), 1);
        // A wrong password never leaks the solution before success.
        let denial_line = out.lines().find(|l| l.contains("denied")).unwrap();
        assert!(!denial_line.contains("d3adb33f"));
    }

    #[tokio::test]
    async fn offline_chat_is_recognized_but_undelivered() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = offline_shell(dir.path());
        shell.execute("chat anyone there").await.unwrap();
        assert!(transcript(&shell).contains("You are offline. Nobody heard that."));
    }

    #[tokio::test]
    async fn help_and_history_work_while_disconnected() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = offline_shell(dir.path());
        shell.execute("help").await.unwrap();
        shell.execute("ls").await.unwrap();
        shell.execute("history").await.unwrap();
        let out = transcript(&shell);
        assert!(out.contains("Local commands:"));
        assert!(out.contains("Offline commands:"));
        assert!(out.contains("   1  help"));
        assert!(out.contains("   2  ls"));
        assert!(out.contains("   3  history"));
    }

    #[tokio::test]
    async fn save_writes_the_local_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = offline_shell(dir.path());
        shell.execute("cd documents").await.unwrap();
        shell.execute("save").await.unwrap();
        assert!(transcript(&shell).contains("Progress saved locally."));

        let store = AccountStore::new(dir.path()).unwrap();
        let loaded = store.load("tester").unwrap();
        assert_eq!(loaded.location.to_string(), "/root/home/user/documents");
    }

    #[tokio::test]
    async fn disconnect_while_offline_is_a_reported_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = offline_shell(dir.path());
        shell.execute("disconnect").await.unwrap();
        assert!(transcript(&shell).contains("Not connected."));
    }

    #[tokio::test]
    async fn exit_requests_quit() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = offline_shell(dir.path());
        assert_eq!(shell.execute("exit").await.unwrap(), CommandStatus::Quit);
    }

    #[tokio::test]
    async fn stale_saved_location_clamps_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(dir.path()).unwrap();
        let mut account = store.register("wanderer").unwrap();
        account.location = Location::new(vec!["root".into(), "vanished".into()]);
        store.save(&account).unwrap();

        let reloaded = store.load("wanderer").unwrap();
        let shell = Shell::new(store, reloaded, dead_link(), Vec::new());
        assert_eq!(shell.account.location, Location::start());
    }

    #[tokio::test]
    async fn offline_prompt_shows_the_location() {
        let dir = tempfile::tempdir().unwrap();
        let shell = offline_shell(dir.path());
        assert_eq!(shell.prompt(), "tester@local:/root/home/user> ");
    }
}
