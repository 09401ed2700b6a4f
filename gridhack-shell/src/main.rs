//! Interactive gridhack client entry point.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gridhack_core::account::{AccountError, AccountStore};
use gridhack_shell::link::Link;
use gridhack_shell::remote::Remote;
use gridhack_shell::shell::Shell;

#[derive(Parser)]
#[command(name = "gridhack-shell")]
#[command(about = "Interactive client for the gridhack server")]
struct Cli {
    /// Username to play as
    #[arg(short, long)]
    username: String,

    /// Server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Local save directory
    #[arg(long, default_value = "saves")]
    data_dir: PathBuf,

    /// Seconds between background polls for chat and kick notices
    #[arg(long, default_value_t = 3)]
    poll_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let store = AccountStore::new(&cli.data_dir)?;
    // Local registration: load the existing record, or create a fresh one
    // if the name is still free here. The server-side check happens when
    // the player connects.
    let account = match store.load(&cli.username) {
        Ok(account) => account,
        Err(AccountError::UnknownUser(_)) => store.register(&cli.username)?,
        Err(e) => return Err(e.into()),
    };

    let remote = Remote::new(cli.server)?;
    let link = Link::new(remote, Duration::from_secs(cli.poll_secs.max(1)));
    let mut shell = Shell::new(store, account, link, std::io::stdout());
    println!("gridhack shell. Type 'help' for commands, 'connect' to go online.");
    shell.run().await
}
