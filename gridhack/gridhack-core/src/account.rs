//! Player accounts and their flat-file persistence: one JSON record per
//! username under a data directory. Last write wins; there is no
//! cross-writer merge.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fs::Location;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    /// Opaque progress blob; the save format does not interpret it.
    pub progress: String,
    pub location: Location,
}

impl Account {
    /// The record a freshly registered player starts with.
    pub fn fresh(username: &str) -> Self {
        Account {
            username: username.to_string(),
            progress: "fresh_start".to_string(),
            location: Location::start(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User already exists.")]
    UsernameTaken(String),
    #[error("invalid username: {0}")]
    InvalidUsername(&'static str),
    #[error("no account for '{0}'")]
    UnknownUser(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("corrupt account file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Directory-backed store of account records, keyed by username
/// (case-sensitive). Used by the server for its cloud saves and by the
/// shell for its local ones.
#[derive(Debug, Clone)]
pub struct AccountStore {
    dir: PathBuf,
}

impl AccountStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create account directory {dir:?}"))?;
        Ok(AccountStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, username: &str) -> PathBuf {
        self.dir.join(format!("{username}.json"))
    }

    /// Usernames become file names, so they are restricted to a safe
    /// character set.
    pub fn validate(username: &str) -> Result<(), AccountError> {
        if username.is_empty() {
            return Err(AccountError::InvalidUsername("must not be empty"));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AccountError::InvalidUsername(
                "only letters, digits, '_' and '-' are allowed",
            ));
        }
        Ok(())
    }

    /// Whether the username has no persisted record yet.
    pub fn is_available(&self, username: &str) -> bool {
        !self.path(username).exists()
    }

    /// Create and persist a fresh account. Fails if a record for the
    /// username already exists.
    pub fn register(&self, username: &str) -> Result<Account, AccountError> {
        Self::validate(username)?;
        if !self.is_available(username) {
            return Err(AccountError::UsernameTaken(username.to_string()));
        }
        let account = Account::fresh(username);
        self.save(&account)?;
        Ok(account)
    }

    /// Persist a record, replacing any previous one. Writes through a
    /// temp file so a crash never leaves a half-written record behind.
    pub fn save(&self, account: &Account) -> Result<(), AccountError> {
        Self::validate(&account.username)?;
        let text = serde_json::to_string_pretty(account)?;
        let path = self.path(&account.username);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn load(&self, username: &str) -> Result<Account, AccountError> {
        let text = match std::fs::read_to_string(self.path(username)) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AccountError::UnknownUser(username.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_save_load_round_trip() {
        let tempdir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(tempdir.path()).unwrap();

        assert!(store.is_available("alice"));
        let mut account = store.register("alice").unwrap();
        assert_eq!(account.progress, "fresh_start");
        assert!(!store.is_available("alice"));

        account.progress = "level_2".to_string();
        account.location = account.location.descend("documents");
        store.save(&account).unwrap();

        let loaded = store.load("alice").unwrap();
        assert_eq!(loaded, account);
        assert_eq!(loaded.location.to_string(), "/root/home/user/documents");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let tempdir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(tempdir.path()).unwrap();
        store.register("alice").unwrap();
        match store.register("alice") {
            Err(AccountError::UsernameTaken(name)) => assert_eq!(name, "alice"),
            other => panic!("expected UsernameTaken, got {other:?}"),
        }
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let tempdir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(tempdir.path()).unwrap();
        store.register("Alice").unwrap();
        assert!(store.is_available("alice"));
    }

    #[test]
    fn hostile_usernames_are_rejected() {
        let tempdir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(tempdir.path()).unwrap();
        assert!(matches!(
            store.register(""),
            Err(AccountError::InvalidUsername(_))
        ));
        assert!(matches!(
            store.register("../escape"),
            Err(AccountError::InvalidUsername(_))
        ));
        assert!(matches!(
            store.register("a b"),
            Err(AccountError::InvalidUsername(_))
        ));
        store.register("ok_name-1").unwrap();
    }

    #[test]
    fn loading_a_missing_account_names_the_user() {
        let tempdir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(tempdir.path()).unwrap();
        match store.load("ghost") {
            Err(AccountError::UnknownUser(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected UnknownUser, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_record_is_a_typed_error() {
        let tempdir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(tempdir.path()).unwrap();
        std::fs::write(tempdir.path().join("mallory.json"), "{broken").unwrap();
        assert!(matches!(
            store.load("mallory"),
            Err(AccountError::Corrupt(_))
        ));
    }
}
