//! HTTP client for the gridhack server: one method per protocol
//! operation, with a bounded request timeout so a dead server degrades
//! the session instead of hanging it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use gridhack_core::account::Account;
use gridhack_core::chat::ChatMessage;
use gridhack_core::proto::{
    AvailabilityResponse, CommandInfo, CommandRequest, KickedResponse, Outcome, SaveRequest,
    UsernameRequest,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A transport-level failure. Callers treat any of these identically to
/// an explicit error outcome, and additionally drop the connection.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct Remote {
    http: reqwest::Client,
    base: String,
}

impl Remote {
    pub fn new(base: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base: String = base.into();
        Ok(Remote {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, LinkError> {
        let resp = self.http.post(self.url(path)).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(LinkError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }

    async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<R, LinkError> {
        let resp = self.http.get(self.url(path)).query(query).send().await?;
        if !resp.status().is_success() {
            return Err(LinkError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }

    pub async fn check_username(&self, username: &str) -> Result<bool, LinkError> {
        let resp: AvailabilityResponse = self
            .post(
                "/check_username",
                &UsernameRequest {
                    username: username.to_string(),
                },
            )
            .await?;
        Ok(resp.is_available)
    }

    pub async fn register(&self, username: &str) -> Result<Outcome, LinkError> {
        self.post(
            "/register",
            &UsernameRequest {
                username: username.to_string(),
            },
        )
        .await
    }

    pub async fn reconnect(&self, username: &str) -> Result<Outcome, LinkError> {
        self.post(
            "/reconnect",
            &UsernameRequest {
                username: username.to_string(),
            },
        )
        .await
    }

    pub async fn disconnect(&self, username: &str) -> Result<Outcome, LinkError> {
        self.post(
            "/disconnect",
            &UsernameRequest {
                username: username.to_string(),
            },
        )
        .await
    }

    pub async fn save(&self, account: &Account) -> Result<Outcome, LinkError> {
        self.post(
            "/save",
            &SaveRequest {
                username: account.username.clone(),
                data: account.clone(),
            },
        )
        .await
    }

    /// Forward a command verbatim for authoritative dispatch.
    pub async fn command(
        &self,
        username: &str,
        command: &str,
        args: &[String],
    ) -> Result<Outcome, LinkError> {
        self.post(
            "/command",
            &CommandRequest {
                username: username.to_string(),
                command: command.to_string(),
                args: args.to_vec(),
            },
        )
        .await
    }

    pub async fn chat_history(&self) -> Result<Vec<ChatMessage>, LinkError> {
        self.get("/chat/history", &[]).await
    }

    pub async fn chat_since(&self, after: DateTime<Utc>) -> Result<Vec<ChatMessage>, LinkError> {
        self.get("/chat/since", &[("after", after.to_rfc3339())])
            .await
    }

    pub async fn kicked(&self, username: &str) -> Result<bool, LinkError> {
        let resp: KickedResponse = self.get(&format!("/kicked/{username}"), &[]).await?;
        Ok(resp.kicked)
    }

    pub async fn command_table(&self) -> Result<Vec<CommandInfo>, LinkError> {
        self.get("/commands", &[]).await
    }
}
