//! Missions and hack attempts.
//!
//! Missions are loaded once at server startup; completion lives only for
//! the lifetime of the process and is not written back to disk.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub solution: String,
    pub reward: String,
    #[serde(default)]
    pub completed: bool,
}

/// What a hack attempt produced. `AlreadyCompleted` is an idempotent
/// notice, not a failure: once a mission is done it stays done and the
/// reward is never granted twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HackOutcome {
    Hacked(String),
    AlreadyCompleted,
    Denied,
    UnknownMission(u32),
}

impl HackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, HackOutcome::Hacked(_) | HackOutcome::AlreadyCompleted)
    }

    /// Display text for the attempt. Denials stay generic so a failed
    /// attempt never leaks the solution.
    pub fn message(&self) -> String {
        match self {
            HackOutcome::Hacked(reward) => format!("Access granted. {reward}"),
            HackOutcome::AlreadyCompleted => "Mission already completed.".to_string(),
            HackOutcome::Denied => "Access denied.".to_string(),
            HackOutcome::UnknownMission(id) => format!("No mission with id {id}."),
        }
    }
}

#[derive(Debug, Default)]
pub struct MissionTable {
    missions: BTreeMap<u32, Mission>,
}

impl MissionTable {
    pub fn new(missions: impl IntoIterator<Item = Mission>) -> Self {
        MissionTable {
            missions: missions.into_iter().map(|m| (m.id, m)).collect(),
        }
    }

    /// Parse a mission collection from its JSON definition file.
    pub fn from_json(text: &str) -> Result<Self> {
        let missions: Vec<Mission> =
            serde_json::from_str(text).context("malformed mission definitions")?;
        Ok(Self::new(missions))
    }

    /// The missions the stock server runs with when no definition file is
    /// configured.
    pub fn builtin() -> Self {
        Self::new(builtin_missions())
    }

    /// The single fixed mission available to an offline shell.
    pub fn offline() -> Self {
        Self::new(builtin_missions().into_iter().take(1))
    }

    pub fn get(&self, id: u32) -> Option<&Mission> {
        self.missions.get(&id)
    }

    /// Ids of all known missions, ascending.
    pub fn ids(&self) -> Vec<u32> {
        self.missions.keys().copied().collect()
    }

    /// Evaluate a hack attempt. The completed flag flips on the first
    /// correct submission and every later attempt, right or wrong, reports
    /// `AlreadyCompleted`.
    pub fn attempt(&mut self, id: u32, password: &str) -> HackOutcome {
        match self.missions.get_mut(&id) {
            None => HackOutcome::UnknownMission(id),
            Some(m) if m.completed => HackOutcome::AlreadyCompleted,
            Some(m) if m.solution == password => {
                m.completed = true;
                HackOutcome::Hacked(m.reward.clone())
            }
            Some(_) => HackOutcome::Denied,
        }
    }
}

fn builtin_missions() -> Vec<Mission> {
    vec![
        Mission {
            id: 1,
            title: "Breach the mainframe".to_string(),
            description: "Find the access code hidden somewhere in the file system and \
                          submit it."
                .to_string(),
            solution: "d3adb33f".to_string(),
            reward: "500 credits transferred to your account.".to_string(),
            completed: false,
        },
        Mission {
            id: 2,
            title: "Ghost in the password file".to_string(),
            description: "An abandoned login still guards the old /root/etc. Crack it."
                .to_string(),
            solution: "sup3ruser".to_string(),
            reward: "You own the password file now. 1200 credits.".to_string(),
            completed: false,
        },
    ]
}
