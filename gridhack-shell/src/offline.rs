//! Local-mode dispatch: the shell's own copy of the world tree and the
//! single fixed offline mission. Produces the same outcome envelope the
//! server produces so the display path does not care which mode ran.

use gridhack_core::command::Command;
use gridhack_core::fs::{render_listing, Location, Vfs};
use gridhack_core::mission::MissionTable;
use gridhack_core::proto::Outcome;

pub struct OfflineWorld {
    vfs: Vfs,
    missions: MissionTable,
}

impl Default for OfflineWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineWorld {
    pub fn new() -> Self {
        OfflineWorld {
            vfs: Vfs::game_world(),
            missions: MissionTable::offline(),
        }
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    /// Run a command against the local world, mutating the caller's
    /// location on a successful `cd`. Commands outside the offline
    /// subset report themselves as unavailable rather than unknown.
    pub fn dispatch(&mut self, command: Command, location: &mut Location) -> Outcome {
        match command {
            Command::List => match self.vfs.list(location) {
                Ok(entries) => Outcome::success(render_listing(&entries)),
                Err(e) => Outcome::error(e.to_string()),
            },
            Command::ChangeDir { target } => match self.vfs.change_dir(location, &target) {
                Ok(new_location) => {
                    *location = new_location;
                    Outcome::success(format!("moved to {location}"))
                }
                Err(e) => Outcome::error(e.to_string()),
            },
            Command::ReadFile { name } => match self.vfs.read_file(location, &name) {
                Ok(content) => Outcome::success(content.to_string()),
                Err(e) => Outcome::error(e.to_string()),
            },
            Command::Chat { .. } => Outcome::error("You are offline. Nobody heard that."),
            Command::Hack { mission, password } => {
                // Exactly one mission exists offline; an explicit id must
                // still match it.
                let offline_id = self.missions.ids()[0];
                let id = mission.unwrap_or(offline_id);
                let outcome = self.missions.attempt(id, &password);
                if outcome.is_success() {
                    Outcome::success(outcome.message())
                } else {
                    Outcome::error(outcome.message())
                }
            }
            cmd @ Command::Echo { .. } => Outcome::error(format!(
                "Command '{}' is not available offline. Connect to the server to use it.",
                cmd.name()
            )),
        }
    }
}
