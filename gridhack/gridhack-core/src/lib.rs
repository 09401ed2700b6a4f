//! Core game logic shared by the gridhack server and the interactive shell:
//! the simulated file system, the command set, missions, chat, player
//! accounts, and the wire types both sides speak.

pub mod account;
pub mod chat;
pub mod command;
pub mod fs;
pub mod mission;
pub mod proto;
