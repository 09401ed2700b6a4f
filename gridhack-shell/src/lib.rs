//! Interactive client for the gridhack server: a shell-like prompt over
//! the simulated file system, with a connectivity state machine that
//! degrades to local play when the server is unreachable.

pub mod link;
pub mod offline;
pub mod remote;
pub mod shell;
