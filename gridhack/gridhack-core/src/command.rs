//! The closed set of game commands. Input is decoded into a [`Command`]
//! exactly once at a dispatch boundary; everything downstream matches on
//! the variants.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command '{0}' not found")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// A decoded game command with its structured arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    ChangeDir { target: String },
    ReadFile { name: String },
    Chat { message: String },
    /// `hack [mission-id] <password>`. The mission id is optional at the
    /// prompt because the offline world exposes exactly one mission; the
    /// server requires it since it multiplexes several.
    Hack { mission: Option<u32>, password: String },
    Echo { args: Vec<String> },
}

impl Command {
    /// Decode a command name and argument list. Unknown names and arity
    /// mistakes are reported here so dispatchers only ever see well-formed
    /// variants.
    pub fn parse(name: &str, args: &[String]) -> Result<Command, CommandError> {
        match name {
            "ls" | "list" => Ok(Command::List),
            "cd" => match args {
                [target] => Ok(Command::ChangeDir {
                    target: target.clone(),
                }),
                _ => Err(CommandError::Usage("cd <directory>")),
            },
            "cat" => match args {
                [name] => Ok(Command::ReadFile { name: name.clone() }),
                _ => Err(CommandError::Usage("cat <file>")),
            },
            "chat" => {
                if args.is_empty() {
                    Err(CommandError::Usage("chat <message>"))
                } else {
                    Ok(Command::Chat {
                        message: args.join(" "),
                    })
                }
            }
            "hack" => match args {
                [password] => Ok(Command::Hack {
                    mission: None,
                    password: password.clone(),
                }),
                [mission, password] => {
                    let mission = mission
                        .parse::<u32>()
                        .map_err(|_| CommandError::Usage("hack [mission-id] <password>"))?;
                    Ok(Command::Hack {
                        mission: Some(mission),
                        password: password.clone(),
                    })
                }
                _ => Err(CommandError::Usage("hack [mission-id] <password>")),
            },
            "echo" => Ok(Command::Echo {
                args: args.to_vec(),
            }),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    /// Whether the command is part of the locally-implemented subset the
    /// shell can run without a server.
    pub fn offline_capable(&self) -> bool {
        !matches!(self, Command::Echo { .. })
    }

    /// The canonical spelling of the command, as advertised and typed.
    pub fn name(&self) -> &'static str {
        match self {
            Command::List => "ls",
            Command::ChangeDir { .. } => "cd",
            Command::ReadFile { .. } => "cat",
            Command::Chat { .. } => "chat",
            Command::Hack { .. } => "hack",
            Command::Echo { .. } => "echo",
        }
    }
}

/// The command table the server advertises to clients, shown by `help`
/// while connected.
pub fn command_table() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ls", "List the contents of the current directory"),
        ("cd", "Move into a directory, or '..' to go back up"),
        ("cat", "Print the contents of a file"),
        ("chat", "Send a message to everyone online"),
        ("hack", "Submit an access code for a mission"),
        ("echo", "Echoes back the arguments provided"),
    ]
}
