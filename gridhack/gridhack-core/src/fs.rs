//! The simulated file system: a tree of directories and files, locations
//! into it, and the navigation operations the shell exposes.
//!
//! A [`Location`] is an ordered list of segment names starting at the root
//! marker, kept separate from the tree itself so positions round-trip
//! through save files as plain data. Client and server each hold their own
//! copy of the tree and resolve locations against it independently.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while navigating the world tree. All of these are
/// recoverable and end up as display text at the prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FsError {
    #[error("no such directory: {0}")]
    NoSuchDirectory(String),
    #[error("{0} is not a directory")]
    NotADirectory(String),
    #[error("no such file: {0}")]
    NoSuchFile(String),
    #[error("{0} is a directory")]
    NotAFile(String),
    #[error("already at the top of the file system")]
    AtRoot,
    #[error("location {0} does not exist")]
    NotFound(String),
}

/// A node in the world tree. Directories map child names to nodes; files
/// hold their textual content. The tree is built once at startup and has
/// no cycles by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Dir(BTreeMap<String, Node>),
    File(String),
}

impl Node {
    /// Build a directory node from an entry list.
    pub fn dir<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Node)>,
        S: Into<String>,
    {
        Node::Dir(entries.into_iter().map(|(n, c)| (n.into(), c)).collect())
    }

    /// Build a file node.
    pub fn file(content: impl Into<String>) -> Self {
        Node::File(content.into())
    }

    fn kind(&self) -> EntryKind {
        match self {
            Node::Dir(_) => EntryKind::Dir,
            Node::File(_) => EntryKind::File,
        }
    }
}

/// What a directory entry is, as reported by `ls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Dir,
    File,
}

/// One row of an `ls` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

/// Render a listing the way the shell prints it: directories get a
/// trailing slash.
pub fn render_listing(entries: &[Entry]) -> String {
    if entries.is_empty() {
        return "(empty)".to_string();
    }
    entries
        .iter()
        .map(|e| match e.kind {
            EntryKind::Dir => format!("{}/", e.name),
            EntryKind::File => e.name.clone(),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// A position in the world tree: an ordered, root-inclusive list of
/// segment names. Every prefix of a valid location names a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(Vec<String>);

impl Location {
    /// The location every fresh account starts at.
    pub fn start() -> Self {
        Location(vec![
            "root".to_string(),
            "home".to_string(),
            "user".to_string(),
        ])
    }

    pub fn new(segments: Vec<String>) -> Self {
        Location(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True once only the root marker remains; `cd ..` stops here.
    pub fn is_root(&self) -> bool {
        self.0.len() <= 1
    }

    /// Pop the last segment, or report [`FsError::AtRoot`] when already at
    /// the top. Ascending never needs the tree.
    pub fn ascend(&self) -> Result<Location, FsError> {
        if self.is_root() {
            return Err(FsError::AtRoot);
        }
        let mut segments = self.0.clone();
        segments.pop();
        Ok(Location(segments))
    }

    /// Extend the location with a child name. The caller is responsible
    /// for having checked that the child is a directory.
    pub fn descend(&self, name: &str) -> Location {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Location(segments)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

/// The world tree plus the navigation operations resolved against it.
#[derive(Debug, Clone)]
pub struct Vfs {
    root: BTreeMap<String, Node>,
}

impl Vfs {
    /// Wrap a top-level entry map. The map holds the root marker itself,
    /// so a root-inclusive location walks it segment by segment.
    pub fn new(root: BTreeMap<String, Node>) -> Self {
        Vfs { root }
    }

    /// The default game world. Layout follows the shipped single-player
    /// map; `access_code` is the file the first mission sends you hunting.
    pub fn game_world() -> Self {
        let mut root = BTreeMap::new();
        root.insert(
            "root".to_string(),
            Node::dir([
                (
                    "home",
                    Node::dir([(
                        "user",
                        Node::dir([
                            (
                                "documents",
                                Node::dir([(
                                    "mission1.txt",
                                    Node::file(
                                        "Welcome to the game! Your first mission is to find \
                                         the 'access_code' file.",
                                    ),
                                )]),
                            ),
                            (
                                "bin",
                                Node::dir([
                                    ("ls", Node::file("ls command")),
                                    ("cat", Node::file("cat command")),
                                ]),
                            ),
                        ]),
                    )]),
                ),
                (
                    "etc",
                    Node::dir([
                        ("passwd", Node::file("password file")),
                        ("access_code", Node::file("d3adb33f")),
                    ]),
                ),
            ]),
        );
        Vfs::new(root)
    }

    /// Walk the location from the root. Every segment must name a
    /// directory; any mismatch fails with [`FsError::NotFound`] and no
    /// partial result.
    pub fn resolve(&self, location: &Location) -> Result<&BTreeMap<String, Node>, FsError> {
        let mut current = &self.root;
        for segment in location.segments() {
            match current.get(segment) {
                Some(Node::Dir(children)) => current = children,
                _ => return Err(FsError::NotFound(location.to_string())),
            }
        }
        Ok(current)
    }

    /// Whether the location still resolves. Saved locations are checked
    /// with this before a session resumes and clamped to the start
    /// location by the caller when the tree has changed shape underneath.
    pub fn contains(&self, location: &Location) -> bool {
        self.resolve(location).is_ok()
    }

    /// Ordered `(name, kind)` listing of the directory at the location.
    pub fn list(&self, location: &Location) -> Result<Vec<Entry>, FsError> {
        let dir = self.resolve(location)?;
        Ok(dir
            .iter()
            .map(|(name, node)| Entry {
                name: name.clone(),
                kind: node.kind(),
            })
            .collect())
    }

    /// `cd target`: `..` ascends (a displayed no-op at the root), anything
    /// else must name a child directory of the current location.
    pub fn change_dir(&self, location: &Location, target: &str) -> Result<Location, FsError> {
        if target == ".." {
            return location.ascend();
        }
        let dir = self.resolve(location)?;
        match dir.get(target) {
            Some(Node::Dir(_)) => Ok(location.descend(target)),
            Some(Node::File(_)) => Err(FsError::NotADirectory(target.to_string())),
            None => Err(FsError::NoSuchDirectory(target.to_string())),
        }
    }

    /// `cat name`: the child must exist one level below the location and
    /// be a file; directories are never readable.
    pub fn read_file(&self, location: &Location, name: &str) -> Result<&str, FsError> {
        let dir = self.resolve(location)?;
        match dir.get(name) {
            Some(Node::File(content)) => Ok(content),
            Some(Node::Dir(_)) => Err(FsError::NotAFile(name.to_string())),
            None => Err(FsError::NoSuchFile(name.to_string())),
        }
    }
}
