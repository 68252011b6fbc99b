//! Command script parsing and replay.
//!
//! One command per line:
//!
//! ```text
//! add_server 3
//! store "user:1" "alice"
//! retrieve "user:1"
//! remove_server 3
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::Context;
use shardkv_core::{NodeId, NodeStore, Router};
use tracing::{debug, warn};

/// Malformed script line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{command}` expects {expected} argument(s), got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("invalid node id `{0}`")]
    InvalidNodeId(String),
    #[error("unterminated quote")]
    UnterminatedQuote,
}

/// A single router operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddServer(NodeId),
    RemoveServer(NodeId),
    Store { key: String, value: String },
    Retrieve { key: String },
}

/// What a command produced, for printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Added(NodeId),
    Removed(NodeId),
    Stored { value: String, node: NodeId },
    Retrieved { value: String, node: NodeId },
    Missing { key: String, node: NodeId },
}

impl CommandResult {
    /// Whether the result produces an output line.
    pub fn is_silent(&self) -> bool {
        matches!(self, CommandResult::Added(_) | CommandResult::Removed(_))
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Added(node) => write!(f, "Added server {node}."),
            CommandResult::Removed(node) => write!(f, "Removed server {node}."),
            CommandResult::Stored { value, node } => write!(f, "Stored {value} on server {node}."),
            CommandResult::Retrieved { value, node } => {
                write!(f, "Retrieved {value} from server {node}.")
            }
            CommandResult::Missing { key, .. } => write!(f, "Key {key} not present."),
        }
    }
}

impl Command {
    /// Apply the command to `router`.
    pub fn execute<S: NodeStore + Default>(
        self,
        router: &mut Router<S>,
    ) -> shardkv_core::Result<CommandResult> {
        match self {
            Command::AddServer(node) => {
                router.add_node(node)?;
                Ok(CommandResult::Added(node))
            }
            Command::RemoveServer(node) => {
                router.remove_node(node)?;
                Ok(CommandResult::Removed(node))
            }
            Command::Store { key, value } => {
                let node = router.store(key, value.clone())?;
                Ok(CommandResult::Stored { value, node })
            }
            Command::Retrieve { key } => match router.retrieve(&key)? {
                (node, Some(value)) => Ok(CommandResult::Retrieved { value, node }),
                (node, None) => Ok(CommandResult::Missing { key, node }),
            },
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = tokenize(line)?.into_iter();
        let name = words.next().unwrap_or_default();
        let args: Vec<String> = words.collect();

        match name.as_str() {
            "add_server" => Ok(Command::AddServer(node_arg("add_server", &args)?)),
            "remove_server" => Ok(Command::RemoveServer(node_arg("remove_server", &args)?)),
            "store" => {
                let [key, value] = exact::<2>("store", args)?;
                Ok(Command::Store { key, value })
            }
            "retrieve" => {
                let [key] = exact::<1>("retrieve", args)?;
                Ok(Command::Retrieve { key })
            }
            other => Err(ParseError::UnknownCommand(other.to_string())),
        }
    }
}

fn exact<const N: usize>(command: &'static str, args: Vec<String>) -> Result<[String; N], ParseError> {
    let got = args.len();
    args.try_into().map_err(|_| ParseError::Arity {
        command,
        expected: N,
        got,
    })
}

fn node_arg(command: &'static str, args: &[String]) -> Result<NodeId, ParseError> {
    match args {
        [id] => id
            .parse::<u32>()
            .map(NodeId)
            .map_err(|_| ParseError::InvalidNodeId(id.clone())),
        _ => Err(ParseError::Arity {
            command,
            expected: 1,
            got: args.len(),
        }),
    }
}

/// Split on whitespace; double quotes group words and are stripped.
fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut words = Vec::new();
    let mut chars = line.trim().chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut word = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(ch) => word.push(ch),
                    None => return Err(ParseError::UnterminatedQuote),
                }
            }
            words.push(word);
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            words.push(word);
        }
    }
    Ok(words)
}

/// Run every command of `input` against `router`, writing results to `out`.
///
/// Rejected commands (duplicate or unknown node, empty ring) are reported and
/// the replay continues. Resource exhaustion and malformed lines abort it.
///
/// # Returns
/// The number of commands executed.
pub fn replay<S, R, W>(router: &mut Router<S>, input: R, out: &mut W) -> anyhow::Result<usize>
where
    S: NodeStore + Default,
    R: BufRead,
    W: Write,
{
    let mut executed = 0;
    for (idx, line) in input.lines().enumerate() {
        let lineno = idx + 1;
        let line = line.with_context(|| format!("reading line {lineno}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let command = trimmed
            .parse::<Command>()
            .with_context(|| format!("line {lineno}: `{trimmed}`"))?;
        debug!(lineno, ?command, "executing");

        match command.execute(router) {
            Ok(result) => {
                if !result.is_silent() {
                    writeln!(out, "{result}")?;
                }
            }
            Err(err) if err.is_fatal() => {
                return Err(err).with_context(|| format!("line {lineno}"));
            }
            Err(err) => {
                warn!(lineno, %err, "command rejected");
                writeln!(out, "error: {err}")?;
            }
        }
        executed += 1;
    }
    Ok(executed)
}
