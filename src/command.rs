//! The caller-facing surface as data.
//!
//! A [`Command`] is one call a front-end can make on an [`EditSession`]. The
//! interactive shell parses commands from lines of text, the `apply`
//! subcommand from its positional steps, and both run them through
//! [`Command::execute`].
//!
//! ## Line syntax
//!
//! ```text
//! load <path>
//! save <path> [FORMAT]
//! info
//! resize <W> <H>          (or resize WxH)
//! grayscale
//! blur [RADIUS]           (radius defaults to 1)
//! brightness <FACTOR>
//! contrast <FACTOR>
//! undo
//! history [N]
//! quit
//! ```
//!
//! Paths may contain spaces. A last word after a save path is taken as the
//! format only when it names one (`png`, `jpg`, ...).
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::codec::{FileFormat, ImageCodec, ImageInfo};
use crate::engine::{EditSession, EngineError};
use crate::history::HistoryRecord;
use crate::operation::{Operation, ParseOperationError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown command '{0}'")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Operation(#[from] ParseOperationError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(PathBuf),
    Save {
        path: PathBuf,
        format: Option<FileFormat>,
    },
    Info,
    Apply(Operation),
    Undo,
    History {
        limit: Option<usize>,
    },
    Quit,
}

/// What a successfully executed command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// An image was loaded or transformed; carries the new state.
    Updated(Option<ImageInfo>),
    Saved(PathBuf),
    Info(Option<ImageInfo>),
    Undo {
        restored: bool,
        state: Option<ImageInfo>,
    },
    History {
        records: Vec<HistoryRecord>,
        limit: Option<usize>,
    },
    Quit,
}

/// Resolve a user-supplied format name.
pub fn parse_format(name: &str) -> Result<FileFormat, EngineError> {
    FileFormat::from_name(name).ok_or_else(|| EngineError::UnsupportedFormat(name.to_string()))
}

impl Command {
    /// Parse one shell line. Returns `Ok(None)` for blank lines and comments.
    pub fn parse_line(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match keyword.to_ascii_lowercase().as_str() {
            "load" | "open" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("load <path>"));
                }
                Self::Load(PathBuf::from(rest))
            }
            "save" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("save <path> [FORMAT]"));
                }
                // A trailing token is a format only if it names one.
                let (path, format) = match rest.rsplit_once(char::is_whitespace) {
                    Some((path, last)) => match FileFormat::from_name(last) {
                        Some(format) => (path.trim_end(), Some(format)),
                        None => (rest, None),
                    },
                    None => (rest, None),
                };
                Self::Save {
                    path: PathBuf::from(path),
                    format,
                }
            }
            "info" => Self::Info,
            "undo" => Self::Undo,
            "history" => match args.as_slice() {
                [] => Self::History { limit: None },
                [n] => Self::History {
                    limit: Some(n.parse().map_err(|_| CommandError::Usage("history [N]"))?),
                },
                _ => return Err(CommandError::Usage("history [N]")),
            },
            "quit" | "exit" => Self::Quit,
            "resize" => {
                let text = match args.as_slice() {
                    [w, h] => format!("resize={w}x{h}"),
                    [dims] => format!("resize={dims}"),
                    _ => return Err(CommandError::Usage("resize <W> <H>")),
                };
                Self::Apply(text.parse()?)
            }
            name @ ("grayscale" | "greyscale" | "gray" | "blur" | "brightness" | "contrast") => {
                let text = match args.as_slice() {
                    [] => name.to_string(),
                    [arg] => format!("{name}={arg}"),
                    _ => return Err(CommandError::Usage("<operation> [ARG]")),
                };
                Self::Apply(text.parse()?)
            }
            _ if keyword.contains('=') => Self::parse_step(line)?,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }

    /// Parse one `apply` step: an operation in `name=arg` form, or `undo`.
    pub fn parse_step(step: &str) -> Result<Self, CommandError> {
        if step.trim().eq_ignore_ascii_case("undo") {
            return Ok(Self::Undo);
        }
        Ok(Self::Apply(step.parse()?))
    }

    pub fn execute<C: ImageCodec>(
        self,
        session: &mut EditSession<C>,
    ) -> Result<Outcome, CommandError> {
        tracing::debug!(command = ?self, "Executing command");
        let outcome = match self {
            Self::Load(path) => {
                session.load(&path)?;
                Outcome::Updated(session.current_state())
            }
            Self::Save { path, format } => {
                session.save(&path, format)?;
                Outcome::Saved(path)
            }
            Self::Info => Outcome::Info(session.info()?),
            Self::Apply(op) => {
                session.apply(op)?;
                Outcome::Updated(session.current_state())
            }
            Self::Undo => Outcome::Undo {
                restored: session.undo(),
                state: session.current_state(),
            },
            Self::History { limit } => Outcome::History {
                records: session.history().records().map_err(EngineError::from)?,
                limit,
            },
            Self::Quit => Outcome::Quit,
        };
        Ok(outcome)
    }
}
