//! Error type shared by the loader, the configuration layer and the writers.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors which abort a run.
///
/// Solver outcomes such as infeasibility are not errors, see
/// [`SolveStatus`](crate::solution::SolveStatus).
#[derive(Debug)]
pub enum Error {
    /// A path could not be opened or created.
    Io { path: PathBuf, source: io::Error },
    /// A node or arc source is malformed.
    Input { entity: &'static str, reason: String },
    /// Run parameters are invalid.
    Config(String),
    /// The result sink could not be written.
    Output(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn input(entity: &'static str, reason: impl fmt::Display) -> Self {
        Error::Input { entity, reason: reason.to_string() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, source } => write!(f, "cannot access '{}': {}", path.display(), source),
            Error::Input { entity, reason } => write!(f, "cannot read {}: {}", entity, reason),
            Error::Config(reason) => write!(f, "invalid configuration: {}", reason),
            Error::Output(reason) => write!(f, "cannot write result: {}", reason),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
