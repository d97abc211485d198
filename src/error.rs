use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to {action} ledger: {source}")]
    Ledger {
        action: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read input: {0}")]
    Input(#[source] io::Error),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl Error {
    pub(crate) fn ledger(action: &'static str, source: io::Error) -> Self {
        Error::Ledger { action, source }
    }

    /// Kind of the underlying I/O failure, if this is a ledger error.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Ledger { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
