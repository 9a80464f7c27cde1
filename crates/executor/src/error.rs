use std::fmt;
use thiserror::Error;

/// Which child stream a failure relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamName {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamName::Stdout => write!(f, "stdout"),
            StreamName::Stderr => write!(f, "stderr"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("No command provided")]
    EmptyCommand,
    #[error("Failed to start command: {0}")]
    Spawn(std::io::Error),
    #[error("Failed to read {stream}: {source}")]
    Stream {
        stream: StreamName,
        source: std::io::Error,
    },
    #[error("Failed to wait for command: {0}")]
    Wait(std::io::Error),
}
