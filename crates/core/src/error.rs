use execstream_providers::ProviderError;
use thiserror::Error;

/// Failures at the session boundary. Each one ends up as a single `error`
/// event followed by the terminal `end`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Input(String),
    #[error("Command execution error: {0}")]
    Execution(String),
    #[error("{0}")]
    Dispatch(String),
    #[error("Decision-maker request failed: {0}")]
    Upstream(#[from] ProviderError),
}

impl SessionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Input(_) => "input",
            SessionError::Execution(_) => "execution",
            SessionError::Dispatch(_) => "dispatch",
            SessionError::Upstream(_) => "upstream",
        }
    }
}
