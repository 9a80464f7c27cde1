use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Tool timed out after {0}ms")]
    Timeout(u64),
    #[error("Tool panicked")]
    Panicked,
    #[error("Registry error: {0}")]
    Registry(String),
}
