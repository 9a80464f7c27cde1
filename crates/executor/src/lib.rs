pub mod command_executor;
pub mod environment;
pub mod error;
pub mod suggestions;

pub use command_executor::{CommandExecutor, ExecutionReport, Phase};
pub use environment::HostSnapshot;
pub use error::{ExecutorError, StreamName};
pub use suggestions::{classify, suggest, CommandShape, Suggestion};
