pub mod commands;
pub mod driver;
pub mod error;
pub mod interpreter;

pub use commands::Subcommand;
pub use driver::{EntryPoint, SessionDriver};
pub use error::SessionError;
pub use interpreter::{InvocationReport, InvocationStatus, ResponseInterpreter};
