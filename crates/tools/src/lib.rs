pub mod acknowledge;
pub mod builtin;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod input;
pub mod registry;
pub mod traits;

pub use acknowledge::AcknowledgeTool;
pub use builtin::BuiltinTool;
pub use context::ToolContext;
pub use dispatcher::{DispatchOutcome, ToolDispatcher};
pub use error::ToolError;
pub use input::{InputSource, NoInput, ScriptedInput, StdinInput};
pub use registry::ToolRegistry;
pub use traits::{CustomTool, ToolResult};
