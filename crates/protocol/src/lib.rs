//! Wire protocol shared by every execstream component: the event model, the
//! framer that turns events into output lines, the request argument parser,
//! and the tool descriptor/invocation shapes exchanged with decision-makers.

pub mod error;
pub mod event;
pub mod framer;
pub mod request;
pub mod tool;

pub use error::ProtocolError;
pub use event::{Event, EventContent, EventKind, InputRequestContent, ProgressContent, TableContent};
pub use framer::{
    render_legacy, EventSink, EventStream, Framer, JsonLineSink, LegacyTextSink, MemorySink,
    OutputMode,
};
pub use request::{Request, RequestFormat};
pub use tool::{ToolDescriptor, ToolInvocation};
