use execstream_protocol::EventStream;

/// What a tool handler gets to work with: the request's event stream and
/// its time budget.
#[derive(Clone)]
pub struct ToolContext {
    pub stream: EventStream,
    pub timeout_ms: u64,
}

impl ToolContext {
    pub fn new(stream: EventStream, timeout_ms: u64) -> Self {
        Self { stream, timeout_ms }
    }

    pub fn sequence_id(&self) -> &str {
        self.stream.sequence_id()
    }
}
