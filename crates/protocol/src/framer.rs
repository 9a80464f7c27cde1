//! Event framing: the single serialization point for protocol output.
//!
//! Every component writes through a [`Framer`] (usually via a per-request
//! [`EventStream`]), never to stdout directly. A sink writes one event as
//! one line and flushes it before returning, so events leave the worker in
//! exactly the order they were emitted.

use crate::error::ProtocolError;
use crate::event::{Event, EventContent, EventKind, ProgressContent, TableContent};
use parking_lot::Mutex;
use serde_json::Value;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, warn};

pub const CODE_BLOCK_BEGIN: &str = "[CODE_BLOCK_BEGIN]";
pub const CODE_BLOCK_END: &str = "[CODE_BLOCK_END]";
pub const ERROR_MARKER: &str = "[ERROR_MARKER]";
pub const END_MARKER: &str = "[COMMAND_EXECUTION_END]";

/// Output encoding selected by the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One JSON event per line.
    #[default]
    Json,
    /// Plain text with code-block and error markers.
    Legacy,
}

/// Destination for framed events.
pub trait EventSink: Send + Sync {
    fn write_event(&self, event: &Event) -> Result<(), ProtocolError>;
}

/// Writes each event as a JSON line.
pub struct JsonLineSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> EventSink for JsonLineSink<W> {
    fn write_event(&self, event: &Event) -> Result<(), ProtocolError> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Writes events in the legacy marker format.
pub struct LegacyTextSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> LegacyTextSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> EventSink for LegacyTextSink<W> {
    fn write_event(&self, event: &Event) -> Result<(), ProtocolError> {
        let mut text = render_legacy(event);
        text.push('\n');
        let mut writer = self.writer.lock();
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Keeps events in memory. Used by tests and by hosts embedding the
/// protocol in-process.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn write_event(&self, event: &Event) -> Result<(), ProtocolError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_table(table: &TableContent) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    lines.push(
        table
            .header
            .iter()
            .map(render_cell)
            .collect::<Vec<_>>()
            .join("\t"),
    );
    for row in &table.rows {
        lines.push(row.iter().map(render_cell).collect::<Vec<_>>().join("\t"));
    }
    lines.join("\n")
}

/// Renders an event in the legacy plain-text format (without the trailing
/// newline).
pub fn render_legacy(event: &Event) -> String {
    match (&event.kind, &event.content) {
        (EventKind::End, _) => END_MARKER.to_string(),
        (EventKind::Command | EventKind::Code, EventContent::Text(code)) => {
            format!("{CODE_BLOCK_BEGIN}\n{code}\n{CODE_BLOCK_END}")
        }
        (_, EventContent::Text(text)) if event.is_failure() => format!("{ERROR_MARKER}\n{text}"),
        (_, EventContent::Text(text)) => text.clone(),
        (_, EventContent::Table(table)) => render_table(table),
        (_, EventContent::Progress(p)) => format!("[{}/{}] {}", p.current, p.total, p.status),
        (_, EventContent::InputRequest(req)) => req.prompt.clone(),
    }
}

/// Serializes events through one sink.
#[derive(Clone)]
pub struct Framer {
    sink: Arc<dyn EventSink>,
}

impl Framer {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Framer over the worker's stdout in the given mode.
    pub fn stdout(mode: OutputMode) -> Self {
        let sink: Arc<dyn EventSink> = match mode {
            OutputMode::Json => Arc::new(JsonLineSink::new(std::io::stdout())),
            OutputMode::Legacy => Arc::new(LegacyTextSink::new(std::io::stdout())),
        };
        Self::new(sink)
    }

    /// Framer over a fresh in-memory sink; returns the sink for inspection.
    pub fn memory() -> (Self, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (Self::new(sink.clone()), sink)
    }

    /// Writes one event. Failures are logged and the line is dropped; the
    /// protocol has no channel left to report them on.
    pub fn emit(&self, event: &Event) {
        match self.sink.write_event(event) {
            Ok(()) => {}
            Err(ProtocolError::Serialize(e)) => {
                error!(kind = event.kind.as_str(), error = %e, "event is not serializable");
            }
            Err(ProtocolError::Io(e)) => {
                warn!(kind = event.kind.as_str(), error = %e, "failed to write event");
            }
        }
    }

    /// Opens the event stream for one request.
    pub fn stream(&self, sequence_id: impl Into<String>) -> EventStream {
        EventStream {
            framer: self.clone(),
            sequence_id: Arc::from(sequence_id.into()),
            ended: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Per-request view of a [`Framer`]: stamps the sequence id on every event
/// and keeps the terminal `end` event unique and last.
#[derive(Clone)]
pub struct EventStream {
    framer: Framer,
    sequence_id: Arc<str>,
    ended: Arc<AtomicBool>,
}

impl EventStream {
    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    /// Emits `event` under this stream's sequence id. Returns false when the
    /// event was dropped because the stream already ended.
    pub fn emit(&self, mut event: Event) -> bool {
        event.sequence_id = self.sequence_id.to_string();

        if event.kind == EventKind::End {
            if self
                .ended
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                warn!(sequence_id = %self.sequence_id, "duplicate end event dropped");
                return false;
            }
        } else if self.is_ended() {
            warn!(
                sequence_id = %self.sequence_id,
                kind = event.kind.as_str(),
                "event after end dropped"
            );
            return false;
        }

        self.framer.emit(&event);
        true
    }

    pub fn text(&self, content: impl Into<String>) -> bool {
        self.emit(Event::text(content, ""))
    }

    pub fn text_flagged(&self, content: impl Into<String>, is_error: bool) -> bool {
        self.emit(Event::text_flagged(content, is_error, ""))
    }

    pub fn error(&self, content: impl Into<String>) -> bool {
        self.emit(Event::error(content, ""))
    }

    pub fn command(&self, content: impl Into<String>) -> bool {
        self.emit(Event::command(content, ""))
    }

    pub fn code(&self, content: impl Into<String>) -> bool {
        self.emit(Event::code(content, ""))
    }

    pub fn table(&self, table: TableContent) -> bool {
        self.emit(Event::table(table, ""))
    }

    pub fn progress(&self, current: u64, total: u64, status: impl Into<String>) -> bool {
        self.emit(Event::progress(
            ProgressContent {
                current,
                total,
                status: status.into(),
            },
            "",
        ))
    }

    pub fn input_request(&self, prompt: impl Into<String>) -> bool {
        self.emit(Event::input_request(prompt, ""))
    }

    pub fn end(&self, message: impl Into<String>) -> bool {
        self.emit(Event::end(message, ""))
    }

    /// Emits the terminal event unless one was already written. Returns
    /// whether this call wrote it.
    pub fn finish(&self) -> bool {
        if self.is_ended() {
            return false;
        }
        self.end("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    #[test]
    fn test_json_sink_writes_one_line_per_event() {
        let buf = SharedBuf::default();
        let framer = Framer::new(Arc::new(JsonLineSink::new(buf.clone())));
        let stream = framer.stream("s1");
        stream.text("a");
        stream.error("b");
        stream.finish();

        let out = buf.contents();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            let value: Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["sequenceId"], "s1");
        }
        let last: Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["isEnd"], true);
    }

    #[test]
    fn test_stream_stamps_sequence_id() {
        let (framer, sink) = Framer::memory();
        let stream = framer.stream("abc");
        stream.emit(Event::text("x", "other"));
        assert_eq!(sink.events()[0].sequence_id, "abc");
    }

    #[test]
    fn test_end_is_unique_and_last() {
        let (framer, sink) = Framer::memory();
        let stream = framer.stream("s");
        assert!(stream.text("before"));
        assert!(stream.end("done"));
        assert!(!stream.end("again"));
        assert!(!stream.text("after"));
        assert!(!stream.finish());

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events[1].is_end);
        assert_eq!(events.iter().filter(|e| e.is_end).count(), 1);
    }

    #[test]
    fn test_finish_emits_when_not_ended() {
        let (framer, sink) = Framer::memory();
        let stream = framer.stream("s");
        assert!(stream.finish());
        assert_eq!(sink.events().len(), 1);
        assert!(stream.is_ended());
    }

    #[test]
    fn test_streams_are_independent() {
        let (framer, sink) = Framer::memory();
        let first = framer.stream("1");
        let second = framer.stream("2");
        first.finish();
        assert!(second.text("still open"));
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn test_legacy_rendering() {
        assert_eq!(render_legacy(&Event::text("hello", "")), "hello");
        assert_eq!(
            render_legacy(&Event::error("bad", "")),
            "[ERROR_MARKER]\nbad"
        );
        assert_eq!(
            render_legacy(&Event::command("ls -la", "")),
            "[CODE_BLOCK_BEGIN]\nls -la\n[CODE_BLOCK_END]"
        );
        assert_eq!(render_legacy(&Event::end("", "")), END_MARKER);

        let table = Event::table(
            TableContent {
                header: vec![json!("Name"), json!("Size")],
                rows: vec![vec![json!("a.txt"), json!(10)]],
                metadata: Default::default(),
            },
            "",
        );
        assert_eq!(render_legacy(&table), "Name\tSize\na.txt\t10");
    }

    #[test]
    fn test_legacy_sink_output() {
        let buf = SharedBuf::default();
        let framer = Framer::new(Arc::new(LegacyTextSink::new(buf.clone())));
        let stream = framer.stream("");
        stream.code("print(1)");
        stream.finish();
        assert_eq!(
            buf.contents(),
            "[CODE_BLOCK_BEGIN]\nprint(1)\n[CODE_BLOCK_END]\n[COMMAND_EXECUTION_END]\n"
        );
    }
}
