//! Event model for the output protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Closed set of event types a worker may emit.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Text,
    Error,
    Command,
    Code,
    Table,
    Progress,
    InputRequest,
    End,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Text => "text",
            EventKind::Error => "error",
            EventKind::Command => "command",
            EventKind::Code => "code",
            EventKind::Table => "table",
            EventKind::Progress => "progress",
            EventKind::InputRequest => "input_request",
            EventKind::End => "end",
        }
    }
}

/// Tabular payload of a `table` event.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TableContent {
    pub header: Vec<Value>,
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Payload of a `progress` event.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProgressContent {
    pub current: u64,
    pub total: u64,
    pub status: String,
}

/// Payload of an `input_request` event.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct InputRequestContent {
    pub prompt: String,
}

/// Event payload. Text-like events carry a plain string, the structured
/// events carry a nested object.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum EventContent {
    Text(String),
    Table(TableContent),
    Progress(ProgressContent),
    InputRequest(InputRequestContent),
}

impl EventContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            EventContent::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One line of the output protocol.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub content: EventContent,
    pub is_error: bool,
    pub is_end: bool,
    #[serde(default)]
    pub sequence_id: String,
}

impl Event {
    fn string(kind: EventKind, content: String, is_error: bool, sequence_id: &str) -> Self {
        Self {
            kind,
            content: EventContent::Text(content),
            is_error,
            is_end: kind == EventKind::End,
            sequence_id: sequence_id.to_string(),
        }
    }

    pub fn text(content: impl Into<String>, sequence_id: &str) -> Self {
        Self::string(EventKind::Text, content.into(), false, sequence_id)
    }

    /// A `text` event that may be flagged as an error by the caller
    /// (the `output_text` tool carries its own `isError`).
    pub fn text_flagged(content: impl Into<String>, is_error: bool, sequence_id: &str) -> Self {
        Self::string(EventKind::Text, content.into(), is_error, sequence_id)
    }

    pub fn error(content: impl Into<String>, sequence_id: &str) -> Self {
        Self::string(EventKind::Error, content.into(), true, sequence_id)
    }

    pub fn command(content: impl Into<String>, sequence_id: &str) -> Self {
        Self::string(EventKind::Command, content.into(), false, sequence_id)
    }

    pub fn code(content: impl Into<String>, sequence_id: &str) -> Self {
        Self::string(EventKind::Code, content.into(), false, sequence_id)
    }

    pub fn end(message: impl Into<String>, sequence_id: &str) -> Self {
        Self::string(EventKind::End, message.into(), false, sequence_id)
    }

    pub fn table(table: TableContent, sequence_id: &str) -> Self {
        Self {
            kind: EventKind::Table,
            content: EventContent::Table(table),
            is_error: false,
            is_end: false,
            sequence_id: sequence_id.to_string(),
        }
    }

    pub fn progress(progress: ProgressContent, sequence_id: &str) -> Self {
        Self {
            kind: EventKind::Progress,
            content: EventContent::Progress(progress),
            is_error: false,
            is_end: false,
            sequence_id: sequence_id.to_string(),
        }
    }

    pub fn input_request(prompt: impl Into<String>, sequence_id: &str) -> Self {
        Self {
            kind: EventKind::InputRequest,
            content: EventContent::InputRequest(InputRequestContent {
                prompt: prompt.into(),
            }),
            is_error: false,
            is_end: false,
            sequence_id: sequence_id.to_string(),
        }
    }

    /// True for `error` events and for error-flagged text.
    pub fn is_failure(&self) -> bool {
        self.kind == EventKind::Error || self.is_error
    }
}
