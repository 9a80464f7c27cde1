//! The five tools every worker understands.

use execstream_protocol::ToolDescriptor;
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTool {
    OutputText,
    OutputTable,
    OutputProgress,
    RequestUserInput,
    EndExecution,
}

impl BuiltinTool {
    pub const ALL: [BuiltinTool; 5] = [
        BuiltinTool::OutputText,
        BuiltinTool::OutputTable,
        BuiltinTool::OutputProgress,
        BuiltinTool::RequestUserInput,
        BuiltinTool::EndExecution,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinTool::OutputText => "output_text",
            BuiltinTool::OutputTable => "output_table",
            BuiltinTool::OutputProgress => "output_progress",
            BuiltinTool::RequestUserInput => "request_user_input",
            BuiltinTool::EndExecution => "end_execution",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        let (description, parameters) = match self {
            BuiltinTool::OutputText => (
                "Output text content to the user",
                json!({
                    "type": "object",
                    "properties": {
                        "content": {"type": "string", "description": "Text to display"},
                        "isError": {"type": "boolean", "description": "Whether the text is an error message"}
                    },
                    "required": ["content"]
                }),
            ),
            BuiltinTool::OutputTable => (
                "Output tabular data to the user",
                json!({
                    "type": "object",
                    "properties": {
                        "header": {"type": "array", "items": {}, "description": "Column headers"},
                        "rows": {"type": "array", "items": {"type": "array", "items": {}}, "description": "Table rows"},
                        "metadata": {"type": "object", "description": "Optional table metadata"}
                    },
                    "required": ["header", "rows"]
                }),
            ),
            BuiltinTool::OutputProgress => (
                "Report progress of a long running task",
                json!({
                    "type": "object",
                    "properties": {
                        "current": {"type": "integer", "description": "Current progress value"},
                        "total": {"type": "integer", "description": "Total progress value", "default": 100},
                        "status": {"type": "string", "description": "Status message"}
                    },
                    "required": ["current"]
                }),
            ),
            BuiltinTool::RequestUserInput => (
                "Ask the user for input",
                json!({
                    "type": "object",
                    "properties": {
                        "prompt": {"type": "string", "description": "Prompt shown to the user"}
                    }
                }),
            ),
            BuiltinTool::EndExecution => (
                "End the current execution",
                json!({
                    "type": "object",
                    "properties": {
                        "message": {"type": "string", "description": "Optional closing message"}
                    }
                }),
            ),
        };
        ToolDescriptor::new(self.name(), description, parameters)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputTextParams {
    pub content: String,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputTableParams {
    pub header: Vec<Value>,
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

fn default_total() -> u64 {
    100
}

fn default_status() -> String {
    "Processing...".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputProgressParams {
    pub current: u64,
    #[serde(default = "default_total")]
    pub total: u64,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_prompt() -> String {
    "Please enter:".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestUserInputParams {
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EndExecutionParams {
    #[serde(default)]
    pub message: String,
}
