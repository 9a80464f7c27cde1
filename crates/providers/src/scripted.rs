//! Deterministic decision-maker for offline runs and tests.

use crate::traits::{DecisionMaker, ModelResponse, ProviderError};
use async_trait::async_trait;
use execstream_protocol::{ToolDescriptor, ToolInvocation};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Answers keyed by the trimmed request text (`"1"` to `"11"`); anything else
/// gets a plain-text default.
pub struct ScriptedDecisionMaker {
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedDecisionMaker {
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_DELAY)
    }

    /// Delay used by the slow scenario (`"7"`).
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for ScriptedDecisionMaker {
    fn default() -> Self {
        Self::new()
    }
}

fn text_call(content: &str, is_error: bool) -> ToolInvocation {
    ToolInvocation::new(
        "output_text",
        json!({"content": content, "isError": is_error}),
    )
}

fn table_call(header: &[&str], rows: &[&[&str]], title: &str) -> ToolInvocation {
    ToolInvocation::new(
        "output_table",
        json!({"header": header, "rows": rows, "metadata": {"title": title}}),
    )
}

fn scripted_response(request: &str) -> Option<ModelResponse> {
    let response = match request {
        "1" => ModelResponse::tools(
            "Here is a text response",
            vec![text_call("Text produced through a tool call", false)],
        ),
        "2" => ModelResponse::tools(
            "Here is a sample table",
            vec![table_call(
                &["Column 1", "Column 2", "Column 3"],
                &[&["r1c1", "r1c2", "r1c3"], &["r2c1", "r2c2", "r2c3"]],
                "Sample table",
            )],
        ),
        "3" => ModelResponse::tools(
            "Here is a command",
            vec![text_call("A command you could run:\nls -la", false)],
        ),
        "4" => ModelResponse::tools(
            "Here is some code",
            vec![text_call(
                "A small function:\ndef hello():\n    print('Hello, World!')",
                false,
            )],
        ),
        "5" => ModelResponse::tools(
            "Here is a dangerous command",
            vec![text_call("Never run this:\nrm -rf /", true)],
        ),
        "6" => ModelResponse::default(),
        "9" => ModelResponse::tools(
            "A response with several tool calls",
            vec![
                text_call("First tool call", false),
                table_call(
                    &["Name", "Value"],
                    &[&["param1", "value1"], &["param2", "value2"]],
                    "Parameters",
                ),
            ],
        ),
        "10" => ModelResponse::tools(
            "Sequential output",
            vec![
                text_call("First message", false),
                ToolInvocation::new(
                    "output_progress",
                    json!({"current": 50, "total": 100, "status": "Working..."}),
                ),
                text_call("Third message", false),
            ],
        ),
        "11" => ModelResponse::tools(
            "Every output type twice",
            vec![
                text_call("Text, first time", false),
                text_call("Text, second time", false),
                table_call(&["Column 1", "Column 2"], &[&["r1c1", "r1c2"]], "Table 1"),
                table_call(&["Column A", "Column B"], &[&["rAc1", "rAc2"]], "Table 2"),
            ],
        ),
        _ => return None,
    };
    Some(response)
}

#[async_trait]
impl DecisionMaker for ScriptedDecisionMaker {
    async fn respond(
        &self,
        request: &str,
        tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let request = request.trim();
        debug!(request = %request, tools = tools.len(), "scripted decision-maker called");

        match request {
            "7" => {
                tokio::time::sleep(self.delay).await;
                Ok(ModelResponse::text("This response arrived after a delay"))
            }
            "8" => Err(ProviderError::Api(
                "500: simulated upstream failure".to_string(),
            )),
            other => Ok(scripted_response(other)
                .unwrap_or_else(|| ModelResponse::text("This is the default scripted response"))),
        }
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}
