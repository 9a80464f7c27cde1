use crate::builtin::{
    BuiltinTool, EndExecutionParams, OutputProgressParams, OutputTableParams, OutputTextParams,
    RequestUserInputParams,
};
use crate::context::ToolContext;
use crate::error::ToolError;
use crate::input::{InputSource, NoInput};
use crate::registry::ToolRegistry;
use crate::traits::{CustomTool, ToolResult};
use execstream_protocol::{EventStream, TableContent, ToolInvocation};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;

/// Result of routing one tool call.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// A built-in output tool wrote its event.
    Completed,
    /// `request_user_input` answer, possibly the fallback.
    Input(String),
    Custom(ToolResult),
    /// `end_execution` wrote the terminal event.
    Ended,
    /// No tool with that name.
    Unresolved,
    Failed(String),
}

impl DispatchOutcome {
    pub fn value(&self) -> Value {
        match self {
            DispatchOutcome::Input(answer) => Value::String(answer.clone()),
            DispatchOutcome::Custom(result) => {
                serde_json::to_value(result).unwrap_or(Value::Null)
            }
            _ => Value::Null,
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            DispatchOutcome::Completed | DispatchOutcome::Input(_) | DispatchOutcome::Ended => true,
            DispatchOutcome::Custom(result) => result.success,
            DispatchOutcome::Unresolved | DispatchOutcome::Failed(_) => false,
        }
    }
}

enum Route {
    Builtin(BuiltinTool),
    Custom(Arc<dyn CustomTool>),
    Unknown,
}

/// Routes tool calls to built-in behaviour or registered custom tools.
/// Failures never escape: they become error events on the stream.
pub struct ToolDispatcher {
    registry: Arc<RwLock<ToolRegistry>>,
    input: Arc<dyn InputSource>,
    fallback_input: String,
    timeout_ms: u64,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<RwLock<ToolRegistry>>) -> Self {
        Self {
            registry,
            input: Arc::new(NoInput),
            fallback_input: String::new(),
            timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
        }
    }

    pub fn with_input(mut self, input: Arc<dyn InputSource>) -> Self {
        self.input = input;
        self
    }

    pub fn with_fallback_input(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_input = fallback.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn registry(&self) -> &Arc<RwLock<ToolRegistry>> {
        &self.registry
    }

    pub async fn dispatch(
        &self,
        invocation: &ToolInvocation,
        stream: &EventStream,
    ) -> DispatchOutcome {
        let name = invocation.name.as_str();
        info!(tool = %name, sequence_id = %stream.sequence_id(), "dispatching tool");

        // Resolve before any await so the registry lock is never held across one.
        let route = match BuiltinTool::from_name(name) {
            Some(builtin) => Route::Builtin(builtin),
            None => {
                let custom = self.registry.read().get(name);
                custom.map_or(Route::Unknown, Route::Custom)
            }
        };

        let parameters = if invocation.parameters.is_null() {
            Value::Object(Default::default())
        } else {
            invocation.parameters.clone()
        };

        let result = match route {
            Route::Builtin(builtin) => self.run_builtin(builtin, parameters, stream).await,
            Route::Custom(tool) => self.run_custom(tool, parameters, stream).await,
            Route::Unknown => {
                warn!(tool = %name, "unknown tool requested");
                stream.error(format!("Unknown tool: {name}"));
                return DispatchOutcome::Unresolved;
            }
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(tool = %name, error = %e, "tool call failed");
                stream.error(format!("Tool '{name}' failed: {e}"));
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run_builtin(
        &self,
        tool: BuiltinTool,
        parameters: Value,
        stream: &EventStream,
    ) -> Result<DispatchOutcome, ToolError> {
        match tool {
            BuiltinTool::OutputText => {
                let params: OutputTextParams = parse_params(tool, parameters)?;
                stream.text_flagged(params.content, params.is_error);
                Ok(DispatchOutcome::Completed)
            }
            BuiltinTool::OutputTable => {
                let params: OutputTableParams = parse_params(tool, parameters)?;
                stream.table(TableContent {
                    header: params.header,
                    rows: params.rows,
                    metadata: params.metadata.unwrap_or_default(),
                });
                Ok(DispatchOutcome::Completed)
            }
            BuiltinTool::OutputProgress => {
                let params: OutputProgressParams = parse_params(tool, parameters)?;
                stream.progress(params.current, params.total, params.status);
                Ok(DispatchOutcome::Completed)
            }
            BuiltinTool::RequestUserInput => {
                let params: RequestUserInputParams = parse_params(tool, parameters)?;
                stream.input_request(params.prompt.clone());
                let answer = match self.input.next_input(&params.prompt).await {
                    Some(answer) => answer,
                    None => {
                        debug!("no user input available, using fallback answer");
                        self.fallback_input.clone()
                    }
                };
                Ok(DispatchOutcome::Input(answer))
            }
            BuiltinTool::EndExecution => {
                let params: EndExecutionParams = parse_params(tool, parameters)?;
                stream.end(params.message);
                Ok(DispatchOutcome::Ended)
            }
        }
    }

    async fn run_custom(
        &self,
        tool: Arc<dyn CustomTool>,
        parameters: Value,
        stream: &EventStream,
    ) -> Result<DispatchOutcome, ToolError> {
        let timeout_ms = self.timeout_ms;
        let ctx = ToolContext::new(stream.clone(), timeout_ms);

        // Spawned so a panicking handler is contained in its own task.
        let mut handle = tokio::spawn(async move { tool.invoke(&ctx, parameters).await });

        match timeout(Duration::from_millis(timeout_ms), &mut handle).await {
            Ok(Ok(result)) => {
                let result = result?;
                if !result.success {
                    warn!(error = ?result.error, "custom tool reported failure");
                }
                Ok(DispatchOutcome::Custom(result))
            }
            Ok(Err(join_err)) => {
                if join_err.is_panic() {
                    error!("custom tool panicked");
                    Err(ToolError::Panicked)
                } else {
                    error!("custom tool cancelled");
                    Err(ToolError::Execution("tool task was cancelled".into()))
                }
            }
            Err(_) => {
                handle.abort();
                warn!(timeout_ms, "custom tool timed out");
                Err(ToolError::Timeout(timeout_ms))
            }
        }
    }
}

fn parse_params<T: DeserializeOwned>(tool: BuiltinTool, parameters: Value) -> Result<T, ToolError> {
    serde_json::from_value(parameters)
        .map_err(|e| ToolError::Validation(format!("invalid parameters for {}: {e}", tool.name())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScriptedInput;
    use execstream_protocol::{EventContent, EventKind, Framer};
    use serde_json::json;

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(Arc::new(RwLock::new(ToolRegistry::new())))
    }

    #[tokio::test]
    async fn test_output_text_flagged() {
        let (framer, sink) = Framer::memory();
        let stream = framer.stream("s");
        let call = ToolInvocation::new("output_text", json!({"content": "bad", "isError": true}));

        let outcome = dispatcher().dispatch(&call, &stream).await;

        assert!(matches!(outcome, DispatchOutcome::Completed));
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Text);
        assert!(events[0].is_error);
    }

    #[tokio::test]
    async fn test_progress_defaults() {
        let (framer, sink) = Framer::memory();
        let call = ToolInvocation::new("output_progress", json!({"current": 40}));

        dispatcher().dispatch(&call, &framer.stream("s")).await;

        match &sink.events()[0].content {
            EventContent::Progress(p) => {
                assert_eq!((p.current, p.total), (40, 100));
                assert_eq!(p.status, "Processing...");
            }
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_user_input_uses_source_then_fallback() {
        let (framer, sink) = Framer::memory();
        let stream = framer.stream("s");
        let dispatcher = dispatcher()
            .with_input(Arc::new(ScriptedInput::new(["Ada"])))
            .with_fallback_input("anonymous");
        let call = ToolInvocation::new("request_user_input", json!({"prompt": "Name?"}));

        let first = dispatcher.dispatch(&call, &stream).await;
        let second = dispatcher.dispatch(&call, &stream).await;

        assert_eq!(first.value(), json!("Ada"));
        assert_eq!(second.value(), json!("anonymous"));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == EventKind::InputRequest));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_unresolved() {
        let (framer, sink) = Framer::memory();
        let call = ToolInvocation::new("fly", json!({}));

        let outcome = dispatcher().dispatch(&call, &framer.stream("s")).await;

        assert!(matches!(outcome, DispatchOutcome::Unresolved));
        assert_eq!(sink.events()[0].content.as_text(), Some("Unknown tool: fly"));
    }

    #[tokio::test]
    async fn test_invalid_builtin_parameters_fail_without_panic() {
        let (framer, sink) = Framer::memory();
        let call = ToolInvocation::new("output_table", json!({"header": "not a list"}));

        let outcome = dispatcher().dispatch(&call, &framer.stream("s")).await;

        assert!(matches!(outcome, DispatchOutcome::Failed(_)));
        assert_eq!(sink.events()[0].kind, EventKind::Error);
    }

    #[tokio::test]
    async fn test_end_execution_ends_stream() {
        let (framer, sink) = Framer::memory();
        let stream = framer.stream("s");
        let call = ToolInvocation::new("end_execution", Value::Null);

        let outcome = dispatcher().dispatch(&call, &stream).await;

        assert!(matches!(outcome, DispatchOutcome::Ended));
        assert!(stream.is_ended());
        assert!(sink.events()[0].is_end);
    }
}
