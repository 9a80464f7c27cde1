use async_trait::async_trait;
use execstream_protocol::{EventKind, Framer, ToolInvocation};
use execstream_tools::{
    CustomTool, DispatchOutcome, ToolContext, ToolDispatcher, ToolError, ToolRegistry, ToolResult,
};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

struct Deploy;

#[async_trait]
impl CustomTool for Deploy {
    fn name(&self) -> &str {
        "deploy"
    }

    fn description(&self) -> &str {
        "Deploy a service"
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {"env": {"type": "string"}}, "required": ["env"]})
    }

    async fn invoke(&self, ctx: &ToolContext, parameters: Value) -> Result<ToolResult, ToolError> {
        let env = parameters["env"]
            .as_str()
            .ok_or_else(|| ToolError::Validation("env is required".into()))?;
        ctx.stream.text(format!("deploying to {env}"));
        Ok(ToolResult::ok(json!({"env": env})))
    }
}

struct Panics;

#[async_trait]
impl CustomTool for Panics {
    fn name(&self) -> &str {
        "panics"
    }

    fn description(&self) -> &str {
        "Always panics"
    }

    fn schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn invoke(&self, _ctx: &ToolContext, _parameters: Value) -> Result<ToolResult, ToolError> {
        panic!("handler bug");
    }
}

struct Slow;

#[async_trait]
impl CustomTool for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "Never finishes in time"
    }

    fn schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn invoke(&self, _ctx: &ToolContext, _parameters: Value) -> Result<ToolResult, ToolError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ToolResult::ok(Value::Null))
    }
}

fn dispatcher() -> ToolDispatcher {
    let mut registry = ToolRegistry::new();
    registry.register_tool(Arc::new(Deploy)).unwrap();
    registry.register_tool(Arc::new(Panics)).unwrap();
    registry.register_tool(Arc::new(Slow)).unwrap();
    ToolDispatcher::new(Arc::new(RwLock::new(registry))).with_timeout_ms(200)
}

#[tokio::test]
async fn test_custom_tool_result_and_events() {
    let (framer, sink) = Framer::memory();
    let stream = framer.stream("c1");

    let outcome = dispatcher()
        .dispatch(&ToolInvocation::new("deploy", json!({"env": "prod"})), &stream)
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.value()["output"]["env"], "prod");
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].content.as_text(), Some("deploying to prod"));
    assert_eq!(events[0].sequence_id, "c1");
}

#[tokio::test]
async fn test_handler_error_becomes_error_event() {
    let (framer, sink) = Framer::memory();

    let outcome = dispatcher()
        .dispatch(&ToolInvocation::new("deploy", json!({})), &framer.stream("c2"))
        .await;

    assert!(matches!(outcome, DispatchOutcome::Failed(_)));
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Error);
    assert!(events[0].content.as_text().unwrap().contains("env is required"));
}

#[tokio::test]
async fn test_panicking_handler_is_contained() {
    let (framer, sink) = Framer::memory();
    let stream = framer.stream("c3");
    let dispatcher = dispatcher();

    let outcome = dispatcher
        .dispatch(&ToolInvocation::new("panics", json!({})), &stream)
        .await;
    assert!(matches!(outcome, DispatchOutcome::Failed(ref m) if m.contains("panicked")));

    // The dispatcher keeps working afterwards.
    let outcome = dispatcher
        .dispatch(&ToolInvocation::new("output_text", json!({"content": "still here"})), &stream)
        .await;
    assert!(matches!(outcome, DispatchOutcome::Completed));
    assert_eq!(sink.events().len(), 2);
}

#[tokio::test]
async fn test_slow_handler_times_out() {
    let (framer, sink) = Framer::memory();

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        dispatcher().dispatch(&ToolInvocation::new("slow", json!({})), &framer.stream("c4")),
    )
    .await
    .expect("dispatch should not hang");

    assert!(matches!(outcome, DispatchOutcome::Failed(ref m) if m.contains("timed out")));
    assert_eq!(sink.events()[0].kind, EventKind::Error);
}

#[tokio::test]
async fn test_unregistered_tool_becomes_unknown() {
    let (framer, sink) = Framer::memory();
    let stream = framer.stream("c5");
    let dispatcher = dispatcher();

    assert!(dispatcher.registry().write().unregister("deploy", &stream));
    let outcome = dispatcher
        .dispatch(&ToolInvocation::new("deploy", json!({"env": "prod"})), &stream)
        .await;

    assert!(matches!(outcome, DispatchOutcome::Unresolved));
    assert_eq!(
        sink.events().last().unwrap().content.as_text(),
        Some("Unknown tool: deploy")
    );
}
