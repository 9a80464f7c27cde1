use crate::context::ToolContext;
use crate::error::ToolError;
use crate::traits::{CustomTool, ToolResult};
use async_trait::async_trait;
use execstream_protocol::ToolDescriptor;
use serde_json::json;

/// Handler given to tools registered from a bare descriptor. It reports the
/// call on the stream and acknowledges it.
pub struct AcknowledgeTool {
    descriptor: ToolDescriptor,
}

impl AcknowledgeTool {
    pub fn new(descriptor: ToolDescriptor) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl CustomTool for AcknowledgeTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn schema(&self) -> serde_json::Value {
        self.descriptor.parameters.clone()
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        parameters: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        ctx.stream
            .text(format!("Executing custom tool: {}", self.descriptor.name));
        ctx.stream.text(format!("Tool parameters: {parameters}"));

        Ok(ToolResult::ok(json!({
            "status": "success",
            "message": format!("Custom tool {} executed", self.descriptor.name)
        })))
    }

    fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }
}
