use crate::context::ToolContext;
use crate::error::ToolError;
use async_trait::async_trait;
use execstream_protocol::ToolDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: serde_json::Value) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}

/// Extension point for runtime-registered tools. Hosts implement this to
/// give a custom tool real behaviour.
#[async_trait]
pub trait CustomTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> serde_json::Value;

    async fn invoke(
        &self,
        ctx: &ToolContext,
        parameters: serde_json::Value,
    ) -> Result<ToolResult, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description(), self.schema())
    }
}
