use async_trait::async_trait;
use execstream_protocol::{ToolDescriptor, ToolInvocation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("API error: {0}")]
    Api(String),
}

/// What a decision-maker answered: free text, tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolInvocation>,
}

impl ModelResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tools(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls,
        }
    }

    /// The content as sent, unless it is missing or blank.
    pub fn text_content(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// The external component that turns a request into text and tool calls.
#[async_trait]
pub trait DecisionMaker: Send + Sync {
    async fn respond(
        &self,
        request: &str,
        tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, ProviderError>;

    fn name(&self) -> &str;
}
