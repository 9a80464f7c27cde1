use crate::traits::*;
use async_trait::async_trait;
use execstream_protocol::{ToolDescriptor, ToolInvocation};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub struct OpenAiCompatibleDecisionMaker {
    client: Client,
    base_url: String,
    token: Option<String>,
    model: String,
}

impl OpenAiCompatibleDecisionMaker {
    pub fn new(
        base_url: String,
        token: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl DecisionMaker for OpenAiCompatibleDecisionMaker {
    async fn respond(
        &self,
        request: &str,
        tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": request}],
        });

        if !tools.is_empty() {
            let schemas: Vec<Value> = tools.iter().map(ToolDescriptor::to_function_schema).collect();
            body["tools"] = json!(schemas);
        }

        let mut http_request = self.client.post(&url).json(&body);

        if let Some(token) = &self.token {
            http_request = http_request.bearer_auth(token);
        }

        debug!(url = %url, model = %self.model, tools = tools.len(), "sending completion request");
        let response = http_request
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, "decision-maker returned an error status");
            return Err(ProviderError::Api(format!("{}: {}", status, text)));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_completion(&json)
    }

    fn name(&self) -> &str {
        "OpenAI Compatible"
    }
}

/// Reads either an OpenAI `choices[0].message` body or a direct
/// `{content, tool_calls}` body.
pub fn parse_completion(json: &Value) -> Result<ModelResponse, ProviderError> {
    if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ProviderError::Api(message));
    }

    let message = match json.get("choices") {
        Some(choices) => choices
            .get(0)
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?,
        None if json.get("content").is_some() || json.get("tool_calls").is_some() => json,
        None => {
            return Err(ProviderError::Parse(
                "Response has neither choices nor content".to_string(),
            ))
        }
    };

    let content = message["content"].as_str().map(|s| s.to_string());

    let tool_calls = match message["tool_calls"].as_array() {
        Some(calls) => calls
            .iter()
            .map(parse_tool_call)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(ModelResponse {
        content,
        tool_calls,
    })
}

fn parse_tool_call(call: &Value) -> Result<ToolInvocation, ProviderError> {
    // OpenAI nests the call under `function`; direct bodies do not.
    let function = call.get("function").unwrap_or(call);

    let name = function["name"]
        .as_str()
        .ok_or_else(|| ProviderError::Parse("Tool call without a name".to_string()))?;

    let raw = function
        .get("arguments")
        .or_else(|| function.get("parameters"))
        .unwrap_or(&Value::Null);

    let parameters = match raw {
        Value::String(text) if text.trim().is_empty() => json!({}),
        Value::String(text) => serde_json::from_str(text).map_err(|e| {
            ProviderError::Parse(format!("Invalid arguments for tool '{name}': {e}"))
        })?,
        Value::Null => json!({}),
        other => other.clone(),
    };

    Ok(ToolInvocation::new(name, parameters))
}
