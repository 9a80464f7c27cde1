use crate::error::SessionError;
use execstream_protocol::EventStream;
use execstream_providers::{DecisionMaker, ModelResponse};
use execstream_tools::{DispatchOutcome, ToolDispatcher};
use std::sync::Arc;
use tracing::{debug, info};

pub const NO_CONTENT: &str = "No content in response";

#[derive(Debug, Clone)]
pub enum InvocationStatus {
    Dispatched(DispatchOutcome),
    /// Not dispatched because an earlier call ended the stream.
    Skipped,
}

/// What happened to one tool call of a response.
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub index: usize,
    pub name: String,
    pub status: InvocationStatus,
}

impl InvocationReport {
    pub fn outcome(&self) -> Option<&DispatchOutcome> {
        match &self.status {
            InvocationStatus::Dispatched(outcome) => Some(outcome),
            InvocationStatus::Skipped => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, InvocationStatus::Skipped)
    }
}

/// Turns decision-maker responses into events by running their tool calls
/// through the dispatcher.
pub struct ResponseInterpreter {
    dispatcher: Arc<ToolDispatcher>,
    decision_maker: Arc<dyn DecisionMaker>,
}

impl ResponseInterpreter {
    pub fn new(dispatcher: Arc<ToolDispatcher>, decision_maker: Arc<dyn DecisionMaker>) -> Self {
        Self {
            dispatcher,
            decision_maker,
        }
    }

    pub fn dispatcher(&self) -> &Arc<ToolDispatcher> {
        &self.dispatcher
    }

    pub fn decision_maker(&self) -> &Arc<dyn DecisionMaker> {
        &self.decision_maker
    }

    /// Tool calls win over content: a response with calls is handled only
    /// through them, in order.
    pub async fn interpret(
        &self,
        response: &ModelResponse,
        stream: &EventStream,
    ) -> Vec<InvocationReport> {
        if response.tool_calls.is_empty() {
            stream.text(response.text_content().unwrap_or(NO_CONTENT));
            return Vec::new();
        }

        let mut reports = Vec::with_capacity(response.tool_calls.len());
        for (index, call) in response.tool_calls.iter().enumerate() {
            let status = if stream.is_ended() {
                debug!(tool = %call.name, index, "stream already ended, skipping tool call");
                InvocationStatus::Skipped
            } else {
                InvocationStatus::Dispatched(self.dispatcher.dispatch(call, stream).await)
            };
            reports.push(InvocationReport {
                index,
                name: call.name.clone(),
                status,
            });
        }
        reports
    }

    /// Full round trip: ask the decision-maker about `text`, then interpret
    /// its answer, reporting progress along the way.
    pub async fn interpret_request(
        &self,
        text: &str,
        stream: &EventStream,
    ) -> Result<Vec<InvocationReport>, SessionError> {
        stream.progress(0, 100, "Sending request to decision-maker...");

        let tools = self.dispatcher.registry().read().list_tools();
        info!(
            decision_maker = %self.decision_maker.name(),
            tools = tools.len(),
            sequence_id = %stream.sequence_id(),
            "requesting decision"
        );
        let response = self.decision_maker.respond(text, &tools).await?;

        stream.progress(50, 100, "Processing response...");
        if !response.tool_calls.is_empty() {
            stream.progress(75, 100, "Processing tool calls...");
        }

        let reports = self.interpret(&response, stream).await;

        if !stream.is_ended() {
            stream.progress(100, 100, "Response handled");
        }
        Ok(reports)
    }
}
