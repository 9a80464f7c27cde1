use crate::config::{Config, InputSourceKind};
use anyhow::{Context, Result};
use execstream_core::{EntryPoint, ResponseInterpreter, SessionDriver};
use execstream_executor::CommandExecutor;
use execstream_providers::{DecisionMaker, OpenAiCompatibleDecisionMaker, ScriptedDecisionMaker};
use execstream_tools::{InputSource, NoInput, StdinInput, ToolDispatcher, ToolRegistry};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything a worker binary needs to serve requests.
pub struct Worker {
    pub driver: SessionDriver,
    /// Shared stdin reader, present when answers come from stdin.
    pub stdin: Option<StdinInput>,
}

pub fn build(entry: EntryPoint, config: &Config) -> Result<Worker> {
    let mut registry = ToolRegistry::new();
    for descriptor in &config.tools.custom {
        registry
            .register_descriptor(descriptor.clone())
            .with_context(|| format!("Failed to register configured tool '{}'", descriptor.name))?;
    }
    let registry = Arc::new(RwLock::new(registry));

    let stdin = match config.input.source {
        InputSourceKind::Stdin => Some(StdinInput::new(
            config.input.timeout_secs.map(Duration::from_secs),
        )),
        InputSourceKind::None => None,
    };
    let input: Arc<dyn InputSource> = match &stdin {
        Some(stdin) => Arc::new(stdin.clone()),
        None => Arc::new(NoInput),
    };

    let dispatcher = ToolDispatcher::new(registry)
        .with_input(input)
        .with_fallback_input(config.input.fallback.clone())
        .with_timeout_ms(config.tools.timeout_ms);

    let decision_maker = decision_maker(config)?;
    info!(
        decision_maker = %decision_maker.name(),
        custom_tools = config.tools.custom.len(),
        "worker configured"
    );

    let executor = CommandExecutor::from_current_dir()
        .context("Failed to determine the worker directory")?;

    let interpreter = ResponseInterpreter::new(Arc::new(dispatcher), decision_maker);
    Ok(Worker {
        driver: SessionDriver::new(entry, Arc::new(executor), interpreter),
        stdin,
    })
}

fn decision_maker(config: &Config) -> Result<Arc<dyn DecisionMaker>> {
    if config.use_mock {
        return Ok(Arc::new(ScriptedDecisionMaker::new()));
    }

    let token = Some(config.llm.token.clone()).filter(|t| !t.is_empty());
    let client = OpenAiCompatibleDecisionMaker::new(
        config.llm.base_url.clone(),
        token,
        config.llm.model.clone(),
        Duration::from_secs(config.llm.timeout_secs),
    )
    .context("Failed to create decision-maker client")?;
    Ok(Arc::new(client))
}
