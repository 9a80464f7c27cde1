use crate::commands::{self, Subcommand};
use crate::error::SessionError;
use crate::interpreter::ResponseInterpreter;
use execstream_executor::{CommandExecutor, HostSnapshot};
use execstream_protocol::{EventStream, Framer, Request, TableContent};
use execstream_tools::ToolRegistry;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Which worker binary is driving: `Exec` always runs the content as a
/// shell command, `Interactive` reads it as a sub-command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    Exec,
    Interactive,
}

/// Handles one request end to end. Whatever happens, the request's stream
/// is closed with exactly one `end` event.
pub struct SessionDriver {
    entry: EntryPoint,
    executor: Arc<CommandExecutor>,
    interpreter: ResponseInterpreter,
}

impl SessionDriver {
    pub fn new(
        entry: EntryPoint,
        executor: Arc<CommandExecutor>,
        interpreter: ResponseInterpreter,
    ) -> Self {
        Self {
            entry,
            executor,
            interpreter,
        }
    }

    pub fn entry(&self) -> EntryPoint {
        self.entry
    }

    pub fn registry(&self) -> &Arc<RwLock<ToolRegistry>> {
        self.interpreter.dispatcher().registry()
    }

    pub fn interpreter(&self) -> &ResponseInterpreter {
        &self.interpreter
    }

    pub async fn handle(&self, request: &Request, framer: &Framer) -> Result<(), SessionError> {
        let stream = framer.stream(request.sequence_id.clone());
        info!(
            entry = ?self.entry,
            sequence_id = %request.sequence_id,
            format = ?request.format,
            "handling request"
        );

        let project_dir = request.project_dir.as_deref();
        let result = match self.entry {
            EntryPoint::Exec => self.execute(&request.content, project_dir, &stream).await,
            EntryPoint::Interactive => {
                let subcommand = Subcommand::parse(&request.content);
                self.run_subcommand(subcommand, project_dir, &stream).await
            }
        };

        if let Err(e) = &result {
            warn!(kind = e.kind(), error = %e, sequence_id = %request.sequence_id, "request failed");
            // The executor already reported its own failures on the stream.
            if !matches!(e, SessionError::Execution(_)) {
                stream.error(e.to_string());
            }
        }

        stream.finish();
        result
    }

    async fn execute(
        &self,
        command: &str,
        project_dir: Option<&Path>,
        stream: &EventStream,
    ) -> Result<(), SessionError> {
        let report = self.executor.run(command, project_dir, stream).await;
        match report.error {
            Some(error) => Err(SessionError::Execution(error)),
            None => Ok(()),
        }
    }

    async fn run_subcommand(
        &self,
        subcommand: Subcommand,
        project_dir: Option<&Path>,
        stream: &EventStream,
    ) -> Result<(), SessionError> {
        match subcommand {
            Subcommand::Help => {
                for line in commands::HELP_LINES {
                    stream.text(*line);
                }
                Ok(())
            }
            Subcommand::Run => {
                run_showcase(stream);
                Ok(())
            }
            Subcommand::Info(topic) => {
                self.show_info(&topic, project_dir, stream);
                Ok(())
            }
            Subcommand::Generate(language) => {
                stream.text(format!("Generated {language} code:"));
                stream.code(commands::code_sample(&language));
                Ok(())
            }
            Subcommand::Exec(command) => self.execute(&command, project_dir, stream).await,
            Subcommand::Tools => {
                stream.table(self.tools_table());
                Ok(())
            }
            Subcommand::Register(descriptor) => {
                let descriptor: Value = serde_json::from_str(&descriptor).map_err(|e| {
                    SessionError::Dispatch(format!("Failed to register custom tool: {e}"))
                })?;
                self.registry().write().register(&descriptor, stream);
                Ok(())
            }
            Subcommand::Unregister(name) => {
                if name.is_empty() {
                    return Err(SessionError::Input(
                        "Please provide the name of the tool to unregister".to_string(),
                    ));
                }
                self.registry().write().unregister(&name, stream);
                Ok(())
            }
            Subcommand::Ask(text) => {
                if text.is_empty() {
                    return Err(SessionError::Input(
                        "Please provide content for the decision-maker".to_string(),
                    ));
                }
                self.interpreter.interpret_request(&text, stream).await?;
                Ok(())
            }
            Subcommand::Prompt(text) => {
                self.interpreter.interpret_request(&text, stream).await?;
                Ok(())
            }
        }
    }

    fn show_info(&self, topic: &str, project_dir: Option<&Path>, stream: &EventStream) {
        stream.text(format!("Information about '{topic}':"));

        if topic == "system" {
            let workspace = self.executor.resolve_dir(project_dir);
            stream.table(HostSnapshot::capture(&workspace).to_table());
            return;
        }

        match commands::info_text(topic) {
            Some(text) => stream.text(text),
            None => stream.text(format!("No information available for topic: {topic}")),
        };

        if topic == "commands" {
            stream.text("Try executing this sample command:");
            stream.command(commands::INFO_SAMPLE_COMMAND);
        }
    }

    fn tools_table(&self) -> TableContent {
        let registry = self.registry().read();
        let rows = registry
            .list_tools()
            .into_iter()
            .map(|descriptor| {
                let kind = if registry.get(&descriptor.name).is_some() {
                    "custom"
                } else {
                    "built-in"
                };
                vec![
                    json!(descriptor.name),
                    json!(descriptor.description),
                    json!(kind),
                ]
            })
            .collect();

        let mut metadata = serde_json::Map::new();
        metadata.insert("title".to_string(), json!("Available tools"));
        TableContent {
            header: vec![json!("Name"), json!("Description"), json!("Kind")],
            rows,
            metadata,
        }
    }
}

fn run_showcase(stream: &EventStream) {
    stream.text("Running sample interactive command...");
    stream.text("This is a sample output from the main command.");
    stream.text("The following code demonstrates how to list files in a directory:");
    stream.command(commands::SHOWCASE_LISTING);
    stream.table(commands::showcase_table());
    stream.code(commands::SHOWCASE_CODE);
    stream.text("After executing the code above, you can analyze the results.");
    stream.text("Here's another example of creating a new directory:");
    stream.command(commands::SHOWCASE_MKDIR);
    stream.text("Sample command execution completed.");
}
