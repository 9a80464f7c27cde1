use crate::acknowledge::AcknowledgeTool;
use crate::builtin::BuiltinTool;
use crate::error::ToolError;
use crate::traits::CustomTool;
use execstream_protocol::{EventStream, ToolDescriptor};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Built-in tools plus the custom tools registered at runtime. Custom tools
/// are keyed by name, so re-registering a name replaces the old entry.
pub struct ToolRegistry {
    custom: BTreeMap<String, Arc<dyn CustomTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            custom: BTreeMap::new(),
        }
    }

    /// Built-in descriptors first, then custom ones sorted by name.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        BuiltinTool::ALL
            .iter()
            .map(BuiltinTool::descriptor)
            .chain(self.custom.values().map(|tool| tool.descriptor()))
            .collect()
    }

    pub fn schemas(&self) -> Vec<Value> {
        self.list_tools()
            .iter()
            .map(ToolDescriptor::to_function_schema)
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CustomTool>> {
        self.custom.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        BuiltinTool::from_name(name).is_some() || self.custom.contains_key(name)
    }

    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }

    pub fn len(&self) -> usize {
        BuiltinTool::ALL.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a tool with real behaviour.
    pub fn register_tool(&mut self, tool: Arc<dyn CustomTool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if name.trim().is_empty() {
            return Err(ToolError::Registry("missing tool name".into()));
        }
        if name.trim() != name {
            return Err(ToolError::Registry(format!(
                "tool name '{name}' has surrounding whitespace"
            )));
        }
        if BuiltinTool::from_name(&name).is_some() {
            return Err(ToolError::Registry(format!(
                "'{name}' is a built-in tool and cannot be replaced"
            )));
        }
        if self.custom.insert(name.clone(), tool).is_some() {
            info!(tool = %name, "replaced custom tool");
        } else {
            info!(tool = %name, "registered custom tool");
        }
        Ok(())
    }

    /// Registers a descriptor-only tool answered by [`AcknowledgeTool`].
    pub fn register_descriptor(&mut self, descriptor: ToolDescriptor) -> Result<(), ToolError> {
        self.register_tool(Arc::new(AcknowledgeTool::new(descriptor)))
    }

    /// Registers a tool from a JSON descriptor and reports the result on
    /// `stream`.
    pub fn register(&mut self, descriptor: &Value, stream: &EventStream) -> bool {
        let result = descriptor_from_value(descriptor).and_then(|d| {
            let name = d.name.clone();
            self.register_descriptor(d).map(|_| name)
        });

        match result {
            Ok(name) => {
                stream.text(format!("Registered custom tool: {name}"));
                true
            }
            Err(e) => {
                warn!(error = %e, "custom tool registration rejected");
                stream.error(format!("Failed to register custom tool: {e}"));
                false
            }
        }
    }

    /// Removes a custom tool and reports the result on `stream`.
    pub fn unregister(&mut self, name: &str, stream: &EventStream) -> bool {
        let name = name.trim();
        if self.custom.remove(name).is_some() {
            info!(tool = %name, "unregistered custom tool");
            stream.text(format!("Unregistered custom tool: {name}"));
            true
        } else {
            let reason = if BuiltinTool::from_name(name).is_some() {
                format!("'{name}' is a built-in tool")
            } else {
                format!("tool '{name}' not found")
            };
            stream.error(format!("Failed to unregister custom tool: {reason}"));
            false
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn descriptor_from_value(value: &Value) -> Result<ToolDescriptor, ToolError> {
    if !value.is_object() {
        return Err(ToolError::Validation(
            "tool descriptor must be a JSON object".into(),
        ));
    }

    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ToolError::Validation("missing tool name".into()))?;

    let description = value
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let parameters = value
        .get("parameters")
        .or_else(|| value.get("parameterSchema"))
        .filter(|schema| !schema.is_null())
        .cloned()
        .unwrap_or_else(|| json!({"type": "object", "properties": {}}));

    if !parameters.is_object() {
        return Err(ToolError::Validation(
            "tool parameters must be a JSON object".into(),
        ));
    }

    Ok(ToolDescriptor::new(name, description, parameters))
}
