use async_trait::async_trait;
use serde_json::Value;

use crate::args::Args;
use crate::error::{ConfigError, ToolError};

/// A tool's execution handler. One implementation per tool; receives
/// raw arguments (validation is the handler's own responsibility) and
/// returns the envelope payload map.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: &Args) -> Result<Args, ToolError>;
}

/// A registered tool: public metadata plus the executable handler.
/// The `input_schema` is what hosts see via list_tools; the handler
/// enforces the same contract independently at call time.
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub(crate) handler: Box<dyn ToolHandler>,
}

/// Public-facing tool metadata. Handlers are never exposed.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Ordered catalog of available tools. Populated once at startup by
/// static registration code; read-only afterwards, so concurrent
/// lookups need no locking.
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool, validating the descriptor first. Re-registering
    /// an existing name overwrites it in place (last write wins, order
    /// preserved) — the registry is populated from a fixed list, so a
    /// duplicate is an intentional replacement rather than an error.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), ConfigError> {
        let descriptor = ToolDescriptor {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler: Box::new(handler),
        };
        validate_descriptor(&descriptor)?;

        match self.tools.iter_mut().find(|t| t.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => self.tools.push(descriptor),
        }
        Ok(())
    }

    /// Ordered public metadata for every registered tool.
    pub fn list(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    }

    /// Look up a descriptor by name. Missing tools are the caller's
    /// decision to surface; this never errors.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_descriptor(descriptor: &ToolDescriptor) -> Result<(), ConfigError> {
    if descriptor.name.is_empty() {
        return Err(ConfigError::InvalidDescriptor {
            field: "name",
            reason: "must not be empty",
        });
    }
    if descriptor.description.is_empty() {
        return Err(ConfigError::InvalidDescriptor {
            field: "description",
            reason: "must not be empty",
        });
    }
    if !descriptor.input_schema.is_object() {
        return Err(ConfigError::InvalidDescriptor {
            field: "input_schema",
            reason: "must be an object schema",
        });
    }
    Ok(())
}
