//! Greeting and echo tools.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::args::{enum_or, require_str, str_or, Args};
use crate::error::ToolError;
use crate::registry::ToolHandler;

const LANGUAGES: &[&str] = &["en", "es", "fr", "de"];

/// Greets the caller in one of a fixed set of languages. Also reports
/// basic server info so a host can sanity-check its wiring.
pub struct HelloHandler {
    pub server_name: String,
    pub server_version: String,
    pub allowed_paths: Vec<String>,
}

#[async_trait]
impl ToolHandler for HelloHandler {
    async fn call(&self, args: &Args) -> Result<Args, ToolError> {
        let name = str_or(args, "name", "World")?;
        let language = enum_or(args, "language", LANGUAGES, "en")?;

        let greeting = match language {
            "es" => format!("¡Hola, {name}!"),
            "fr" => format!("Bonjour, {name}!"),
            "de" => format!("Hallo, {name}!"),
            _ => format!("Hello, {name}!"),
        };

        let mut out = Args::new();
        out.insert("greeting".into(), json!(greeting));
        out.insert("language".into(), json!(language));
        out.insert(
            "server".into(),
            json!({
                "name": self.server_name,
                "version": self.server_version,
                "allowed_paths": self.allowed_paths,
            }),
        );
        Ok(out)
    }
}

pub fn hello_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Name to greet",
                "default": "World"
            },
            "language": {
                "type": "string",
                "enum": LANGUAGES,
                "description": "Language for the greeting",
                "default": "en"
            }
        },
        "required": []
    })
}

/// Echoes the required `message` back to the caller.
pub struct EchoHandler;

#[async_trait]
impl ToolHandler for EchoHandler {
    async fn call(&self, args: &Args) -> Result<Args, ToolError> {
        let message = require_str(args, "message")?;
        let mut out = Args::new();
        out.insert("result".into(), json!({ "echo": message }));
        Ok(out)
    }
}

pub fn echo_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "message": {
                "type": "string",
                "description": "Message to echo back"
            }
        },
        "required": ["message"]
    })
}
