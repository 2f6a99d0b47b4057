//! MCP protocol adapter.
//!
//! Everything wire-level (framing, transport, capability negotiation)
//! belongs to the rmcp SDK; this layer only maps the two host-facing
//! operations onto the dispatcher. Failed envelopes are still returned
//! as tool results with `is_error` set, so the host always receives one
//! envelope per call.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;
use serde_json::Value;

use crate::dispatcher::Dispatcher;

#[derive(Clone)]
pub struct ExtensionServer {
    name: String,
    version: String,
    dispatcher: Arc<Dispatcher>,
}

impl ExtensionServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>, dispatcher: Dispatcher) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Registry metadata mapped to the SDK's tool type.
    fn tool_listing(&self) -> Vec<Tool> {
        self.dispatcher
            .list_tools()
            .into_iter()
            .map(|info| {
                let schema = match info.input_schema {
                    Value::Object(map) => map,
                    // The registry rejects non-object schemas at
                    // registration time.
                    _ => serde_json::Map::new(),
                };
                Tool::new(
                    Cow::Owned(info.name),
                    Cow::Owned(info.description),
                    Arc::new(schema),
                )
            })
            .collect()
    }

    /// Run one dispatch and serialize the envelope. Returns the JSON
    /// text plus whether the envelope reported failure.
    async fn dispatch(&self, name: &str, arguments: Option<serde_json::Map<String, Value>>) -> Result<(String, bool), McpError> {
        let raw_args = match arguments {
            Some(map) => Value::Object(map),
            None => Value::Null,
        };
        let envelope = self.dispatcher.call(name, &raw_args).await;
        let text = serde_json::to_string_pretty(&envelope)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok((text, !envelope.success))
    }
}

impl ServerHandler for ExtensionServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone().into(),
                version: self.version.clone().into(),
                ..Default::default()
            },
            instructions: Some(
                "Desktop-extension tool server. Every call returns a JSON envelope \
                 with `success`, a payload or a classified `error`, and metadata \
                 with an ISO-8601 timestamp. Filesystem tools only operate inside \
                 the directories configured via ALLOWED_PATHS."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_listing(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let (text, failed) = self.dispatch(&request.name, request.arguments).await?;
        if failed {
            Ok(CallToolResult {
                content: vec![Content::text(text)],
                is_error: Some(true),
                structured_content: None,
                meta: None,
            })
        } else {
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::config::ExtensionConfig;
    use crate::tools::builtin_registry;

    fn server() -> ExtensionServer {
        let config = ExtensionConfig {
            name: "mcp-extension".into(),
            version: "0.1.0".into(),
            allowed_paths: vec!["/data".into()],
            logging_enabled: false,
            tool_timeout: None,
        };
        let registry = builtin_registry(&config).unwrap();
        ExtensionServer::new(config.name, config.version, Dispatcher::new(registry))
    }

    #[test]
    fn get_info_advertises_tools() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("ALLOWED_PATHS"));
    }

    #[test]
    fn tool_listing_exposes_metadata_only() {
        let tools = server().tool_listing();
        assert_eq!(tools.len(), 4);
        assert_eq!(tools[0].name, "hello");
        assert!(tools.iter().all(|t| !t.input_schema.is_empty()));
    }

    #[tokio::test]
    async fn dispatch_marks_failed_envelopes() {
        let srv = server();
        let (text, failed) = srv.dispatch("no_such_tool", None).await.unwrap();
        assert!(failed);
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["error"]["code"], json!("method_not_found"));
    }

    #[tokio::test]
    async fn dispatch_serializes_success_envelopes() {
        let srv = server();
        let args = json!({"message": "hi"}).as_object().cloned();
        let (text, failed) = srv.dispatch("echo", args).await.unwrap();
        assert!(!failed);
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["result"], json!({"echo": "hi"}));
        assert!(v["metadata"]["timestamp"].is_string());
    }
}
