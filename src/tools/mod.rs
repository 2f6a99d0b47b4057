//! Built-in tools and the registry they are assembled into.

pub mod file_ops;
pub mod hello;
pub mod system;

pub use file_ops::FileOpsHandler;
pub use hello::{EchoHandler, HelloHandler};
pub use system::SystemInfoHandler;

use crate::config::ExtensionConfig;
use crate::error::ConfigError;
use crate::guard::AllowedPaths;
use crate::registry::ToolRegistry;

/// Build the registry of built-in tools. Registration happens once at
/// process start; a descriptor failure here aborts startup.
pub fn builtin_registry(config: &ExtensionConfig) -> Result<ToolRegistry, ConfigError> {
    let guard = AllowedPaths::new(&config.allowed_paths);
    let allowed_display: Vec<String> = guard
        .roots()
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    let mut registry = ToolRegistry::new();
    registry.register(
        "hello",
        "Greet the caller in a chosen language and report server info",
        hello::hello_schema(),
        HelloHandler {
            server_name: config.name.clone(),
            server_version: config.version.clone(),
            allowed_paths: allowed_display.clone(),
        },
    )?;
    registry.register(
        "echo",
        "Echo a message back to the caller",
        hello::echo_schema(),
        EchoHandler,
    )?;
    registry.register(
        "file_operations",
        "Read, list, search, and stat files inside the allowed directories",
        file_ops::file_ops_schema(),
        FileOpsHandler::new(guard),
    )?;
    registry.register(
        "system_info",
        "Report system, hardware, process, environment, and network information",
        system::system_info_schema(),
        SystemInfoHandler {
            allowed_paths: allowed_display,
        },
    )?;
    Ok(registry)
}
