//! MCP stdio server template for desktop extensions.
//!
//! The crate owns the tool registry, the dispatch/validation contract,
//! the result envelope, and the filesystem allow-list; the MCP wire
//! protocol itself is delegated to the rmcp SDK. Wire up a registry, a
//! dispatcher, and the server adapter, and serve over stdio:
//!
//! ```ignore
//! let config = ExtensionConfig::from_env()?;
//! let registry = tools::builtin_registry(&config)?;
//! let server = ExtensionServer::new(config.name, config.version, Dispatcher::new(registry));
//! server.serve(stdio()).await?;
//! ```

pub mod args;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod registry;
pub mod server;
pub mod tools;

pub use config::ExtensionConfig;
pub use dispatcher::Dispatcher;
pub use envelope::{Envelope, EnvelopeMeta, ErrorBody};
pub use error::{ConfigError, ToolError};
pub use guard::AllowedPaths;
pub use registry::{ToolDescriptor, ToolHandler, ToolInfo, ToolRegistry};
pub use server::ExtensionServer;
