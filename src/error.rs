/// Failures a tool call can produce. Every variant maps to a stable
/// string code carried in the result envelope; none of them are allowed
/// to escape the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    MethodNotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Access denied: {0} is not within the allowed directories")]
    AccessDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("tool call timed out after {0}ms")]
    Timeout(u64),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Stable classification code for the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::MethodNotFound(_) => "method_not_found",
            ToolError::Validation(_) => "validation",
            ToolError::AccessDenied(_) => "access_denied",
            ToolError::NotFound(_) => "not_found",
            ToolError::Timeout(_) => "timeout",
            ToolError::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ToolError::NotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => ToolError::AccessDenied(err.to_string()),
            _ => ToolError::Internal(err.to_string()),
        }
    }
}

/// Startup-time failures. These are fatal: the extension refuses to start
/// rather than run with a partial registry or an unguarded filesystem.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid tool descriptor: {field} {reason}")]
    InvalidDescriptor {
        field: &'static str,
        reason: &'static str,
    },
    #[error("ALLOWED_PATHS is not set; filesystem tools require at least one allowed directory")]
    MissingAllowedPaths,
    #[error("invalid value for {name}: {value}")]
    InvalidEnvVar { name: &'static str, value: String },
}
