use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ToolError;

/// The uniform wrapper returned for every tool invocation. On success the
/// handler's payload map is flattened into the top level; on failure only
/// `error` is populated. Both carry metadata with an ISO-8601 timestamp.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub metadata: EnvelopeMeta,
}

/// Classified failure: a human-readable message plus a stable code.
/// Never a stack trace.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EnvelopeMeta {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl Envelope {
    pub fn success(payload: Map<String, Value>, execution_time_ms: Option<u64>) -> Self {
        Self {
            success: true,
            payload,
            error: None,
            metadata: EnvelopeMeta {
                timestamp: Utc::now(),
                execution_time_ms,
            },
        }
    }

    pub fn failure(err: &ToolError) -> Self {
        Self {
            success: false,
            payload: Map::new(),
            error: Some(ErrorBody {
                message: err.to_string(),
                code: err.code(),
            }),
            metadata: EnvelopeMeta {
                timestamp: Utc::now(),
                execution_time_ms: None,
            },
        }
    }

    /// Classification code of a failed envelope, if any.
    pub fn error_code(&self) -> Option<&'static str> {
        self.error.as_ref().map(|e| e.code)
    }
}
