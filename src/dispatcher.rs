use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::args::Args;
use crate::envelope::Envelope;
use crate::error::ToolError;
use crate::registry::{ToolInfo, ToolRegistry};

/// Routes tool calls: registry lookup, handler invocation, and
/// normalization of every outcome into one [`Envelope`].
///
/// The single correctness property that matters here is that a faulty
/// tool produces a failed envelope instead of taking down the host's
/// long-lived subprocess; nothing a handler returns or does escapes
/// `call`.
pub struct Dispatcher {
    registry: ToolRegistry,
    call_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            call_timeout: None,
        }
    }

    /// Bound each handler invocation by a wall-clock timeout. On expiry
    /// the call yields a `timeout` envelope and the handler's result is
    /// discarded (the underlying operation may still run to completion).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Ordered public metadata for the host's list-tools request.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.registry.list()
    }

    /// Execute one tool call. Always returns exactly one envelope.
    pub async fn call(&self, name: &str, raw_args: &Value) -> Envelope {
        let Some(tool) = self.registry.get(name) else {
            debug!(tool = name, "unknown tool requested");
            return Envelope::failure(&ToolError::MethodNotFound(name.to_string()));
        };

        // Arguments arrive as an object mapping or nothing at all;
        // anything else never reaches the handler.
        let args: Args = match raw_args {
            Value::Object(map) => map.clone(),
            Value::Null => Args::new(),
            _ => {
                return Envelope::failure(&ToolError::Validation(
                    "arguments must be an object".into(),
                ))
            }
        };

        let started = Instant::now();
        let outcome = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, tool.handler.call(&args)).await {
                Ok(result) => result,
                Err(_) => Err(ToolError::Timeout(limit.as_millis() as u64)),
            },
            None => tool.handler.call(&args).await,
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(payload) => {
                debug!(tool = name, elapsed_ms, "tool call succeeded");
                Envelope::success(payload, Some(elapsed_ms))
            }
            Err(err) => {
                match err {
                    ToolError::Internal(_) => {
                        warn!(tool = name, error = %err, "tool call failed unexpectedly")
                    }
                    _ => debug!(tool = name, error = %err, code = err.code(), "tool call failed"),
                }
                Envelope::failure(&err)
            }
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::args::require_str;
    use crate::registry::ToolHandler;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn call(&self, args: &Args) -> Result<Args, ToolError> {
            let message = require_str(args, "message")?;
            let mut out = Args::new();
            out.insert("result".into(), json!({ "echo": message }));
            Ok(out)
        }
    }

    /// Counts invocations so tests can assert a handler never ran.
    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl ToolHandler for CountingHandler {
        async fn call(&self, _args: &Args) -> Result<Args, ToolError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Args::new())
        }
    }

    struct SlowHandler;

    #[async_trait]
    impl ToolHandler for SlowHandler {
        async fn call(&self, _args: &Args) -> Result<Args, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Args::new())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ToolHandler for FailingHandler {
        async fn call(&self, _args: &Args) -> Result<Args, ToolError> {
            Err(ToolError::Internal("disk on fire".into()))
        }
    }

    fn schema() -> Value {
        json!({"type": "object", "properties": {"message": {"type": "string"}}})
    }

    fn echo_dispatcher() -> Dispatcher {
        let mut reg = ToolRegistry::new();
        reg.register("echo", "Echo a message back", schema(), EchoHandler)
            .unwrap();
        Dispatcher::new(reg)
    }

    #[tokio::test]
    async fn valid_call_returns_success_envelope() {
        let env = echo_dispatcher().call("echo", &json!({"message": "hi"})).await;
        assert!(env.success);
        assert_eq!(env.payload["result"], json!({"echo": "hi"}));
        assert!(env.metadata.execution_time_ms.is_some());
    }

    #[tokio::test]
    async fn unknown_tool_is_method_not_found_and_runs_nothing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut reg = ToolRegistry::new();
        reg.register(
            "tracked",
            "Counts calls",
            schema(),
            CountingHandler(counter.clone()),
        )
        .unwrap();
        let dispatcher = Dispatcher::new(reg);

        let env = dispatcher.call("nope", &json!({})).await;
        assert!(!env.success);
        assert_eq!(env.error_code(), Some("method_not_found"));
        assert!(env.error.unwrap().message.contains("nope"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_required_field_is_validation_error() {
        let env = echo_dispatcher().call("echo", &json!({})).await;
        assert!(!env.success);
        assert_eq!(env.error_code(), Some("validation"));
        assert!(env.error.unwrap().message.contains("message"));
    }

    #[tokio::test]
    async fn non_object_arguments_never_reach_the_handler() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut reg = ToolRegistry::new();
        reg.register(
            "tracked",
            "Counts calls",
            schema(),
            CountingHandler(counter.clone()),
        )
        .unwrap();
        let dispatcher = Dispatcher::new(reg);

        let env = dispatcher.call("tracked", &json!([1, 2])).await;
        assert_eq!(env.error_code(), Some("validation"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn null_arguments_mean_empty_object() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut reg = ToolRegistry::new();
        reg.register(
            "tracked",
            "Counts calls",
            schema(),
            CountingHandler(counter.clone()),
        )
        .unwrap();
        let dispatcher = Dispatcher::new(reg);

        let env = dispatcher.call("tracked", &Value::Null).await;
        assert!(env.success);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_failure_becomes_internal_envelope() {
        let mut reg = ToolRegistry::new();
        reg.register("broken", "Always fails", schema(), FailingHandler)
            .unwrap();
        let dispatcher = Dispatcher::new(reg);

        let env = dispatcher.call("broken", &json!({})).await;
        assert!(!env.success);
        assert_eq!(env.error_code(), Some("internal"));
        assert!(env.error.unwrap().message.contains("disk on fire"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handler_times_out_when_bounded() {
        let mut reg = ToolRegistry::new();
        reg.register("slow", "Sleeps forever", schema(), SlowHandler)
            .unwrap();
        let dispatcher = Dispatcher::new(reg).with_timeout(Duration::from_millis(50));

        let env = dispatcher.call("slow", &json!({})).await;
        assert!(!env.success);
        assert_eq!(env.error_code(), Some("timeout"));
    }

    #[tokio::test]
    async fn list_tools_matches_registry_order() {
        let dispatcher = echo_dispatcher();
        let tools = dispatcher.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");
        assert_eq!(dispatcher.list_tools(), tools);
    }
}
