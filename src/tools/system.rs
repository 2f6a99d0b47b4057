//! System introspection tool.

use async_trait::async_trait;
use serde_json::{json, Value};
use sysinfo::{Networks, System};

use crate::args::{bool_or, enum_or, Args};
use crate::error::ToolError;
use crate::registry::ToolHandler;

const CATEGORIES: &[&str] = &["overview", "hardware", "process", "environment", "network"];

/// Environment variables whose names contain one of these fragments are
/// never reported.
const SENSITIVE_FRAGMENTS: &[&str] = &["password", "secret", "key", "token"];

/// Bounded sample size for the environment listing.
const ENV_SAMPLE_LIMIT: usize = 10;

pub struct SystemInfoHandler {
    pub allowed_paths: Vec<String>,
}

#[async_trait]
impl ToolHandler for SystemInfoHandler {
    async fn call(&self, args: &Args) -> Result<Args, ToolError> {
        let category = enum_or(args, "category", CATEGORIES, "overview")?;
        let detailed = bool_or(args, "detailed", false)?;

        let mut out = Args::new();
        out.insert("category".into(), json!(category));
        match category {
            "overview" => overview(&mut out, detailed),
            "hardware" => hardware(&mut out, detailed),
            "process" => process(&mut out, detailed)?,
            "environment" => environment(&mut out, &self.allowed_paths, detailed),
            "network" => network(&mut out, detailed),
            _ => unreachable!("category already validated"),
        }
        Ok(out)
    }
}

fn overview(out: &mut Args, detailed: bool) {
    out.insert("os".into(), json!(System::name()));
    out.insert("os_version".into(), json!(System::os_version()));
    out.insert("hostname".into(), json!(System::host_name()));
    out.insert("arch".into(), json!(std::env::consts::ARCH));
    if detailed {
        out.insert("kernel_version".into(), json!(System::kernel_version()));
        out.insert("long_os_version".into(), json!(System::long_os_version()));
        out.insert("uptime_seconds".into(), json!(System::uptime()));
    }
}

fn hardware(out: &mut Args, detailed: bool) {
    let sys = System::new_all();
    out.insert("cpu_count".into(), json!(sys.cpus().len()));
    out.insert("physical_cores".into(), json!(sys.physical_core_count()));
    out.insert("total_memory_bytes".into(), json!(sys.total_memory()));
    out.insert("available_memory_bytes".into(), json!(sys.available_memory()));
    if detailed {
        out.insert(
            "cpu_brand".into(),
            json!(sys.cpus().first().map(|c| c.brand().to_string())),
        );
        out.insert("used_memory_bytes".into(), json!(sys.used_memory()));
        out.insert("total_swap_bytes".into(), json!(sys.total_swap()));
    }
}

fn process(out: &mut Args, detailed: bool) -> Result<(), ToolError> {
    out.insert("pid".into(), json!(std::process::id()));
    if let Ok(exe) = std::env::current_exe() {
        out.insert("executable".into(), json!(exe.display().to_string()));
    }
    if let Ok(cwd) = std::env::current_dir() {
        out.insert("current_directory".into(), json!(cwd.display().to_string()));
    }

    if detailed {
        let sys = System::new_all();
        let pid = sysinfo::get_current_pid()
            .map_err(|e| ToolError::Internal(format!("cannot determine pid: {e}")))?;
        if let Some(proc_info) = sys.process(pid) {
            out.insert("memory_bytes".into(), json!(proc_info.memory()));
            out.insert("start_time_epoch".into(), json!(proc_info.start_time()));
        }
    }
    Ok(())
}

fn environment(out: &mut Args, allowed_paths: &[String], detailed: bool) {
    let all: Vec<(String, String)> = std::env::vars().collect();
    out.insert("environment_count".into(), json!(all.len()));
    out.insert("allowed_paths".into(), json!(allowed_paths));
    out.insert("safe_environment".into(), Value::Object(safe_sample(&all)));
    if detailed {
        if let Ok(cwd) = std::env::current_dir() {
            out.insert("current_directory".into(), json!(cwd.display().to_string()));
        }
    }
}

/// Filter out sensitive variables and report a bounded sample. The cap
/// is unconditional; nothing ever widens the listing to the full
/// environment.
fn safe_sample(vars: &[(String, String)]) -> Args {
    let mut safe: Vec<&(String, String)> = vars
        .iter()
        .filter(|(k, _)| {
            let lower = k.to_lowercase();
            !SENSITIVE_FRAGMENTS.iter().any(|s| lower.contains(s))
        })
        .collect();
    safe.sort_by(|a, b| a.0.cmp(&b.0));
    safe.into_iter()
        .take(ENV_SAMPLE_LIMIT)
        .map(|(k, v)| (k.clone(), json!(v)))
        .collect()
}

fn network(out: &mut Args, detailed: bool) {
    let networks = Networks::new_with_refreshed_list();
    let mut interfaces: Vec<Value> = networks
        .iter()
        .map(|(name, data)| {
            if detailed {
                json!({
                    "name": name,
                    "total_received_bytes": data.total_received(),
                    "total_transmitted_bytes": data.total_transmitted(),
                })
            } else {
                json!({ "name": name })
            }
        })
        .collect();
    interfaces.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
    out.insert("interface_count".into(), json!(interfaces.len()));
    out.insert("interfaces".into(), Value::Array(interfaces));
}

pub fn system_info_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "category": {
                "type": "string",
                "enum": CATEGORIES,
                "description": "Information category",
                "default": "overview"
            },
            "detailed": {
                "type": "boolean",
                "description": "Include additional detail",
                "default": false
            }
        },
        "required": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn handler() -> SystemInfoHandler {
        SystemInfoHandler {
            allowed_paths: vec!["/data".into()],
        }
    }

    fn args(v: Value) -> Args {
        v.as_object().cloned().unwrap_or_else(Map::new)
    }

    #[tokio::test]
    async fn defaults_to_overview() {
        let out = handler().call(&args(json!({}))).await.unwrap();
        assert_eq!(out["category"], json!("overview"));
        assert_eq!(out["arch"], json!(std::env::consts::ARCH));
    }

    #[tokio::test]
    async fn rejects_unknown_category() {
        let err = handler()
            .call(&args(json!({"category": "disk"})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "validation");
        assert!(err.to_string().contains("category"));
    }

    #[tokio::test]
    async fn hardware_reports_memory() {
        let out = handler()
            .call(&args(json!({"category": "hardware"})))
            .await
            .unwrap();
        assert!(out["total_memory_bytes"].as_u64().unwrap() > 0);
        assert!(out["cpu_count"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn process_reports_pid() {
        let out = handler()
            .call(&args(json!({"category": "process"})))
            .await
            .unwrap();
        assert_eq!(out["pid"], json!(std::process::id()));
    }

    #[test]
    fn safe_sample_filters_sensitive_variables() {
        let vars = vec![
            ("AAA_API_TOKEN".to_string(), "t".to_string()),
            ("AAB_PASSWORD".to_string(), "p".to_string()),
            ("AAC_SECRET_SAUCE".to_string(), "s".to_string()),
            ("AAD_SSH_KEY".to_string(), "k".to_string()),
            ("AAE_PLAIN".to_string(), "ok".to_string()),
        ];
        let sample = safe_sample(&vars);
        assert_eq!(sample.len(), 1);
        assert_eq!(sample["AAE_PLAIN"], json!("ok"));
    }

    #[test]
    fn safe_sample_is_bounded_regardless_of_size() {
        let vars: Vec<(String, String)> = (0..40)
            .map(|i| (format!("VAR_{i:02}"), format!("v{i}")))
            .collect();
        let sample = safe_sample(&vars);
        assert_eq!(sample.len(), ENV_SAMPLE_LIMIT);
        // Sorted by name, so the sample is deterministic.
        assert!(sample.contains_key("VAR_00"));
        assert!(!sample.contains_key("VAR_39"));
    }

    #[tokio::test]
    async fn environment_sample_is_bounded_even_when_detailed() {
        let out = handler()
            .call(&args(json!({"category": "environment", "detailed": true})))
            .await
            .unwrap();
        let safe = out["safe_environment"].as_object().unwrap();
        assert!(safe.len() <= ENV_SAMPLE_LIMIT);
        assert_eq!(out["allowed_paths"], json!(["/data"]));
    }
}
