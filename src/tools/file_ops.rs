//! File inspection tool: read, list, search, stats.
//!
//! Every operation consults the allow-list before touching the
//! filesystem. Absence handling is deliberately asymmetric: `stats`
//! reports a missing target as data (`exists: false`), while `read` and
//! `list` require the target to exist and fail with `not_found`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::debug;

use crate::args::{bool_or, enum_or, require_enum, require_str, u64_or, Args};
use crate::error::ToolError;
use crate::guard::AllowedPaths;
use crate::registry::ToolHandler;

const OPERATIONS: &[&str] = &["read", "list", "search", "stats"];
const ENCODINGS: &[&str] = &["utf8", "binary", "base64"];

/// Default cap on read size, matching the original 1 MiB limit.
const DEFAULT_MAX_SIZE: u64 = 1024 * 1024;
/// Search stops after this many matches.
const MAX_SEARCH_RESULTS: usize = 100;

pub struct FileOpsHandler {
    guard: AllowedPaths,
}

impl FileOpsHandler {
    pub fn new(guard: AllowedPaths) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl ToolHandler for FileOpsHandler {
    async fn call(&self, args: &Args) -> Result<Args, ToolError> {
        let operation = require_enum(args, "operation", OPERATIONS)?;
        let path = PathBuf::from(require_str(args, "path")?);

        if !self.guard.is_allowed(&path) {
            return Err(ToolError::AccessDenied(path.display().to_string()));
        }

        debug!(operation, path = %path.display(), "file operation");
        match operation {
            "read" => {
                let max_size = u64_or(args, "max_size", DEFAULT_MAX_SIZE)?;
                let encoding = enum_or(args, "encoding", ENCODINGS, "utf8")?;
                read_file(&path, max_size, encoding).await
            }
            "list" => list_dir(&path).await,
            "search" => {
                let pattern = require_str(args, "pattern")?;
                let recursive = bool_or(args, "recursive", false)?;
                search_dir(&path, pattern, recursive).await
            }
            "stats" => stat_path(&path).await,
            _ => unreachable!("operation already validated"),
        }
    }
}

async fn read_file(path: &Path, max_size: u64, encoding: &str) -> Result<Args, ToolError> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ToolError::NotFound(format!(
                "file does not exist: {}",
                path.display()
            )))
        }
        Err(e) => return Err(e.into()),
    };
    if meta.is_dir() {
        return Err(ToolError::Validation(format!(
            "path is a directory, not a file: {}",
            path.display()
        )));
    }
    if meta.len() > max_size {
        return Err(ToolError::Validation(format!(
            "file size {} bytes exceeds maximum of {} bytes",
            meta.len(),
            max_size
        )));
    }

    let bytes = tokio::fs::read(path).await?;

    let mut out = Args::new();
    out.insert("path".into(), json!(path.display().to_string()));
    out.insert("size".into(), json!(bytes.len()));
    out.insert("encoding".into(), json!(encoding));
    match encoding {
        "utf8" => {
            let text = String::from_utf8_lossy(&bytes);
            out.insert("line_count".into(), json!(text.lines().count()));
            out.insert("char_count".into(), json!(text.chars().count()));
            out.insert("content".into(), json!(text));
        }
        // JSON cannot carry raw bytes; both binary and base64 encode.
        _ => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
            out.insert("content".into(), json!(encoded));
        }
    }
    Ok(out)
}

async fn stat_path(path: &Path) -> Result<Args, ToolError> {
    let mut out = Args::new();
    out.insert("path".into(), json!(path.display().to_string()));

    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // Absence is an expected, informative outcome for stats.
            out.insert("exists".into(), json!(false));
            return Ok(out);
        }
        Err(e) => return Err(e.into()),
    };

    out.insert("exists".into(), json!(true));
    out.insert("is_file".into(), json!(meta.is_file()));
    out.insert("is_directory".into(), json!(meta.is_dir()));
    if meta.is_file() {
        out.insert("size_bytes".into(), json!(meta.len()));
        out.insert("size_human".into(), json!(format_bytes(meta.len())));
    }
    if let Ok(modified) = meta.modified() {
        let ts: DateTime<Utc> = modified.into();
        out.insert("modified".into(), json!(ts.to_rfc3339()));
    }
    if let Some(name) = path.file_name() {
        out.insert("name".into(), json!(name.to_string_lossy()));
    }
    if let Some(ext) = path.extension() {
        out.insert("extension".into(), json!(ext.to_string_lossy()));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        out.insert(
            "permissions".into(),
            json!(format!("{:o}", meta.permissions().mode() & 0o7777)),
        );
    }
    Ok(out)
}

async fn list_dir(path: &Path) -> Result<Args, ToolError> {
    let mut reader = match tokio::fs::read_dir(path).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ToolError::NotFound(format!(
                "directory does not exist: {}",
                path.display()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotADirectory => {
            return Err(ToolError::NotFound(format!(
                "not a directory: {}",
                path.display()
            )))
        }
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let meta = entry.metadata().await?;
        let kind = if meta.is_dir() {
            "directory"
        } else if meta.is_file() {
            "file"
        } else {
            "other"
        };
        entries.push(json!({
            "name": entry.file_name().to_string_lossy(),
            "type": kind,
            "size": if meta.is_file() { Some(meta.len()) } else { None },
        }));
    }
    entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

    let mut out = Args::new();
    out.insert("path".into(), json!(path.display().to_string()));
    out.insert("count".into(), json!(entries.len()));
    out.insert("entries".into(), Value::Array(entries));
    Ok(out)
}

async fn search_dir(base: &Path, pattern: &str, recursive: bool) -> Result<Args, ToolError> {
    if pattern.is_empty() {
        return Err(ToolError::Validation("pattern must not be empty".into()));
    }
    let needle = pattern.to_lowercase();

    let mut matches = Vec::new();
    let mut truncated = false;
    let mut pending = vec![base.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut reader = match tokio::fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && dir.as_path() == base => {
                return Err(ToolError::NotFound(format!(
                    "directory does not exist: {}",
                    base.display()
                )))
            }
            // Unreadable subdirectories are skipped rather than failing
            // the whole search.
            Err(_) if dir.as_path() != base => continue,
            Err(e) => return Err(e.into()),
        };

        loop {
            let entry = match reader.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                // A directory that turns unreadable mid-iteration is
                // dropped the same way one that fails to open is.
                Err(_) if dir.as_path() != base => break,
                Err(e) => return Err(e.into()),
            };
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name.contains(&needle) {
                if matches.len() >= MAX_SEARCH_RESULTS {
                    truncated = true;
                    break;
                }
                let rel = entry
                    .path()
                    .strip_prefix(base)
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|_| entry.path());
                matches.push(json!(rel.to_string_lossy()));
            }
            // file_type() does not follow symlinks, so links out of the
            // allowed tree are never descended into.
            if recursive && entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                pending.push(entry.path());
            }
        }
        if truncated {
            break;
        }
    }
    matches.sort_by(|a, b| a.as_str().cmp(&b.as_str()));

    let mut out = Args::new();
    out.insert("path".into(), json!(base.display().to_string()));
    out.insert("pattern".into(), json!(pattern));
    out.insert("recursive".into(), json!(recursive));
    out.insert("count".into(), json!(matches.len()));
    out.insert("truncated".into(), json!(truncated));
    out.insert("matches".into(), Value::Array(matches));
    Ok(out)
}

fn format_bytes(size: u64) -> String {
    let mut value = size as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} TB")
}

pub fn file_ops_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "operation": {
                "type": "string",
                "enum": OPERATIONS,
                "description": "Operation to perform"
            },
            "path": {
                "type": "string",
                "description": "Target file or directory (must be inside an allowed directory)"
            },
            "pattern": {
                "type": "string",
                "description": "Case-insensitive substring matched against entry names (search only)"
            },
            "recursive": {
                "type": "boolean",
                "description": "Descend into subdirectories (search only)",
                "default": false
            },
            "max_size": {
                "type": "number",
                "description": "Maximum file size in bytes for read",
                "default": DEFAULT_MAX_SIZE
            },
            "encoding": {
                "type": "string",
                "enum": ENCODINGS,
                "description": "Content encoding for read",
                "default": "utf8"
            }
        },
        "required": ["operation", "path"]
    })
}
