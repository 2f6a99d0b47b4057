//! Argument extraction for tool handlers.
//!
//! Each tool validates its own arguments before doing any work. These
//! helpers keep the error messages uniform: every failure names the
//! offending field, and the handler is never invoked on bad input.

use serde_json::{Map, Value};

use crate::error::ToolError;

pub type Args = Map<String, Value>;

/// A required string field.
pub fn require_str<'a>(args: &'a Args, field: &str) -> Result<&'a str, ToolError> {
    match args.get(field) {
        None | Some(Value::Null) => Err(ToolError::Validation(format!("{field} is required"))),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ToolError::Validation(format!("{field} must be a string"))),
    }
}

/// An optional string field with a default.
pub fn str_or<'a>(args: &'a Args, field: &str, default: &'a str) -> Result<&'a str, ToolError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ToolError::Validation(format!("{field} must be a string"))),
    }
}

/// An optional string field constrained to a fixed set of values, with a
/// default when omitted.
pub fn enum_or<'a>(
    args: &'a Args,
    field: &str,
    allowed: &[&'a str],
    default: &'a str,
) -> Result<&'a str, ToolError> {
    let value = str_or(args, field, default)?;
    allowed
        .iter()
        .find(|v| **v == value)
        .copied()
        .ok_or_else(|| {
            ToolError::Validation(format!(
                "{field} must be one of: {} (got {value:?})",
                allowed.join(", ")
            ))
        })
}

/// A required string field constrained to a fixed set of values.
pub fn require_enum<'a>(
    args: &'a Args,
    field: &str,
    allowed: &[&'a str],
) -> Result<&'a str, ToolError> {
    let value = require_str(args, field)?;
    allowed
        .iter()
        .find(|v| **v == value)
        .copied()
        .ok_or_else(|| {
            ToolError::Validation(format!(
                "{field} must be one of: {} (got {value:?})",
                allowed.join(", ")
            ))
        })
}

/// An optional boolean field with a default.
pub fn bool_or(args: &Args, field: &str, default: bool) -> Result<bool, ToolError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ToolError::Validation(format!("{field} must be a boolean"))),
    }
}

/// An optional non-negative integer field with a default.
pub fn u64_or(args: &Args, field: &str, default: u64) -> Result<u64, ToolError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_u64()
            .ok_or_else(|| ToolError::Validation(format!("{field} must be a non-negative integer"))),
    }
}
