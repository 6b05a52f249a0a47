//! Tool trait and implementations.
//!
//! Tools are what the assistant host sees: a name, a description, an argument
//! schema and an async `execute`. The host owns registration and dispatch.

use std::borrow::Cow;

mod transit_times;

pub use transit_times::GetTransitTimesTool;

use async_trait::async_trait;

use crate::config::RoutesConfig;

/// JSON schema definition for a tool, handed to the host for registration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub read_only: bool,
    pub args_schema: serde_json::Value,
}

/// Context passed to tool execution.
///
/// Configuration travels with each call instead of being read from global
/// host state.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub config: RoutesConfig,
}

impl ToolContext {
    pub fn new(config: RoutesConfig) -> Self {
        Self { config }
    }
}

/// Result of tool execution.
#[derive(Debug)]
pub struct ToolResult {
    /// Ready-to-return payload for the assistant.
    pub payload: serde_json::Value,
    /// Whether the payload came from the result cache.
    pub cached: bool,
}

/// The invocation itself was malformed.
///
/// Failures while answering a well-formed call are reported inside the
/// payload instead.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("missing required argument: {0}")]
    MissingArg(&'static str),

    #[error("invalid argument: {field} - {reason}")]
    InvalidArg { field: &'static str, reason: String },
}

/// Trait for executable tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the manifest name).
    fn name(&self) -> Cow<'static, str>;

    /// Human-readable description of when to use the tool.
    fn description(&self) -> Cow<'static, str> {
        Cow::Borrowed("")
    }

    /// Whether this tool is read-only (no side effects).
    fn is_read_only(&self) -> bool {
        true
    }

    /// JSON schema for the tool's arguments.
    fn args_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            read_only: self.is_read_only(),
            args_schema: self.args_schema(),
        }
    }

    /// Execute the tool with given arguments.
    async fn execute(
        &self,
        args: &serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError>;
}
