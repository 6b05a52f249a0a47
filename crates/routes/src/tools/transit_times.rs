//! Transit times tool implementation.

use super::{Tool, ToolContext, ToolError, ToolResult};
use crate::pipeline::{outcome_payload, TransitPipeline};
use async_trait::async_trait;
use serde_json::json;
use std::borrow::Cow;

/// Tool for answering "how long does it take to get to X".
pub struct GetTransitTimesTool {
    pipeline: TransitPipeline,
}

impl GetTransitTimesTool {
    pub const NAME: &'static str = "get_transit_times";

    pub fn new(pipeline: TransitPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Tool for GetTransitTimesTool {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(Self::NAME)
    }

    fn description(&self) -> Cow<'static, str> {
        Cow::Borrowed(
            "Use this tool to get transit times and routes when the user requests or infers they want to know:\n\
             - How long it takes to get to a place\n\
             - Transit time to a destination\n\
             - Directions or route to a location\n\
             - When they should leave to arrive at a place",
        )
    }

    fn args_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "destination": {
                    "type": "string",
                    "description": "The destination address or place name"
                }
            },
            "required": ["destination"]
        })
    }

    async fn execute(
        &self,
        args: &serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let destination = match args.get("destination") {
            None | Some(serde_json::Value::Null) => return Err(ToolError::MissingArg("destination")),
            Some(value) => value.as_str().ok_or_else(|| ToolError::InvalidArg {
                field: "destination",
                reason: "expected a string".to_string(),
            })?,
        };
        if destination.trim().is_empty() {
            return Err(ToolError::MissingArg("destination"));
        }

        tracing::debug!(tool = Self::NAME, destination, "Executing tool");

        let outcome = self.pipeline.run(&ctx.config, destination).await;
        if let Err(e) = &outcome {
            if e.is_config() {
                tracing::warn!(tool = Self::NAME, error = %e, "Tool is not configured");
            }
        }
        let cached = outcome.as_ref().is_ok_and(|o| o.is_cached());

        Ok(ToolResult {
            payload: outcome_payload(&outcome),
            cached,
        })
    }
}
