//! Transit times for a voice assistant, backed by the Google Routes API.
//!
//! This crate provides:
//! - `RoutesConfig`, passed explicitly on each call
//! - `TransitPipeline`: validate, cache lookup, routes call, transform, cache write
//! - `GetTransitTimesTool`: the assistant-facing tool wrapping the pipeline
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use transit_cache::SqliteCache;
//! use transit_routes::{GetTransitTimesTool, RealRoutesEnvironment, Tool, ToolContext, TransitPipeline};
//!
//! let cache = Arc::new(SqliteCache::open(&path)?);
//! let env = Arc::new(RealRoutesEnvironment::new(reqwest::Client::new()));
//! let tool = GetTransitTimesTool::new(TransitPipeline::new(cache, env));
//! let result = tool.execute(&json!({ "destination": "Boston" }), &ToolContext::new(config)).await?;
//! ```

mod config;
mod environment;
mod error;
mod format;
mod pipeline;
mod request;
pub mod tools;

pub use config::{ConfigError, RoutesConfig, TravelMode};
pub use environment::{
    HttpResponse, HttpResult, RealRoutesEnvironment, RoutesEnvironment, TransportError,
};
pub use error::{Result, TransitError};
pub use format::{format_distance, format_duration, parse_duration_secs};
pub use pipeline::{
    outcome_payload, RouteResult, TransitOutcome, TransitPipeline, CACHE_NAMESPACE,
    NO_ROUTE_MESSAGE, RESPONSE_DIRECTIVE,
};
pub use request::{RouteRequest, RoutesResponse, COMPUTE_ROUTES_URL, FIELD_MASK};
pub use tools::{GetTransitTimesTool, Tool, ToolContext, ToolDefinition, ToolError, ToolResult};
