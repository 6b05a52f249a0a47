//! Transit query pipeline.
//!
//! validate config -> build request -> cache lookup -> routes call ->
//! transform -> cache write. Every terminal state is either a
//! [`TransitOutcome`] or a [`TransitError`]; nothing escapes as a panic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use transit_cache::ResultCache;

use crate::config::RoutesConfig;
use crate::environment::RoutesEnvironment;
use crate::error::{Result, TransitError};
use crate::format::{format_distance, format_duration, parse_duration_secs};
use crate::request::{RouteRequest, RoutesResponse};

/// Cache namespace for transit results.
pub const CACHE_NAMESPACE: &str = "get_transit_times";

/// Appended to every result so the assistant knows how to phrase its answer.
pub const RESPONSE_DIRECTIVE: &str = "Use the route information to answer the user's query.\n\
Focus on the transit time and relevant route details the user is interested in.";

pub const NO_ROUTE_MESSAGE: &str = "No route found to destination";

/// Compact, human-readable answer to a transit query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResult {
    pub destination: String,
    pub travel_mode: String,
    pub duration: String,
    pub distance: String,
    pub instruction: String,
}

/// Non-error terminal states.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitOutcome {
    Route { result: RouteResult, cached: bool },
    /// The service answered but found nothing. A valid negative answer.
    NoRoute,
}

impl TransitOutcome {
    pub fn is_cached(&self) -> bool {
        matches!(self, TransitOutcome::Route { cached: true, .. })
    }

    pub fn to_payload(&self) -> serde_json::Value {
        match self {
            TransitOutcome::Route { result, .. } => serde_json::json!({
                "destination": result.destination,
                "travel_mode": result.travel_mode,
                "duration": result.duration,
                "distance": result.distance,
                "instruction": result.instruction,
            }),
            TransitOutcome::NoRoute => serde_json::json!({ "result": NO_ROUTE_MESSAGE }),
        }
    }
}

/// Payload for any pipeline result: success map, `{result}` or `{error}`.
pub fn outcome_payload(outcome: &Result<TransitOutcome>) -> serde_json::Value {
    match outcome {
        Ok(outcome) => outcome.to_payload(),
        Err(e) => e.to_payload(),
    }
}

/// Answers "how long to get there" using a shared cache and a routes service.
#[derive(Clone)]
pub struct TransitPipeline {
    cache: Arc<dyn ResultCache>,
    env: Arc<dyn RoutesEnvironment>,
}

impl TransitPipeline {
    pub fn new(cache: Arc<dyn ResultCache>, env: Arc<dyn RoutesEnvironment>) -> Self {
        Self { cache, env }
    }

    pub async fn run(&self, config: &RoutesConfig, destination: &str) -> Result<TransitOutcome> {
        let api_key = config.api_key().ok_or(TransitError::MissingApiKey)?;
        let (latitude, longitude) = config.origin().ok_or(TransitError::MissingOrigin)?;
        let travel_mode = config.travel_mode();

        let request = RouteRequest::new(latitude, longitude, destination, travel_mode);
        let body = serde_json::to_value(&request)?;

        if let Some(result) = self.cached(&body) {
            return Ok(TransitOutcome::Route {
                result,
                cached: true,
            });
        }

        let resp = match self.env.compute_routes(api_key, &body).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error = %e, "Routes API error");
                return Err(e.into());
            }
        };

        if !resp.is_success() {
            tracing::error!(
                status = resp.status,
                body = %resp.body,
                "Routes API received a HTTP error from Google"
            );
            return Err(TransitError::Api {
                status: resp.status,
            });
        }

        let parsed: RoutesResponse = serde_json::from_str(&resp.body).map_err(|e| {
            tracing::error!(error = %e, "Routes API returned malformed JSON");
            TransitError::MalformedResponse(e.to_string())
        })?;

        let Some(route) = parsed.routes.into_iter().next() else {
            tracing::debug!(destination, "No route found");
            return Ok(TransitOutcome::NoRoute);
        };

        let duration_secs = parse_duration_secs(route.duration.as_deref().unwrap_or("0s"))
            .map_err(|e| {
                tracing::error!(error = %e, "Routes API returned an unparseable duration");
                TransitError::MalformedResponse(e)
            })?;

        let result = RouteResult {
            destination: destination.to_string(),
            travel_mode: travel_mode.display_name(),
            duration: format_duration(duration_secs),
            distance: format_distance(route.distance_meters.unwrap_or(0)),
            instruction: RESPONSE_DIRECTIVE.to_string(),
        };

        self.remember(&body, &result);

        Ok(TransitOutcome::Route {
            result,
            cached: false,
        })
    }

    /// Cache read. A broken cache degrades to a miss.
    fn cached(&self, body: &serde_json::Value) -> Option<RouteResult> {
        match self.cache.lookup(CACHE_NAMESPACE, body) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unreadable cached route");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Route cache read failed, continuing uncached");
                None
            }
        }
    }

    fn remember(&self, body: &serde_json::Value, result: &RouteResult) {
        let stored = serde_json::to_value(result)
            .map_err(transit_cache::CacheError::from)
            .and_then(|value| self.cache.store(CACHE_NAMESPACE, body, &value));

        if let Err(e) = stored {
            tracing::warn!(error = %e, "Route cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TravelMode;
    use crate::environment::mock::MockRoutesEnvironment;
    use serde_json::json;
    use transit_cache::{CacheError, Fingerprint, SqliteCache};

    fn config() -> RoutesConfig {
        RoutesConfig {
            api_key: Some("test_routes_key".into()),
            latitude: Some(40.7128),
            longitude: Some(-74.0060),
            travel_mode: Some(TravelMode::Drive),
        }
    }

    fn single_route(duration: &str, meters: u64) -> serde_json::Value {
        json!({
            "routes": [{
                "duration": duration,
                "distanceMeters": meters,
                "legs": [{ "duration": duration, "distanceMeters": meters }],
            }]
        })
    }

    fn pipeline_with(
        env: MockRoutesEnvironment,
    ) -> (TransitPipeline, Arc<SqliteCache>, Arc<MockRoutesEnvironment>) {
        let cache = Arc::new(SqliteCache::open_in_memory().unwrap());
        let env = Arc::new(env);
        let pipeline = TransitPipeline::new(cache.clone(), env.clone());
        (pipeline, cache, env)
    }

    fn expect_route(outcome: TransitOutcome) -> RouteResult {
        match outcome {
            TransitOutcome::Route { result, .. } => result,
            other => panic!("expected a route, got {other:?}"),
        }
    }

    struct BrokenCache;

    impl ResultCache for BrokenCache {
        fn lookup(
            &self,
            _namespace: &str,
            _payload: &serde_json::Value,
        ) -> transit_cache::Result<Option<serde_json::Value>> {
            Err(CacheError::Poisoned)
        }

        fn store(
            &self,
            _namespace: &str,
            _payload: &serde_json::Value,
            _result: &serde_json::Value,
        ) -> transit_cache::Result<()> {
            Err(CacheError::Poisoned)
        }
    }

    #[tokio::test]
    async fn test_success_formats_result() {
        let (pipeline, _, env) =
            pipeline_with(MockRoutesEnvironment::new().respond(200, single_route("1200s", 5000)));

        let outcome = pipeline.run(&config(), "Times Square, New York").await.unwrap();
        assert!(!outcome.is_cached());

        let result = expect_route(outcome);
        assert_eq!(result.destination, "Times Square, New York");
        assert_eq!(result.travel_mode, "drive");
        assert_eq!(result.duration, "20 minutes");
        assert_eq!(result.distance, "5.0 km");
        assert_eq!(result.instruction, RESPONSE_DIRECTIVE);
        assert_eq!(env.call_count(), 1);
    }

    #[tokio::test]
    async fn test_duration_with_hours() {
        let (pipeline, _, _) =
            pipeline_with(MockRoutesEnvironment::new().respond(200, single_route("7200s", 100_000)));

        let result = expect_route(pipeline.run(&config(), "Boston").await.unwrap());
        assert_eq!(result.duration, "2 hours 0 minutes");
        assert_eq!(result.distance, "100.0 km");
    }

    #[tokio::test]
    async fn test_only_first_route_is_used() {
        let body = json!({
            "routes": [
                { "duration": "600s", "distanceMeters": 1000 },
                { "duration": "60s", "distanceMeters": 10 },
            ]
        });
        let (pipeline, _, _) = pipeline_with(MockRoutesEnvironment::new().respond(200, body));

        let result = expect_route(pipeline.run(&config(), "Central Park").await.unwrap());
        assert_eq!(result.duration, "10 minutes");
        assert_eq!(result.distance, "1.0 km");
    }

    #[tokio::test]
    async fn test_missing_fields_default_to_zero() {
        let (pipeline, _, _) =
            pipeline_with(MockRoutesEnvironment::new().respond(200, json!({ "routes": [{}] })));

        let result = expect_route(pipeline.run(&config(), "Nearby").await.unwrap());
        assert_eq!(result.duration, "0 minutes");
        assert_eq!(result.distance, "0.0 km");
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let (pipeline, _, env) = pipeline_with(MockRoutesEnvironment::new());
        let config = RoutesConfig {
            api_key: None,
            ..config()
        };

        let err = pipeline.run(&config, "Times Square").await.unwrap_err();
        assert!(matches!(err, TransitError::MissingApiKey));
        assert!(err.is_config());
        assert!(err.to_string().contains("API key not configured"));
        assert_eq!(env.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_origin() {
        let (pipeline, _, env) = pipeline_with(MockRoutesEnvironment::new());
        let config = RoutesConfig {
            longitude: None,
            ..config()
        };

        let err = pipeline.run(&config, "Times Square").await.unwrap_err();
        assert!(matches!(err, TransitError::MissingOrigin));
        assert!(err.to_string().contains("Origin location"));
        assert_eq!(env.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_finite_origin_is_missing_origin() {
        let (pipeline, cache, env) = pipeline_with(MockRoutesEnvironment::new());
        let config = RoutesConfig {
            latitude: Some(f64::NAN),
            longitude: Some(f64::INFINITY),
            ..config()
        };

        let err = pipeline.run(&config, "Times Square").await.unwrap_err();
        assert!(matches!(err, TransitError::MissingOrigin));
        assert_eq!(env.call_count(), 0);
        assert!(cache.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_no_route_found_is_not_cached() {
        let (pipeline, cache, _) =
            pipeline_with(MockRoutesEnvironment::new().respond(200, json!({ "routes": [] })));

        let outcome = pipeline.run(&config(), "Invalid Place").await.unwrap();
        assert_eq!(outcome, TransitOutcome::NoRoute);
        assert!(outcome.to_payload()["result"]
            .as_str()
            .unwrap()
            .contains("No route found"));
        assert!(cache.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_api_error_is_not_cached() {
        let (pipeline, cache, _) = pipeline_with(
            MockRoutesEnvironment::new().respond_text(500, "Internal Server Error"),
        );

        let err = pipeline.run(&config(), "Times Square").await.unwrap_err();
        assert!(matches!(err, TransitError::Api { status: 500 }));
        assert!(err.to_string().contains("500"));
        assert!(cache.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_transport_error_is_contained() {
        let (pipeline, cache, _) =
            pipeline_with(MockRoutesEnvironment::new().fail("Network error"));

        let result = pipeline.run(&config(), "Times Square").await;
        let payload = outcome_payload(&result);
        assert!(payload["error"].as_str().unwrap().contains("Network error"));
        assert!(cache.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_malformed_body_is_contained() {
        let (pipeline, _, _) =
            pipeline_with(MockRoutesEnvironment::new().respond_text(200, "<html>"));

        let err = pipeline.run(&config(), "Times Square").await.unwrap_err();
        assert!(matches!(err, TransitError::MalformedResponse(_)));
        assert!(err.to_string().starts_with("Error getting route:"));
    }

    #[tokio::test]
    async fn test_bad_duration_is_contained() {
        let body = json!({ "routes": [{ "duration": "soon", "distanceMeters": 10 }] });
        let (pipeline, cache, _) = pipeline_with(MockRoutesEnvironment::new().respond(200, body));

        let err = pipeline.run(&config(), "Times Square").await.unwrap_err();
        assert!(err.to_string().contains("invalid duration"));
        assert!(cache.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let (pipeline, cache, env) = pipeline_with(MockRoutesEnvironment::new());
        let cfg = config();
        let request = RouteRequest::new(40.7128, -74.0060, "Times Square", TravelMode::Drive);
        let cached = RouteResult {
            destination: "Times Square".into(),
            travel_mode: "drive".into(),
            duration: "20 minutes".into(),
            distance: "5.0 km".into(),
            instruction: RESPONSE_DIRECTIVE.into(),
        };
        cache.set(CACHE_NAMESPACE, &request, &cached).unwrap();

        let outcome = pipeline.run(&cfg, "Times Square").await.unwrap();
        assert!(outcome.is_cached());
        assert_eq!(expect_route(outcome), cached);
        assert_eq!(env.call_count(), 0, "Cache hit must not call the routes service");
    }

    #[tokio::test]
    async fn test_miss_writes_under_lookup_fingerprint() {
        let (pipeline, cache, env) =
            pipeline_with(MockRoutesEnvironment::new().respond(200, single_route("1200s", 5000)));

        let first = pipeline.run(&config(), "Times Square").await.unwrap();
        let sent = env.last_body().expect("request body recorded");
        let key = Fingerprint::from_value(CACHE_NAMESPACE, &sent);
        assert!(cache.contains(&key).unwrap());
        assert_eq!(cache.len().unwrap(), 1);

        let second = pipeline.run(&config(), "Times Square").await.unwrap();
        assert!(second.is_cached());
        assert_eq!(first.to_payload(), second.to_payload());
        assert_eq!(env.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_scoped_per_travel_mode() {
        let (pipeline, cache, env) = pipeline_with(
            MockRoutesEnvironment::new()
                .respond(200, single_route("1200s", 5000))
                .respond(200, single_route("3600s", 5000)),
        );

        pipeline.run(&config(), "Times Square").await.unwrap();
        let walking = RoutesConfig {
            travel_mode: Some(TravelMode::Walk),
            ..config()
        };
        let result = expect_route(pipeline.run(&walking, "Times Square").await.unwrap());

        assert_eq!(result.travel_mode, "walk");
        assert_eq!(result.duration, "1 hour 0 minutes");
        assert_eq!(env.call_count(), 2);
        assert_eq!(cache.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_default_travel_mode_is_sent() {
        let (pipeline, _, env) =
            pipeline_with(MockRoutesEnvironment::new().respond(200, single_route("600s", 1000)));
        let config = RoutesConfig {
            travel_mode: None,
            ..config()
        };

        pipeline.run(&config, "Central Park").await.unwrap();
        assert_eq!(env.last_body().unwrap()["travelMode"], "DRIVE");
    }

    #[tokio::test]
    async fn test_every_travel_mode_is_displayed() {
        for mode in TravelMode::ALL {
            let (pipeline, _, _) = pipeline_with(
                MockRoutesEnvironment::new().respond(200, single_route("600s", 1000)),
            );
            let config = RoutesConfig {
                travel_mode: Some(mode),
                ..config()
            };

            let result = expect_route(pipeline.run(&config, "Central Park").await.unwrap());
            assert_eq!(result.travel_mode, mode.as_str().to_lowercase().replace('_', " "));
        }
    }

    #[tokio::test]
    async fn test_broken_cache_degrades_to_uncached() {
        let env = Arc::new(
            MockRoutesEnvironment::new()
                .respond(200, single_route("1200s", 5000))
                .respond(200, single_route("1200s", 5000)),
        );
        let pipeline = TransitPipeline::new(Arc::new(BrokenCache), env.clone());

        let first = pipeline.run(&config(), "Times Square").await.unwrap();
        let second = pipeline.run(&config(), "Times Square").await.unwrap();

        assert_eq!(expect_route(first).duration, "20 minutes");
        assert!(!second.is_cached());
        assert_eq!(env.call_count(), 2);
    }
}
