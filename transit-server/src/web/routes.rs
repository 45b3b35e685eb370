//! HTTP route handlers.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::domain::{Bucket, CategorizedLines};
use crate::index::Resolution;
use crate::service::ServiceError;
use crate::vehicles::VehicleSnapshot;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/lines", get(all_lines))
        .route("/lines/:category", get(category_lines))
        .route("/locations", get(locations))
        .route("/shapes/:line", get(shape))
        .route("/shapes/:line/variants", get(variants))
        .route("/stops/:line", get(line_stops))
        .route("/stop/:id", get(stop_schedule))
        .layer(cors)
        .with_state(state)
}

const ENDPOINTS: [(&str, &str); 9] = [
    ("/", "This endpoint listing"),
    ("/health", "Service and feed status"),
    ("/lines", "All lines grouped by category"),
    ("/lines/:category", "Lines of one category"),
    ("/locations", "Live vehicle positions"),
    ("/shapes/:line", "Shape of a line (?lat=&lon= picks the variant nearest a vehicle)"),
    ("/shapes/:line/variants", "Every variant of a line"),
    ("/stops/:line", "Stops of a line"),
    ("/stop/:id", "Schedule of a stop"),
];

async fn index() -> Json<IndexResponse> {
    let endpoints = ENDPOINTS
        .into_iter()
        .map(|(path, description)| EndpointInfo {
            method: "GET",
            path,
            description,
        })
        .collect();

    Json(IndexResponse {
        message: "Wrocław public transport API",
        endpoints,
    })
}

/// Health check endpoint.
///
/// Always 200; the feed state is part of the body.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.transit.store();
    let catalog = store.current().await;
    let vehicles = state.vehicles.snapshot().await;

    Json(HealthResponse {
        status: "ok",
        feed: store.status().await,
        generation: catalog.as_ref().map(|c| c.generation),
        loaded_at: catalog.as_ref().map(|c| c.loaded_at),
        last_attempt: store.last_attempt().await,
        last_error: store.last_error().await,
        total_lines: catalog.as_ref().map_or(0, |c| c.lines.len()),
        indexed_lines: catalog.as_ref().map_or(0, |c| c.index.len()),
        variants: catalog.as_ref().map_or(0, |c| c.index.variant_count()),
        shapes: catalog.as_ref().map_or(0, |c| c.snapshot.shape_count()),
        stops: catalog.as_ref().map_or(0, |c| c.snapshot.stop_count()),
        cached_resolutions: state.transit.cache().entry_count(),
        locations_count: vehicles.vehicles.len(),
        locations_last_updated: vehicles.last_updated,
    })
}

async fn all_lines(State(state): State<AppState>) -> Result<Json<CategorizedLines>, AppError> {
    Ok(Json(state.transit.categorized_lines().await?))
}

async fn category_lines(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let bucket = Bucket::from_str(&category).map_err(|_| AppError::UnknownCategory {
        category: category.clone(),
    })?;
    let lines = state.transit.categorized_lines().await?;

    Ok(Json(CategoryResponse {
        lines: lines.get(bucket).to_vec(),
        category,
    }))
}

async fn locations(State(state): State<AppState>) -> Json<VehicleSnapshot> {
    Json(state.vehicles.snapshot().await.as_ref().clone())
}

/// Best variant of a line, optionally for a vehicle position.
async fn shape(
    State(state): State<AppState>,
    Path(line): Path<String>,
    Query(query): Query<PositionQuery>,
) -> Result<Json<ShapeResponse>, AppError> {
    match state.transit.resolve(&line, query.position()).await? {
        Resolution::Found(variant) => Ok(Json(ShapeResponse::from(variant.as_ref()))),
        Resolution::LineNotFound => Err(AppError::not_found("Line not found")),
        Resolution::NoGeometry => Err(AppError::not_found("Shape not found for this line")),
    }
}

async fn variants(
    State(state): State<AppState>,
    Path(line): Path<String>,
) -> Result<Json<VariantsResponse>, AppError> {
    match state.transit.list_variants(&line).await? {
        Some(set) if !set.is_empty() => Ok(Json(VariantsResponse::from(set.as_ref()))),
        Some(_) => Err(AppError::not_found("No variants found for this line")),
        None => Err(AppError::not_found("Line not found")),
    }
}

/// Stops of the line's default variant.
async fn line_stops(
    State(state): State<AppState>,
    Path(line): Path<String>,
) -> Result<Json<LineStopsResponse>, AppError> {
    match state.transit.resolve(&line, None).await? {
        Resolution::Found(variant) => Ok(Json(LineStopsResponse {
            line,
            stops: variant.stops.iter().map(StopDto::from).collect(),
        })),
        Resolution::LineNotFound => Err(AppError::not_found("Line not found")),
        Resolution::NoGeometry => Err(AppError::not_found("Stops not found for this line")),
    }
}

async fn stop_schedule(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<StopScheduleResponse>, AppError> {
    let schedule = state.transit.stop_schedule(&stop_id).await?;
    if schedule.is_empty() {
        return Err(AppError::not_found("No schedule available for this stop"));
    }

    Ok(Json(StopScheduleResponse {
        stop_id,
        schedule: schedule.into_iter().map(ScheduleEntryDto::from).collect(),
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    UnknownCategory { category: String },
    Unavailable { message: String },
}

impl AppError {
    fn not_found(message: &str) -> Self {
        AppError::NotFound {
            message: message.to_string(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotInitialized => AppError::Unavailable {
                message: e.to_string(),
            },
            ServiceError::StopNotFound(_) => AppError::NotFound {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound { message } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: message,
                    available_categories: None,
                },
            ),
            AppError::UnknownCategory { category } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: format!("Category not found: {category}"),
                    available_categories: Some(Bucket::ALL.map(Bucket::as_str).to_vec()),
                },
            ),
            AppError::Unavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error: message,
                    available_categories: None,
                },
            ),
        };

        if status.is_server_error() {
            warn!(%status, error = %body.error, "request failed");
        } else {
            debug!(%status, error = %body.error, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::cache::CacheConfig;
    use crate::feed::test_support::{LINE_2_FEED, feed_file};
    use crate::feed::{FeedClient, FeedClientConfig, FeedSource, FeedStore};
    use crate::service::TransitService;
    use crate::vehicles::VehiclePositions;

    fn state_for(path: std::path::PathBuf) -> AppState {
        let client = FeedClient::new(FeedClientConfig::new(FeedSource::File(path))).unwrap();
        let transit = TransitService::new(FeedStore::new(client), &CacheConfig::default());
        AppState::new(transit, VehiclePositions::new())
    }

    async fn loaded() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(feed_file(dir.path(), &LINE_2_FEED));
        state.transit.refresh().await.unwrap();
        (dir, create_router(state))
    }

    async fn fetch_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unavailable_before_first_load() {
        let app = create_router(state_for("/nonexistent/feed.zip".into()));

        let (status, body) = fetch_json(&app, "/lines").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());

        let (status, _) = fetch_json(&app, "/shapes/2").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = fetch_json(&app, "/lines/tram").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = fetch_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feed"], "uninitialized");
        assert!(body["generation"].is_null());
    }

    #[tokio::test]
    async fn index_lists_endpoints() {
        let (_dir, app) = loaded().await;
        let (status, body) = fetch_json(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"].as_array().unwrap().len(), ENDPOINTS.len());
    }

    #[tokio::test]
    async fn health_reports_loaded_feed() {
        let (_dir, app) = loaded().await;
        let (_, body) = fetch_json(&app, "/health").await;
        assert_eq!(body["feed"], "ready");
        assert_eq!(body["generation"], 1);
        assert_eq!(body["totalLines"], 4);
        assert_eq!(body["indexedLines"], 2);
        assert_eq!(body["variants"], 3);
        assert_eq!(body["shapes"], 3);
        assert_eq!(body["stops"], 3);
    }

    #[tokio::test]
    async fn lines_in_bucket_order() {
        let (_dir, app) = loaded().await;
        let (status, body) = fetch_json(&app, "/lines").await;
        assert_eq!(status, StatusCode::OK);

        let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 13);
        assert_eq!(body["tram"], serde_json::json!(["2", "3"]));
        assert_eq!(body["busExpress"], serde_json::json!(["A"]));
    }

    #[tokio::test]
    async fn single_category() {
        let (_dir, app) = loaded().await;
        let (status, body) = fetch_json(&app, "/lines/allTrams").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "allTrams");
        assert_eq!(body["lines"], serde_json::json!(["2", "3"]));

        let (status, body) = fetch_json(&app, "/lines/boats").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["availableCategories"].as_array().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn shape_without_position() {
        let (_dir, app) = loaded().await;
        let (status, body) = fetch_json(&app, "/shapes/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shapeId"], "S1");
        assert_eq!(body["shapePoints"].as_array().unwrap().len(), 2);
        assert_eq!(body["direction"], "Rynek → Leśnica");
    }

    #[tokio::test]
    async fn shape_near_vehicle() {
        let (_dir, app) = loaded().await;
        let (_, body) = fetch_json(&app, "/shapes/2?lat=51.105&lon=17.070").await;
        assert_eq!(body["shapeId"], "S2");

        // A half-given or malformed position is ignored
        let (_, body) = fetch_json(&app, "/shapes/2?lat=51.105").await;
        assert_eq!(body["shapeId"], "S1");
        let (_, body) = fetch_json(&app, "/shapes/2?lat=north&lon=17.07").await;
        assert_eq!(body["shapeId"], "S1");
    }

    #[tokio::test]
    async fn unknown_line_is_404() {
        let (_dir, app) = loaded().await;
        for uri in ["/shapes/99", "/shapes/99/variants", "/stops/99"] {
            let (status, _) = fetch_json(&app, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn unknown_category_is_404_before_first_load() {
        let app = create_router(state_for("/nonexistent/feed.zip".into()));
        let (status, body) = fetch_json(&app, "/lines/boats").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Category not found: boats");
        assert_eq!(body["availableCategories"].as_array().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn unclassified_line_is_404() {
        let (_dir, app) = loaded().await;
        for uri in ["/shapes/X", "/shapes/X/variants", "/stops/X"] {
            let (status, body) = fetch_json(&app, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"], "Line not found", "{uri}");
        }
    }

    #[tokio::test]
    async fn variants_listing() {
        let (_dir, app) = loaded().await;
        let (status, body) = fetch_json(&app, "/shapes/2/variants").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["routeShortName"], "2");
        assert_eq!(body["routeId"], "r2");
        let shapes: Vec<&str> = body["variants"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["shapeId"].as_str().unwrap())
            .collect();
        assert_eq!(shapes, ["S1", "S2"]);
    }

    #[tokio::test]
    async fn line_stops_listing() {
        let (_dir, app) = loaded().await;
        let (status, body) = fetch_json(&app, "/stops/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["line"], "2");
        assert_eq!(body["stops"][0]["id"], "p1");
        assert_eq!(body["stops"][1]["name"], "Leśnica");
    }

    #[tokio::test]
    async fn stop_schedule_lookup() {
        let (_dir, app) = loaded().await;
        let (status, body) = fetch_json(&app, "/stop/p2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stopId"], "p2");
        assert_eq!(body["schedule"][0]["tripId"], "t1");
        assert_eq!(body["schedule"][0]["routeId"], "r2");

        let (status, _) = fetch_json(&app, "/stop/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        // Known stop that no trip calls at
        let (status, _) = fetch_json(&app, "/stop/p9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn locations_start_empty() {
        let (_dir, app) = loaded().await;
        let (status, body) = fetch_json(&app, "/locations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["locations"], serde_json::json!([]));
        assert!(body["lastUpdated"].is_null());
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let (_dir, app) = loaded().await;
        let response = app
            .oneshot(
                Request::get("/lines")
                    .header(header::ORIGIN, "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
