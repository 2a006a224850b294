//! JSON API consumed by the globe front end

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::etl::EtlPipeline;
use crate::globe::GlobeLayer;
use crate::life_cost::{LifeCostCalculator, Methodology, methodology};
use crate::models::{CityAnalysis, ComparisonResult, DataSummary};
use crate::selection::{Selection, SelectionEvent};
use crate::store::CityStore;
use crate::LifeCostError;

pub struct AppState {
    store: CityStore,
    pipeline: Option<Arc<EtlPipeline>>,
    selection: Mutex<Selection>,
    refreshing: AtomicBool,
}

impl AppState {
    /// Without a pipeline, `POST /api/refresh` answers 503
    #[must_use]
    pub fn new(store: CityStore, pipeline: Option<EtlPipeline>) -> Self {
        Self {
            store,
            pipeline: pipeline.map(Arc::new),
            selection: Mutex::new(Selection::new()),
            refreshing: AtomicBool::new(false),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for LifeCostError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.user_message(),
        };
        let status = StatusCode::from(self);
        if status.is_server_error() {
            error!(%status, message = %body.error, "Request failed");
        }
        (status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for LifeCostError {
    fn from(rejection: QueryRejection) -> Self {
        LifeCostError::validation(rejection.body_text())
    }
}

impl From<JsonRejection> for LifeCostError {
    fn from(rejection: JsonRejection) -> Self {
        LifeCostError::validation(rejection.body_text())
    }
}

type ApiResult<T> = Result<Json<T>, LifeCostError>;

/// Clears the refresh flag when the background run ends, even by panic
struct RefreshGuard(Arc<AppState>);

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.0.refreshing.store(false, Ordering::Release);
    }
}

#[derive(Deserialize)]
pub struct CompareParams {
    pub origin: String,
    pub destination: String,
}

#[derive(Deserialize)]
pub struct SelectCity {
    pub city: String,
}

#[derive(Serialize)]
pub struct SelectionResponse {
    pub event: SelectionEvent,
    pub selection: Selection,
    /// Present once both cities are chosen
    pub comparison: Option<ComparisonResult>,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: DataSummary,
    pub stored_cities: usize,
    pub last_refresh: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct RefreshResponse {
    status: &'static str,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cities", get(list_cities))
        .route("/cities/{query}", get(get_city))
        .route("/globe", get(get_globe))
        .route("/summary", get(get_summary))
        .route("/compare", get(compare))
        .route(
            "/selection",
            get(get_selection).post(select_city).delete(reset_selection),
        )
        .route("/methodology", get(get_methodology))
        .route("/refresh", post(refresh))
        .with_state(state)
}

async fn list_cities(State(state): State<Arc<AppState>>) -> ApiResult<Vec<CityAnalysis>> {
    Ok(Json(state.store.analysis().await?))
}

async fn get_city(
    State(state): State<Arc<AppState>>,
    Path(query): Path<String>,
) -> ApiResult<CityAnalysis> {
    Ok(Json(state.store.find(&query).await?))
}

async fn get_globe(State(state): State<Arc<AppState>>) -> ApiResult<GlobeLayer> {
    let records = state.store.records().await?;
    Ok(Json(GlobeLayer::from_records(&records)))
}

async fn get_summary(State(state): State<Arc<AppState>>) -> ApiResult<SummaryResponse> {
    let analysis = state.store.analysis().await?;
    let records: Vec<_> = analysis.iter().filter_map(CityAnalysis::to_record).collect();
    Ok(Json(SummaryResponse {
        summary: DataSummary::from_records(&records),
        stored_cities: analysis.len(),
        last_refresh: state.store.last_refresh().await?,
    }))
}

async fn compare(
    State(state): State<Arc<AppState>>,
    params: Result<Query<CompareParams>, QueryRejection>,
) -> ApiResult<ComparisonResult> {
    let Query(params) = params?;
    let (origin, destination) = futures::try_join!(
        state.store.find_record(&params.origin),
        state.store.find_record(&params.destination)
    )?;
    Ok(Json(LifeCostCalculator::compare(&origin, &destination)))
}

async fn get_selection(State(state): State<Arc<AppState>>) -> Json<Selection> {
    Json(state.selection.lock().await.clone())
}

/// A click on the globe. Only cities with complete data can be selected.
async fn select_city(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SelectCity>, JsonRejection>,
) -> ApiResult<SelectionResponse> {
    let Json(payload) = payload?;
    let record = state.store.find_record(&payload.city).await?;

    let mut selection = state.selection.lock().await;
    let event = selection.click(record.key);

    let comparison = match selection.pair() {
        Some((origin, destination)) if event == SelectionEvent::DestinationSelected => {
            let origin = state.store.find_record(&origin.label()).await?;
            let destination = state.store.find_record(&destination.label()).await?;
            Some(LifeCostCalculator::compare(&origin, &destination))
        }
        _ => None,
    };

    Ok(Json(SelectionResponse {
        event,
        selection: selection.clone(),
        comparison,
    }))
}

async fn reset_selection(State(state): State<Arc<AppState>>) -> StatusCode {
    state.selection.lock().await.reset();
    StatusCode::NO_CONTENT
}

async fn get_methodology() -> Json<Methodology> {
    Json(methodology())
}

/// Start a full ETL run in the background
async fn refresh(State(state): State<Arc<AppState>>) -> Response {
    let Some(pipeline) = state.pipeline.clone() else {
        let body = ErrorBody {
            error: "Data refresh is not configured".to_string(),
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    };
    if state.refreshing.swap(true, Ordering::AcqRel) {
        return (
            StatusCode::CONFLICT,
            Json(RefreshResponse {
                status: "already_running",
            }),
        )
            .into_response();
    }

    let guard = RefreshGuard(state.clone());
    tokio::spawn(async move {
        let _guard = guard;
        match pipeline.run_full().await {
            Ok(report) => info!(?report, "Background refresh finished"),
            Err(err) => warn!(error = %err, "Background refresh failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(RefreshResponse { status: "started" }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::seed_demo;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn app() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let store = CityStore::open(dir.path()).unwrap();
        seed_demo(&store).await.unwrap();
        let state = Arc::new(AppState::new(store, None));
        (dir, router(state))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_and_find_cities() {
        let (_dir, app) = app().await;

        let (status, body) = send(&app, get("/cities")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 25);

        let (status, body) = send(&app, get("/cities/kelowna")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["key"]["country"], "Canada");

        let (status, body) = send(&app, get("/cities/Atlantis")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Atlantis"));
    }

    #[tokio::test]
    async fn test_compare() {
        let (_dir, app) = app().await;

        let (status, body) = send(
            &app,
            get("/compare?origin=Delhi%2C%20India&destination=Kelowna%2C%20Canada"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["health_adjusted_life_expectancy_delta"]["estimate"].as_f64().unwrap() > 0.0);
        assert!(body["cost_delta"]["estimate"].as_f64().unwrap() > 0.0);

        let (status, body) = send(&app, get("/compare?origin=Delhi")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("destination"));
    }

    #[tokio::test]
    async fn test_malformed_selection_gets_json_error() {
        let (_dir, app) = app().await;

        let (status, body) = send(&app, post_json("/selection", json!({"town": "Delhi"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let request = Request::builder()
            .method("POST")
            .uri("/selection")
            .body(Body::from("Delhi"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_refresh_flag_clears_after_panic() {
        let dir = TempDir::new().unwrap();
        let store = CityStore::open(dir.path()).unwrap();
        let state = Arc::new(AppState::new(store, None));
        state.refreshing.store(true, Ordering::Release);

        let guard = RefreshGuard(state.clone());
        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("pipeline blew up");
        });
        assert!(handle.await.unwrap_err().is_panic());
        assert!(!state.refreshing.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_globe_and_summary() {
        let (_dir, app) = app().await;

        let (status, body) = send(&app, get("/globe")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["columns"].as_array().unwrap().len(), 25);
        assert_eq!(body["view_state"]["max_zoom"], 15.0);

        let (status, body) = send(&app, get("/summary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_cities"], 25);
        assert_eq!(body["stored_cities"], 25);
        assert!(body["last_refresh"].is_string());
    }

    #[tokio::test]
    async fn test_two_click_selection() {
        let (_dir, app) = app().await;

        let (status, body) = send(&app, post_json("/selection", json!({"city": "Delhi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"], "origin_selected");
        assert!(body["comparison"].is_null());

        let (_, body) = send(&app, post_json("/selection", json!({"city": "delhi, india"}))).await;
        assert_eq!(body["event"], "ignored");

        let (_, body) =
            send(&app, post_json("/selection", json!({"city": "Kelowna, Canada"}))).await;
        assert_eq!(body["event"], "destination_selected");
        assert_eq!(body["comparison"]["origin"]["key"]["name"], "Delhi");
        assert_eq!(body["comparison"]["destination"]["key"]["name"], "Kelowna");

        let request = Request::builder()
            .method("DELETE")
            .uri("/selection")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, get("/selection")).await;
        assert!(body["origin"].is_null());
    }

    #[tokio::test]
    async fn test_methodology_and_refresh_without_pipeline() {
        let (_dir, app) = app().await;

        let (status, body) = send(&app, get("/methodology")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pm25_coefficient_years_per_ugm3"], 0.1);

        let (status, _) = send(&app, post_json("/refresh", json!({}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
