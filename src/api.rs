//! HTTP API for the Allowance Engine.
//!
//! This module exposes the comparison engine over a small REST API
//! using the [`axum`](https://crates.io/crates/axum) framework.  Clients
//! submit a scenario and receive the calculation as JSON.  The API is
//! also the input boundary: scenarios are validated here before they
//! reach the engine, and calculations are recorded in the history.
//!
//! | Method   | Path                    | Body / query         | Response            |
//! |----------|-------------------------|----------------------|---------------------|
//! | `POST`   | `/api/calculate`        | scenario             | calculation result  |
//! | `POST`   | `/api/calculate/batch`  | list of scenarios    | list of results     |
//! | `GET`    | `/api/history`          |                      | history entries     |
//! | `DELETE` | `/api/history`          |                      | 204                 |
//! | `GET`    | `/api/scenario`         |                      | saved scenario, 404 |
//! | `PUT`    | `/api/scenario`         | scenario             | 204                 |
//! | `GET`    | `/api/schedule`         |                      | active schedule     |
//! | `GET`    | `/api/suggestions`      | powertrain, year, .. | suggested inputs    |
//! | `POST`   | `/api/export`           | scenario             | file name and rows  |

use crate::benefit::{load_schedules_from_dir, select_schedule, BenefitSchedule};
use crate::config::Config;
use crate::engine::{calculate_batch, calculate_scenario_with};
use crate::error::Error;
use crate::export::{export_file_name, flatten, ExportDocument};
use crate::history::{History, HistoryEntry, JsonFileStore, MemoryStore, ScenarioStore};
use crate::models::{CalculationResult, Powertrain, Scenario};
use crate::suggest::{suggested_health_tax, suggested_maintenance, suggested_national_insurance};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

/// Application state shared across requests.
pub struct AppState {
    pub schedule: BenefitSchedule,
    pub history: RwLock<History>,
    pub store: Arc<dyn ScenarioStore>,
}

impl AppState {
    /// Creates the state, restoring any history held by `store`.
    pub fn new(
        schedule: BenefitSchedule,
        store: Arc<dyn ScenarioStore>,
        history_limit: usize,
    ) -> crate::error::Result<Self> {
        let entries = store.load_history()?;
        Ok(Self {
            schedule,
            history: RwLock::new(History::from_entries(entries, history_limit)),
            store,
        })
    }
}

/// Build the API router from the runtime configuration.  Loads the
/// benefit schedules and opens the scenario store.
pub fn build_router(config: &Config) -> Result<(Router, Arc<AppState>)> {
    let schedules = load_schedules_from_dir(&config.schedule_dir)
        .with_context(|| format!("loading schedules from {:?}", config.schedule_dir))?;
    let schedule = select_schedule(schedules, config.tax_year.as_deref())?;
    info!(tax_year = %schedule.tax_year, "active benefit schedule");

    let store: Arc<dyn ScenarioStore> = match &config.data_dir {
        Some(dir) => {
            info!(?dir, "persisting scenarios to disk");
            Arc::new(JsonFileStore::new(dir))
        }
        None => Arc::new(MemoryStore::default()),
    };
    let state = Arc::new(
        AppState::new(schedule, store, config.history_limit).context("restoring history")?,
    );
    Ok((router(state.clone()), state))
}

/// Routes over an existing state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/calculate", post(calculate_handler))
        .route("/api/calculate/batch", post(batch_handler))
        .route("/api/history", get(history_handler).delete(clear_history_handler))
        .route("/api/scenario", get(load_scenario_handler).put(save_scenario_handler))
        .route("/api/schedule", get(schedule_handler))
        .route("/api/suggestions", get(suggestions_handler))
        .route("/api/export", post(export_handler))
        .with_state(state)
}

/// Error body returned by every handler: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::InvalidScenario { .. } | Error::UndefinedResult(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => {
                error!(%err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn join_error(err: tokio::task::JoinError) -> ApiError {
    error!(%err, "blocking task failed");
    ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, message: err.to_string() }
}

/// Runs a store operation on the blocking pool.  `JsonFileStore` does
/// synchronous file I/O.
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await.map_err(join_error)??)
}

/// Handler for POST /api/calculate
#[instrument(skip_all)]
async fn calculate_handler(
    State(state): State<Arc<AppState>>,
    Json(scenario): Json<Scenario>,
) -> ApiResult<Json<CalculationResult>> {
    scenario.validate()?;
    debug!(name = %scenario.name, "calculating scenario");
    let calculation = calculate_scenario_with(&scenario, &state.schedule).ensure_finite()?;

    // The in-memory history only changes once the store accepted it.
    let mut history = state.history.write().await;
    let mut updated = history.clone();
    updated.record(HistoryEntry {
        scenario,
        calculation: calculation.clone(),
        timestamp: Utc::now(),
    });
    let entries = updated.to_vec();
    let store = state.store.clone();
    blocking(move || store.save_history(&entries)).await?;
    *history = updated;
    Ok(Json(calculation))
}

/// Handler for POST /api/calculate/batch
#[instrument(skip_all)]
async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Json(scenarios): Json<Vec<Scenario>>,
) -> ApiResult<Json<Vec<CalculationResult>>> {
    for scenario in &scenarios {
        scenario.validate()?;
    }
    debug!(count = scenarios.len(), "calculating batch");
    let results = tokio::task::spawn_blocking(move || calculate_batch(&scenarios, &state.schedule))
        .await
        .map_err(join_error)?;
    let results = results
        .into_iter()
        .map(CalculationResult::ensure_finite)
        .collect::<crate::error::Result<Vec<_>>>()?;
    Ok(Json(results))
}

/// Handler for GET /api/history
async fn history_handler(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryEntry>> {
    Json(state.history.read().await.to_vec())
}

/// Handler for DELETE /api/history
async fn clear_history_handler(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    let mut history = state.history.write().await;
    let store = state.store.clone();
    blocking(move || store.save_history(&[])).await?;
    history.clear();
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/scenario
async fn load_scenario_handler(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let store = state.store.clone();
    Ok(match blocking(move || store.load_scenario()).await? {
        Some(scenario) => Json(scenario).into_response(),
        None => ApiError {
            status: StatusCode::NOT_FOUND,
            message: "no saved scenario".to_string(),
        }
        .into_response(),
    })
}

/// Handler for PUT /api/scenario
async fn save_scenario_handler(
    State(state): State<Arc<AppState>>,
    Json(scenario): Json<Scenario>,
) -> ApiResult<StatusCode> {
    let store = state.store.clone();
    blocking(move || store.save_scenario(&scenario)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/schedule
async fn schedule_handler(State(state): State<Arc<AppState>>) -> Json<BenefitSchedule> {
    Json(state.schedule.clone())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionQuery {
    powertrain: Powertrain,
    year: Option<i32>,
    #[serde(default)]
    price: f64,
    tax_bracket: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestions {
    monthly_maint: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    national_insurance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    health_tax: Option<f64>,
}

/// Handler for GET /api/suggestions
async fn suggestions_handler(Query(query): Query<SuggestionQuery>) -> Json<Suggestions> {
    let current_year = Utc::now().year();
    Json(Suggestions {
        monthly_maint: suggested_maintenance(
            query.powertrain,
            query.year.unwrap_or(current_year),
            query.price,
            current_year,
        ),
        national_insurance: query.tax_bracket.map(suggested_national_insurance),
        health_tax: query.tax_bracket.map(suggested_health_tax),
    })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportResponse {
    file_name: String,
    document: ExportDocument,
    rows: Map<String, Value>,
}

/// Handler for POST /api/export
async fn export_handler(
    State(state): State<Arc<AppState>>,
    Json(scenario): Json<Scenario>,
) -> ApiResult<Json<ExportResponse>> {
    scenario.validate()?;
    let calculation = calculate_scenario_with(&scenario, &state.schedule).ensure_finite()?;
    Ok(Json(ExportResponse {
        file_name: export_file_name(&scenario.name, Utc::now().date_naive()),
        rows: flatten(&scenario, &calculation),
        document: ExportDocument { scenario, calculation },
    }))
}

/// Launch the API server.  This function builds the router from the
/// configuration and binds to the configured address.  It runs until
/// the process receives Ctrl+C or SIGTERM.
pub async fn serve(config: &Config) -> Result<()> {
    let (router, _state) = build_router(config)?;
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutting down");
}
