//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use super::AppState;
use super::types::{AepQuery, AepResponse, CacheStatusResponse, ErrorResponse, RootResponse};
use crate::analysis::BasicAnalysis;
use crate::cache::CacheOutcome;
use crate::error::AepError;
use crate::risk;

/// Maps an [`AepError`] to a status code and `{ "error": ... }` body.
#[derive(Debug)]
pub struct ApiError(pub AepError);

impl From<AepError> for ApiError {
    fn from(err: AepError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AepError::Validation(_) | AepError::InvalidSimulationCount(_) => {
                StatusCode::BAD_REQUEST
            }
            AepError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AepError::Load(_)
            | AepError::Simulation(_)
            | AepError::Artifact { .. }
            | AepError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, status = status.as_u16(), "request failed");
        } else {
            warn!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

/// `GET /` → 200 + `{ "message": ... }`
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Wind farm AEP backend running",
    })
}

/// Summarizes the SCADA table, re-read on every call.
///
/// `GET /analysis` → 200 + `BasicAnalysis` JSON, 500 if the table cannot be read
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BasicAnalysis>, ApiError> {
    let loader = state.loader.clone();
    let records = tokio::task::spawn_blocking(move || loader.load_scada())
        .await
        .map_err(|e| AepError::Task(e.to_string()))?
        .map_err(AepError::from)?;
    Ok(Json(BasicAnalysis::from_records(&records)))
}

/// Returns the AEP distribution for the resolved count, annotated with risk.
///
/// `GET /analysis/aep` → default count
/// `GET /analysis/aep?num_sim=N` → 200 + `AepResponse` JSON
/// `GET /analysis/aep?num_sim=abc` → 400 (on-demand policy)
/// Missing precomputed artifact → 200 + `ErrorResponse` naming the count
pub async fn get_aep(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AepQuery>,
) -> Result<Response, ApiError> {
    let num_simulations = state.cache.resolve(query.num_sim.as_deref())?;

    match state.cache.get_or_compute(num_simulations).await? {
        CacheOutcome::Ready(entry) => {
            let result = entry.result.clone();
            let risk = risk::classify(result.p50_gwh, result.p90_gwh);
            Ok(Json(AepResponse { result, risk }).into_response())
        }
        CacheOutcome::NotAvailable { num_simulations } => Ok(Json(ErrorResponse {
            error: format!("No precomputed result available for {num_simulations} simulations"),
        })
        .into_response()),
    }
}

/// `GET /analysis/aep/cache` → 200 + `CacheStatusResponse` JSON
pub async fn get_cache_status(State(state): State<Arc<AppState>>) -> Json<CacheStatusResponse> {
    let policy = state.cache.policy();
    Json(CacheStatusResponse {
        policy: policy.name(),
        capacity: policy.capacity(),
        entries: state.cache.entries(),
    })
}
