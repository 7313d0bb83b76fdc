//! HTTP read path (§4.6, §6): a single read endpoint over the Event
//! Store, plus a health check. Not part of the teacher's original
//! surface — grounded in the axum handler/response conventions used
//! elsewhere in the retrieval pack (state extractor, typed JSON
//! responses, path-parameter validation before touching storage).

use crate::db::events::EventStore;
use crate::db::Db;
use crate::types::ChainId;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    db: Arc<Db>,
}

pub fn router(db: Arc<Db>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/events/integrator/:chain_id/:integrator",
            get(events_by_integrator),
        )
        .with_state(AppState { db })
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct EventsEnvelope {
    success: bool,
    data: EventsData,
    meta: EventsMeta,
}

#[derive(Serialize)]
struct EventsData {
    events: Vec<crate::events::FeeEvent>,
}

#[derive(Serialize)]
struct EventsMeta {
    count: usize,
    timestamp: String,
}

/// Shape for `400` parameter-validation failures (§6): `{success:false, error:"…"}`.
#[derive(Serialize)]
struct ValidationErrorEnvelope {
    success: bool,
    error: String,
}

/// Shape for `500` unhandled internal errors (§6): bit-exact `{error:"…"}`,
/// no `success` field.
#[derive(Serialize)]
struct InternalErrorEnvelope {
    error: String,
}

async fn events_by_integrator(
    State(state): State<AppState>,
    Path((chain_id, integrator)): Path<(u64, String)>,
) -> Response {
    if !ChainId::from(chain_id).is_supported() {
        return bad_request(format!("chain id '{chain_id}' is not supported"));
    }

    if !is_valid_address(&integrator) {
        return bad_request(format!(
            "invalid integrator address '{integrator}': must be a 42-character 0x-prefixed hex string"
        ));
    }

    let store = EventStore::new(&state.db);
    match store
        .find_by_integrator(chain_id, &integrator.to_lowercase())
        .await
    {
        Ok(events) => {
            let count = events.len();
            Json(EventsEnvelope {
                success: true,
                data: EventsData { events },
                meta: EventsMeta {
                    count,
                    timestamp: chrono::Utc::now().to_rfc3339(),
                },
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, chain_id, integrator, "failed to query events by integrator");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(InternalErrorEnvelope {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn bad_request(error: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ValidationErrorEnvelope {
            success: false,
            error,
        }),
    )
        .into_response()
}

fn is_valid_address(candidate: &str) -> bool {
    candidate.len() == 42
        && candidate.starts_with("0x")
        && candidate[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_well_formed_address() {
        assert!(is_valid_address(
            "0x1111111111111111111111111111111111111111"
        ));
    }

    #[test]
    fn rejects_short_address() {
        assert!(!is_valid_address("0x123"));
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(!is_valid_address(
            "1111111111111111111111111111111111111111aa"
        ));
    }
}
