//! HTTP API served by `gpuinfod run`.
//!
//! The state store holds an exclusive lock on its file, so while the
//! controller runs, requests and nodes are created and inspected through
//! these routes rather than through the offline `apply` and `get` commands.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/requests` | List requests |
//! | POST | `/api/v1/requests` | Create or re-apply a request |
//! | GET | `/api/v1/requests/{namespace}/{name}` | Get a request with its status |
//! | DELETE | `/api/v1/requests/{namespace}/{name}` | Delete a request |
//! | GET | `/api/v1/nodes` | List nodes |
//! | POST | `/api/v1/nodes` | Register a node |

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use gpuinfo_state::{GpuInfo, NodeInfo, StateError, StateStore};
use tracing::info;

use crate::manifest::RequestEntry;

#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
}

pub fn build_router(store: StateStore) -> Router {
    let api_routes = Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route(
            "/requests/{namespace}/{name}",
            get(get_request).delete(delete_request),
        )
        .route("/nodes", get(list_nodes).post(create_node))
        .with_state(ApiState { store });

    Router::new().nest("/api/v1", api_routes)
}

#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn state_error(e: &StateError) -> axum::response::Response {
    let status = match e {
        StateError::Invalid { .. } => StatusCode::BAD_REQUEST,
        StateError::NotFound(_) => StatusCode::NOT_FOUND,
        StateError::Conflict { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(&e.to_string(), status).into_response()
}

// ── Requests ───────────────────────────────────────────────────

/// GET /api/v1/requests
async fn list_requests(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_requests() {
        Ok(requests) => ApiResponse::ok(requests).into_response(),
        Err(e) => state_error(&e),
    }
}

/// POST /api/v1/requests
async fn create_request(
    State(state): State<ApiState>,
    Json(entry): Json<RequestEntry>,
) -> impl IntoResponse {
    let request = GpuInfo::new(&entry.namespace, &entry.name, entry.spec);
    let key = request.table_key();
    let stored = state
        .store
        .put_request(&request)
        .and_then(|_| state.store.get_request(&key));
    match stored {
        Ok(Some(stored)) => {
            info!(request = %key, version = stored.resource_version, "request applied via api");
            (StatusCode::CREATED, ApiResponse::ok(stored)).into_response()
        }
        Ok(None) => error_response("request vanished after write", StatusCode::CONFLICT)
            .into_response(),
        Err(e) => state_error(&e),
    }
}

/// GET /api/v1/requests/{namespace}/{name}
async fn get_request(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.store.get_request(&format!("{namespace}/{name}")) {
        Ok(Some(request)) => ApiResponse::ok(request).into_response(),
        Ok(None) => error_response("request not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => state_error(&e),
    }
}

/// DELETE /api/v1/requests/{namespace}/{name}
async fn delete_request(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.store.delete_request(&format!("{namespace}/{name}")) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("request not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => state_error(&e),
    }
}

// ── Nodes ──────────────────────────────────────────────────────

/// GET /api/v1/nodes
async fn list_nodes(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_nodes() {
        Ok(nodes) => ApiResponse::ok(nodes).into_response(),
        Err(e) => state_error(&e),
    }
}

/// POST /api/v1/nodes
async fn create_node(
    State(state): State<ApiState>,
    Json(node): Json<NodeInfo>,
) -> impl IntoResponse {
    match state.store.put_node(&node) {
        Ok(()) => (StatusCode::CREATED, ApiResponse::ok(node)).into_response(),
        Err(e) => state_error(&e),
    }
}
