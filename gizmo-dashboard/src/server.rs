//! HTTP surface of the dashboard
//!
//! Serves the single-page UI and a small JSON API over the engine handle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use gizmo_engine::{AttributeValue, NodeMetadata, NodeRegistry};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::constants::polling;
use crate::error::DashboardError;
use crate::host::EngineHandle;
use crate::presentation::{DashboardView, PresentationConfig};

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub presentation: Arc<PresentationConfig>,
    /// Node types linked into this binary
    pub registry: Arc<NodeRegistry>,
}

/// Body of an attribute write
#[derive(Debug, Deserialize)]
pub struct SetRequest {
    pub value: AttributeValue,
}

/// Acknowledgement of an accepted write
#[derive(Debug, Serialize, PartialEq)]
pub struct Accepted {
    pub node: String,
    pub attribute: String,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/node-types", get(node_types_handler))
        .route(
            "/api/nodes/:node/attributes/:attribute",
            post(set_attribute_handler),
        )
        .route("/api/nodes/:node/trigger/:attribute", post(trigger_handler))
        .layer(cors)
        .with_state(state)
}

/// Start the Axum HTTP server on `addr`
pub async fn start_server(
    addr: &str,
    state: AppState,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>), DashboardError> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    log::info!("Dashboard listening on http://{}", local);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("Dashboard HTTP server error: {}", e);
        }
    });

    Ok((local, handle))
}

// --- Axum Handlers ---

async fn index_handler() -> Html<String> {
    Html(INDEX_HTML.replace("__REFRESH_MS__", &polling::REFRESH_MS.to_string()))
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn dashboard_handler(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.engine.dashboard(&state.presentation).render())
}

async fn node_types_handler(State(state): State<AppState>) -> Json<Vec<NodeMetadata>> {
    Json(state.registry.all_metadata().into_iter().cloned().collect())
}

async fn set_attribute_handler(
    State(state): State<AppState>,
    Path((node, attribute)): Path<(String, String)>,
    Json(req): Json<SetRequest>,
) -> Result<Json<Accepted>, DashboardError> {
    log::debug!("Set {}.{} = {}", node, attribute, req.value);
    state.engine.set(&node, &attribute, req.value).await?;
    Ok(Json(Accepted { node, attribute }))
}

async fn trigger_handler(
    State(state): State<AppState>,
    Path((node, attribute)): Path<(String, String)>,
) -> Result<Json<Accepted>, DashboardError> {
    log::debug!("Trigger {}.{}", node, attribute);
    state.engine.trigger(&node, &attribute).await?;
    Ok(Json(Accepted { node, attribute }))
}
