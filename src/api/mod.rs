//! HTTP API surface of the daemon.
//!
//! Thin translation layer: requests become registry calls, instances are
//! serialized back as `(name, logdir)` pairs. No board data is served here.

use anyhow::Result;
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::registry::{error::RegistryError, BoardInstance, InstanceRegistry};

/// API request/response types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBoardRequest {
    pub logdir: String,
    /// Seconds between data reloads. Omitted or zero means the configured
    /// default. Ignored when the logdir already has an instance.
    #[serde(default)]
    pub reload_interval: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardInfo {
    pub name: String,
    pub logdir: String,
    pub reload_interval: u64,
    pub uptime_seconds: u64,
    pub data_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardListResponse {
    pub boards: Vec<BoardInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TerminateParams {
    pub force: Option<bool>,
}

/// API Server State
#[derive(Clone)]
pub struct ApiServer {
    pub registry: Arc<RwLock<InstanceRegistry>>,
    pub listen_addr: String,
}

impl ApiServer {
    pub fn new(registry: Arc<RwLock<InstanceRegistry>>, listen_addr: &str) -> Self {
        Self {
            registry,
            listen_addr: listen_addr.to_string(),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/boards", get(list_boards).post(create_board))
            .route("/api/board/:name", get(get_board).delete(delete_board))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    pub async fn start(self) -> Result<()> {
        tracing::info!("API HTTP server starting on {}", self.listen_addr);

        let router = self.router();
        let listener = tokio::net::TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("API listening on http://{}", self.listen_addr);

        axum::serve(listener, router).await?;
        Ok(())
    }
}

async fn board_info(instance: &BoardInstance) -> BoardInfo {
    BoardInfo {
        name: instance.name.clone(),
        logdir: instance.directory.display().to_string(),
        reload_interval: instance.app.reload_interval(),
        uptime_seconds: instance.app.uptime_seconds(),
        data_files: instance.app.snapshot().await.len(),
    }
}

/// GET /api/boards - all live board instances
async fn list_boards(State(state): State<ApiServer>) -> impl IntoResponse {
    let registry = state.registry.read().await;

    let mut boards = Vec::new();
    for instance in registry.list() {
        boards.push(board_info(instance).await);
    }

    Json(BoardListResponse { boards })
}

/// POST /api/boards - get-or-create an instance for a logdir
async fn create_board(
    State(state): State<ApiServer>,
    Json(payload): Json<CreateBoardRequest>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;

    match registry
        .get_or_create(Path::new(&payload.logdir), payload.reload_interval)
        .await
    {
        Ok(_) => {
            // resolve back through the directory index for the name
            match registry.find_by_directory(Path::new(&payload.logdir)) {
                Some(instance) => {
                    (StatusCode::OK, Json(board_info(instance).await)).into_response()
                }
                None => {
                    let error = json!({ "error": "Instance vanished after creation" });
                    (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
                }
            }
        }
        Err(e) => e.into_response(),
    }
}

/// GET /api/board/:name - single instance lookup
async fn get_board(
    AxumPath(name): AxumPath<String>,
    State(state): State<ApiServer>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;

    match registry.get(&name) {
        Some(instance) => (StatusCode::OK, Json(board_info(instance).await)).into_response(),
        None => RegistryError::InstanceNotFound(name).into_response(),
    }
}

/// DELETE /api/board/:name - terminate an instance (`?force=` optional,
/// defaults to true)
async fn delete_board(
    AxumPath(name): AxumPath<String>,
    Query(params): Query<TerminateParams>,
    State(state): State<ApiServer>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;

    match registry.terminate(&name, params.force.unwrap_or(true)) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(e) => e.into_response(),
    }
}
