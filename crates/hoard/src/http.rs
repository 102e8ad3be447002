//! HTTP inspection routes.
//!
//! Read-only views of the hub plus one administrative reset. Every handler
//! is a thin query against [`HubHandle`]; nothing here touches the world
//! directly.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hoard_hub::{HubError, HubHandle};
use hoard_protocol::{ContainerId, ContainerView, ParticipantView};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the inspection router.
pub fn router(hub: HubHandle) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/players", get(players))
        .route("/containers", get(containers))
        .route("/reset-containers", post(reset_containers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(hub)
}

#[derive(Debug, Serialize)]
pub struct Index {
    pub message: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub players: usize,
    /// Whole seconds since start.
    pub uptime: u64,
    /// Unix milliseconds.
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct Status {
    pub online: bool,
    pub players: usize,
    pub uptime: u64,
    pub version: &'static str,
    pub server_time: u64,
}

#[derive(Debug, Serialize)]
pub struct Players {
    pub players: Vec<ParticipantView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct Containers {
    pub containers: BTreeMap<ContainerId, ContainerView>,
}

#[derive(Debug, Serialize)]
pub struct ContainersReset {
    pub message: &'static str,
    pub containers: BTreeMap<ContainerId, ContainerView>,
}

async fn index() -> Json<Index> {
    Json(Index {
        message: "Hoard server is running",
        endpoints: BTreeMap::from([
            ("health", "/health"),
            ("status", "/status"),
            ("players", "/players"),
            ("containers", "/containers"),
            ("reset", "POST /reset-containers"),
        ]),
    })
}

async fn health(State(hub): State<HubHandle>) -> Result<Json<Health>, ApiError> {
    let status = hub.status().await?;
    Ok(Json(Health {
        status: if status.shutting_down { "shutting-down" } else { "ok" },
        players: status.active,
        uptime: status.uptime.as_secs(),
        timestamp: unix_millis(),
    }))
}

async fn status(State(hub): State<HubHandle>) -> Result<Json<Status>, ApiError> {
    let status = hub.status().await?;
    Ok(Json(Status {
        online: !status.shutting_down,
        players: status.active,
        uptime: status.uptime.as_secs(),
        version: env!("CARGO_PKG_VERSION"),
        server_time: unix_millis(),
    }))
}

async fn players(State(hub): State<HubHandle>) -> Result<Json<Players>, ApiError> {
    let players = hub.participants().await?;
    Ok(Json(Players { count: players.len(), players }))
}

async fn containers(State(hub): State<HubHandle>) -> Result<Json<Containers>, ApiError> {
    Ok(Json(Containers { containers: hub.containers().await? }))
}

async fn reset_containers(State(hub): State<HubHandle>) -> Result<Json<ContainersReset>, ApiError> {
    let containers = hub.reset_containers().await?;
    Ok(Json(ContainersReset { message: "containers reset", containers }))
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Hub failures mapped onto status codes.
#[derive(Debug)]
pub struct ApiError(HubError);

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match self.0 {
            HubError::ShuttingDown => StatusCode::CONFLICT,
            HubError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        (code, self.0.to_string()).into_response()
    }
}
