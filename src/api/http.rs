use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::chain::ChainApi;
use crate::error::{ApiError, RpcError};
use crate::models::Balance;
use crate::monitor::TrackedAddresses;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressesResponse {
    pub addresses: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddAddressesRequest {
    pub addresses: Vec<String>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TrackedAddresses>,
    pub chain: Arc<dyn ChainApi>,
}

/// HTTP surface over the registry and boundary lookups.
pub struct ApiServer {
    state: AppState,
    host: String,
    pub port: u16,
}

impl ApiServer {
    pub fn new(
        registry: Arc<TrackedAddresses>,
        chain: Arc<dyn ChainApi>,
        host: String,
        port: u16,
    ) -> Self {
        Self {
            state: AppState { registry, chain },
            host,
            port,
        }
    }

    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(get_health))
            .route("/addresses", get(get_addresses).post(add_addresses))
            .route("/balances/:account", get(get_balance))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
            .with_state(state)
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<(), ApiError> {
        let app = Self::router(self.state.clone());

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        log::info!("HTTP API server starting on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::Server(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// GET /health
async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /addresses - current registry membership, unordered
async fn get_addresses(State(state): State<AppState>) -> Json<AddressesResponse> {
    Json(AddressesResponse {
        addresses: state.registry.list(),
    })
}

/// POST /addresses - add accounts to the registry (insertion-only)
async fn add_addresses(
    State(state): State<AppState>,
    Json(request): Json<AddAddressesRequest>,
) -> Result<Json<AddressesResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.addresses.is_empty() {
        return Err(error_response(ApiError::InvalidParameter(
            "addresses must not be empty".to_string(),
        )));
    }
    if request.addresses.iter().any(|a| a.trim().is_empty()) {
        return Err(error_response(ApiError::InvalidParameter(
            "addresses must not contain blank entries".to_string(),
        )));
    }

    state.registry.add(request.addresses);
    Ok(Json(AddressesResponse {
        addresses: state.registry.list(),
    }))
}

/// GET /balances/{account} - fresh single-account balance snapshot
async fn get_balance(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<Balance>, (StatusCode, Json<ErrorResponse>)> {
    match state.chain.get_balance(&account).await {
        Ok(balance) => Ok(Json(balance)),
        Err(e) => Err(error_response(ApiError::Rpc(e))),
    }
}

fn error_response(error: ApiError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        ApiError::Rpc(RpcError::AccountNotFound(_)) => StatusCode::NOT_FOUND,
        ApiError::Rpc(_) => StatusCode::BAD_GATEWAY,
        ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}
