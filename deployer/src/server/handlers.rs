//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::cloud::cost::CostRequest;
use crate::cloud::registry::ProviderRegistry;
use crate::deploy::fsm::DeploymentState;
use crate::errors::DeployError;
use crate::models::deployment::{DeployRequest, Deployment, LogEntry};
use crate::server::extract::{JsonBody, Owner};
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "aluminum-deployer".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    Json(version_info())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: LoginUser,
}

/// Demo login: any non-empty email/password pair gets a token
pub async fn login_handler(
    State(state): State<Arc<ServerState>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, DeployError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(DeployError::ValidationError(
            "Email and password required".to_string(),
        ));
    }

    let (token, claims) = state.tokens.issue(&request.email)?;
    let name = claims
        .email
        .split('@')
        .next()
        .unwrap_or_default()
        .to_string();

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: LoginUser {
            id: claims.sub,
            email: claims.email,
            name,
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: ProviderRegistry,
}

pub async fn providers_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let providers = state.deployments.registry().clone();
    Json(ProvidersResponse { providers })
}

pub async fn estimate_cost_handler(
    State(state): State<Arc<ServerState>>,
    _owner: Owner,
    JsonBody(request): JsonBody<CostRequest>,
) -> Result<impl IntoResponse, DeployError> {
    Ok(Json(state.deployments.estimate_cost(&request)?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedDeployment {
    pub id: String,
    pub status: DeploymentState,
    pub cloud_provider: String,
    pub region: String,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub message: String,
    pub deployment: StartedDeployment,
}

pub async fn start_handler(
    State(state): State<Arc<ServerState>>,
    Owner(owner_id): Owner,
    JsonBody(request): JsonBody<DeployRequest>,
) -> Result<impl IntoResponse, DeployError> {
    let deployment = state.deployments.start(&owner_id, request).await?;

    let cloud_provider = state
        .deployments
        .registry()
        .get(&deployment.cloud_provider)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| deployment.cloud_provider.clone());

    Ok((
        StatusCode::ACCEPTED,
        Json(StartResponse {
            message: "Deployment started".to_string(),
            deployment: StartedDeployment {
                id: deployment.id,
                status: deployment.status,
                cloud_provider,
                region: deployment.region,
            },
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct DeploymentsResponse {
    pub deployments: Vec<Deployment>,
    pub total: usize,
}

pub async fn list_handler(
    State(state): State<Arc<ServerState>>,
    Owner(owner_id): Owner,
) -> Result<impl IntoResponse, DeployError> {
    let deployments = state.deployments.list(&owner_id).await?;
    let total = deployments.len();
    Ok(Json(DeploymentsResponse { deployments, total }))
}

pub async fn status_handler(
    State(state): State<Arc<ServerState>>,
    Owner(owner_id): Owner,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DeployError> {
    Ok(Json(state.deployments.status(&id, &owner_id).await?))
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}

pub async fn logs_handler(
    State(state): State<Arc<ServerState>>,
    Owner(owner_id): Owner,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DeployError> {
    let logs = state.deployments.logs(&id, &owner_id).await?;
    Ok(Json(LogsResponse { logs }))
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub message: String,
    pub deployment: Deployment,
}

pub async fn cancel_handler(
    State(state): State<Arc<ServerState>>,
    Owner(owner_id): Owner,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DeployError> {
    let deployment = state.deployments.cancel(&id, &owner_id).await?;
    Ok(Json(CancelResponse {
        message: "Deployment cancelled".to_string(),
        deployment,
    }))
}
