//! Request extractors

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::Json;
use http::header::AUTHORIZATION;
use http::request::Parts;

use crate::errors::DeployError;
use crate::server::state::ServerState;

/// Owner id resolved from the `Authorization: Bearer <token>` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl FromRequestParts<Arc<ServerState>> for Owner {
    type Rejection = DeployError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServerState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| DeployError::Unauthorized("No token provided".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DeployError::Unauthorized("Expected a bearer token".to_string()))?;

        let claims = state.tokens.verify(token)?;
        Ok(Owner(claims.sub))
    }
}

/// JSON request body whose rejections surface as [`DeployError`]
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = DeployError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}
