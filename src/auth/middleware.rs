use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{auth::extractors::AuthUser, error::AppError, state::AppState};

/// Pulls the token out of `Authorization: <scheme> <token>`. The scheme is
/// not checked here; a token that fails verification is refused by the gate.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;

    let invalid_format = || AppError::Unauthorized("Invalid token format".into());
    let value = value.to_str().map_err(|_| invalid_format())?;
    let (_scheme, token) = value.trim().split_once(' ').ok_or_else(invalid_format)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(invalid_format());
    }
    Ok(token)
}

/// Gate for protected routes: verifies the bearer token and attaches the
/// caller's identity to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?;

    let claims = state.keys.verify(token).map_err(|e| {
        warn!(reason = %e, "token verification failed");
        AppError::Forbidden("Token is not valid".into())
    })?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        claims,
    });
    Ok(next.run(req).await)
}
