//! Resolves the calling user forwarded by the gateway into an [`Actor`].

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, repositories::Store, services::Actor, state::AppState, types::UserId};

pub const USER_ID_HEADER: &str = "x-user-id";

pub async fn require_actor<S: Store>(
    State(state): State<AppState<S>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = extract_user_id(request.headers())?;
    let actor: Actor = state.service.resolve_actor(user_id).await?;
    tracing::debug!(
        user_id = %user_id,
        role = actor.role_label(),
        "Actor resolved"
    );
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

fn extract_user_id(headers: &HeaderMap) -> Result<UserId, AppError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing x-user-id header".into()))?;
    raw.parse()
        .map_err(|_| AppError::Unauthorized("Invalid x-user-id header".into()))
}
