use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        approval_request::{ApprovalRequest, NewRequest},
        decision::{
            BulkOutcome, BulkStatusUpdate, CreateOutcome, ForceApproval, RequestListQuery,
            StatusUpdate,
        },
        PaginatedResponse,
    },
    repositories::Store,
    services::Actor,
    state::AppState,
    types::RequestId,
};

pub async fn create_request<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<NewRequest>,
) -> Result<(StatusCode, Json<CreateOutcome>), AppError> {
    let outcome = state.service.create_request(payload, &actor).await?;
    let status = if outcome.created.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome)))
}

pub async fn list_requests<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<PaginatedResponse<ApprovalRequest>>, AppError> {
    let page = state.service.list_requests(query, &actor).await?;
    Ok(Json(page))
}

pub async fn get_request<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<RequestId>,
) -> Result<Json<ApprovalRequest>, AppError> {
    let request = state.service.get_request(id, &actor).await?;
    Ok(Json(request))
}

pub async fn delete_request<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<RequestId>,
) -> Result<StatusCode, AppError> {
    state.service.delete_request(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_status<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<RequestId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<ApprovalRequest>, AppError> {
    body.validate()?;
    let request = state
        .service
        .transition(id, body.status, body.remarks.as_deref(), &actor)
        .await?;
    Ok(Json(request))
}

pub async fn bulk_update_status<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<BulkStatusUpdate>,
) -> Result<Json<BulkOutcome>, AppError> {
    body.validate()?;
    let outcome = state
        .service
        .bulk_transition(&body.request_ids, body.status, body.remarks.as_deref(), &actor)
        .await?;
    Ok(Json(outcome))
}

pub async fn force_approve<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<ForceApproval>,
) -> Result<Json<BulkOutcome>, AppError> {
    body.validate()?;
    let outcome = state
        .service
        .force_approve(&body.request_ids, body.remarks.as_deref(), &actor)
        .await?;
    Ok(Json(outcome))
}
