use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::leave_bank::{LeaveBank, LeaveBankSummary, LeaveCredit},
    repositories::Store,
    services::Actor,
    state::AppState,
    types::EmployeeId,
};

#[derive(Debug, Default, Deserialize)]
pub struct LeaveBankQuery {
    pub year: Option<i32>,
}

pub async fn get_leave_bank<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(employee_id): Path<EmployeeId>,
    Query(query): Query<LeaveBankQuery>,
) -> Result<Json<LeaveBankSummary>, AppError> {
    if let Some(year) = query.year {
        if !(1970..=9999).contains(&year) {
            return Err(AppError::invalid("year: out of range"));
        }
    }
    let summary = state
        .service
        .get_leave_bank(employee_id, query.year, &actor)
        .await?;
    Ok(Json(summary))
}

pub async fn credit_leave_bank<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(employee_id): Path<EmployeeId>,
    Json(credit): Json<LeaveCredit>,
) -> Result<(StatusCode, Json<LeaveBank>), AppError> {
    let bank = state
        .service
        .add_leave_bank_days(employee_id, credit, &actor)
        .await?;
    Ok((StatusCode::CREATED, Json(bank)))
}
