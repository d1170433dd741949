//! Approval workflow service: filing, single transitions, reads, and deletes.
//!
//! Every public operation runs inside one unit of work. Per-request problems
//! (authorization, validation, conflicts) come back as item-level `AppError`s;
//! storage failures roll the unit of work back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::config::{Config, LeaveOverdraftPolicy};
use crate::error::AppError;
use crate::models::{
    approval_request::{ApprovalRequest, NewRequest, RequestDetails},
    decision::{CreateOutcome, RejectedFiling, RequestListQuery},
    request::RequestStatus,
    PaginatedResponse,
};
use crate::repositories::store::{RequestListFilters, RequestScope, Store, UnitOfWork};
use crate::services::{
    leave::calculate_leave_days,
    roles::{resolve_authority, Actor, RoleInputs},
    state_machine::{self, Transition},
};
use crate::types::{EmployeeId, RequestId, UserId};
use crate::utils::time::Clock;

/// Tunables taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApprovalPolicy {
    pub leave_default_days: f64,
    pub overtime_manager_min_hours: f64,
    pub overdraft: LeaveOverdraftPolicy,
    pub legacy_role_heuristics: bool,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            leave_default_days: 15.0,
            overtime_manager_min_hours: 4.0,
            overdraft: LeaveOverdraftPolicy::Block,
            legacy_role_heuristics: false,
        }
    }
}

impl From<&Config> for ApprovalPolicy {
    fn from(config: &Config) -> Self {
        Self {
            leave_default_days: config.leave_default_days,
            overtime_manager_min_hours: config.overtime_manager_min_hours,
            overdraft: config.leave_overdraft_policy,
            legacy_role_heuristics: config.legacy_role_heuristics,
        }
    }
}

pub struct ApprovalService<S: Store> {
    pub(crate) store: S,
    pub(crate) policy: ApprovalPolicy,
    pub(crate) clock: Arc<dyn Clock>,
}

/// Commits on success and rolls back on error, returning the original result.
pub(crate) async fn settle<T, U: UnitOfWork>(
    tx: U,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if !err.is_item_level() {
                tracing::error!(error = %err, "Rolling back unit of work");
            }
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

impl<S: Store> ApprovalService<S> {
    pub fn new(store: S, policy: ApprovalPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    /// Loads a user and resolves their authority profile.
    pub async fn resolve_actor(&self, user_id: UserId) -> Result<Actor, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self.resolve_actor_in(&mut tx, user_id).await;
        settle(tx, result).await
    }

    async fn resolve_actor_in(&self, tx: &mut S::Tx, user_id: UserId) -> Result<Actor, AppError> {
        let user = tx
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;
        let employee = match user.employee_id {
            Some(id) => tx.find_employee(id).await?,
            None => None,
        };
        let managed = tx.departments_managed_by(user.id).await?;
        let first_user_id = if self.policy.legacy_role_heuristics {
            tx.first_user_id().await?
        } else {
            None
        };

        let profile = resolve_authority(RoleInputs {
            user: &user,
            employee: employee.as_ref(),
            managed: &managed,
            first_user_id,
            legacy_heuristics: self.policy.legacy_role_heuristics,
        });
        Ok(Actor::new(user, profile))
    }

    /// Files one request per listed employee. Employees that cannot be filed
    /// for are reported individually in `rejected`.
    pub async fn create_request(
        &self,
        payload: NewRequest,
        actor: &Actor,
    ) -> Result<CreateOutcome, AppError> {
        payload.validate()?;
        payload
            .details
            .validate_payload()
            .map_err(AppError::Validation)?;

        let NewRequest {
            employee_ids,
            reason,
            mut details,
        } = payload;
        if let Some(leave) = details.as_leave_mut() {
            leave.total_days =
                calculate_leave_days(leave.start_date, leave.end_date, leave.half_day);
            if leave.total_days <= 0.0 {
                return Err(AppError::invalid(
                    "details: leave range contains no working days",
                ));
            }
        }

        let mut unique: Vec<EmployeeId> = Vec::with_capacity(employee_ids.len());
        for id in employee_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let result = self
            .create_in(&mut tx, &unique, reason.trim(), &details, actor, now)
            .await;
        settle(tx, result).await
    }

    async fn create_in(
        &self,
        tx: &mut S::Tx,
        employee_ids: &[EmployeeId],
        reason: &str,
        details: &RequestDetails,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<CreateOutcome, AppError> {
        let mut outcome = CreateOutcome::default();
        for &employee_id in employee_ids {
            match self
                .file_one(tx, employee_id, reason, details, actor, now)
                .await
            {
                Ok(request) => outcome.created.push(request),
                Err(err) if err.is_item_level() => {
                    tracing::warn!(
                        employee_id = %employee_id,
                        actor = %actor.id(),
                        error = %err,
                        "Request filing rejected"
                    );
                    outcome.rejected.push(RejectedFiling {
                        employee_id,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(outcome)
    }

    async fn file_one(
        &self,
        tx: &mut S::Tx,
        employee_id: EmployeeId,
        reason: &str,
        details: &RequestDetails,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest, AppError> {
        let employee = tx
            .find_employee_for_update(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;

        let profile = &actor.profile;
        let may_file = profile.is_hr_authority()
            || profile.employee_id == Some(employee_id)
            || profile.manages(&employee.department);
        if !may_file {
            return Err(AppError::Forbidden(
                "You cannot file requests for this employee".into(),
            ));
        }

        if let Some(leave) = details.as_leave() {
            let department = tx.find_department(&employee.department).await?;
            if department.is_some_and(|d| !d.is_active) {
                return Err(AppError::Conflict(format!(
                    "Department {} is inactive",
                    employee.department
                )));
            }

            let overlapping = tx
                .overlapping_leave(employee_id, leave.start_date, leave.end_date)
                .await?;
            if let Some(existing) = overlapping.first() {
                return Err(AppError::Conflict(format!(
                    "Leave overlaps an existing request from {} to {}",
                    existing.period_start, existing.period_end
                )));
            }

            if leave.is_banked() {
                let bank = tx
                    .leave_bank_for_update(
                        employee_id,
                        leave.leave_type,
                        leave.bank_year(),
                        self.policy.leave_default_days,
                    )
                    .await?;
                if !bank.can_cover(leave.total_days) {
                    return Err(AppError::Conflict(format!(
                        "Insufficient {} leave balance: {} day(s) remaining, {} requested",
                        leave.leave_type.db_value(),
                        bank.remaining(),
                        leave.total_days
                    )));
                }
            }
        }

        let mut request = ApprovalRequest::new(
            employee_id,
            reason.to_string(),
            details.clone(),
            actor.id(),
            now,
        );
        request.dept_manager_id = tx
            .department_manager(&employee.department)
            .await?
            .map(|m| m.manager_id);

        let status = state_machine::apply_filing_stage(
            &mut request,
            actor,
            &employee.department,
            self.policy.overtime_manager_min_hours,
            now,
        );
        if status == RequestStatus::Approved {
            self.debit_leave(tx, &request).await?;
        }
        tx.insert_request(&request).await?;

        tracing::info!(
            request_id = %request.id,
            kind = %request.kind,
            employee_id = %employee_id,
            status = %request.status,
            actor = %actor.id(),
            "Request filed"
        );
        Ok(request)
    }

    /// Moves one request to `target`.
    pub async fn transition(
        &self,
        id: RequestId,
        target: RequestStatus,
        remarks: Option<&str>,
        actor: &Actor,
    ) -> Result<ApprovalRequest, AppError> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let result = self
            .transition_in(&mut tx, id, target, remarks, actor, now)
            .await;
        settle(tx, result).await
    }

    pub(crate) async fn load_for_update(
        &self,
        tx: &mut S::Tx,
        id: RequestId,
    ) -> Result<ApprovalRequest, AppError> {
        tx.find_request_for_update(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".into()))
    }

    pub(crate) async fn employee_department(
        &self,
        tx: &mut S::Tx,
        employee_id: EmployeeId,
    ) -> Result<Option<String>, AppError> {
        Ok(tx.find_employee(employee_id).await?.map(|e| e.department))
    }

    pub(crate) async fn transition_in(
        &self,
        tx: &mut S::Tx,
        id: RequestId,
        target: RequestStatus,
        remarks: Option<&str>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest, AppError> {
        let current = self.load_for_update(tx, id).await?;
        let department = self.employee_department(tx, current.employee_id).await?;

        let mut updated = current.clone();
        let step = state_machine::apply_transition(
            &mut updated,
            target,
            remarks,
            actor,
            department.as_deref(),
            now,
        )?;
        self.persist_step(tx, &updated, step, actor).await?;
        Ok(updated)
    }

    /// Writes a transitioned row, debiting the leave bank first when the
    /// request has just become approved.
    pub(crate) async fn persist_step(
        &self,
        tx: &mut S::Tx,
        request: &ApprovalRequest,
        step: Transition,
        actor: &Actor,
    ) -> Result<(), AppError> {
        if step.lands_approved() {
            self.debit_leave(tx, request).await?;
        }
        tx.update_request(request).await?;

        tracing::info!(
            request_id = %request.id,
            kind = %request.kind,
            from = %step.from,
            to = %step.to,
            forced = step.forced,
            actor = %actor.id(),
            "Request status updated"
        );
        Ok(())
    }

    pub async fn get_request(
        &self,
        id: RequestId,
        actor: &Actor,
    ) -> Result<ApprovalRequest, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self.get_in(&mut tx, id, actor).await;
        settle(tx, result).await
    }

    async fn get_in(
        &self,
        tx: &mut S::Tx,
        id: RequestId,
        actor: &Actor,
    ) -> Result<ApprovalRequest, AppError> {
        let request = tx
            .find_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".into()))?;
        let department = self.employee_department(tx, request.employee_id).await?;

        let profile = &actor.profile;
        let visible = profile.is_hr_authority()
            || request.dept_manager_id == Some(actor.id())
            || profile.employee_id == Some(request.employee_id)
            || department.is_some_and(|d| profile.manages(&d));
        if !visible {
            return Err(AppError::Forbidden(
                "You are not allowed to view this request".into(),
            ));
        }
        Ok(request)
    }

    /// Lists requests visible to `actor`, newest first.
    pub async fn list_requests(
        &self,
        query: RequestListQuery,
        actor: &Actor,
    ) -> Result<PaginatedResponse<ApprovalRequest>, AppError> {
        let page = query.pagination();
        let (limit, offset) = (page.limit(), page.offset());
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(AppError::invalid("from: must not be after to"));
            }
        }

        let profile = &actor.profile;
        let scope = if profile.is_hr_authority() {
            RequestScope::All
        } else {
            RequestScope::Visible {
                user_id: actor.id(),
                employee_id: profile.employee_id,
                departments: profile.managed_departments.clone(),
            }
        };
        let filters = RequestListFilters {
            kind: query.kind,
            status: query.status,
            employee_id: query.employee_id,
            from: query.from,
            to: query.to,
            scope,
        };

        let mut tx = self.store.begin().await?;
        let result = tx.list_requests(&filters, limit, offset).await;
        let (rows, total) = settle(tx, result).await?;
        Ok(PaginatedResponse::new(rows, total, limit, offset))
    }

    /// Deletes a request that is still pending.
    pub async fn delete_request(&self, id: RequestId, actor: &Actor) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        let result = self.delete_in(&mut tx, id, actor).await;
        settle(tx, result).await
    }

    async fn delete_in(
        &self,
        tx: &mut S::Tx,
        id: RequestId,
        actor: &Actor,
    ) -> Result<(), AppError> {
        let request = self.load_for_update(tx, id).await?;
        if !request.is_pending() {
            return Err(AppError::Conflict(format!(
                "Only pending requests can be deleted; this one is {}",
                request.status
            )));
        }

        let department = self.employee_department(tx, request.employee_id).await?;
        let allowed = request.created_by == actor.id()
            || state_machine::is_first_stage_approver(&request, actor, department.as_deref());
        if !allowed {
            return Err(AppError::Forbidden(
                "You are not allowed to delete this request".into(),
            ));
        }

        if tx.delete_pending_request(id).await? == 0 {
            return Err(AppError::Conflict("Request is no longer pending".into()));
        }
        tracing::info!(request_id = %id, actor = %actor.id(), "Request deleted");
        Ok(())
    }
}
