//! Leave bank ledger operations.

use chrono::Datelike;
use validator::ValidationErrors;

use crate::config::LeaveOverdraftPolicy;
use crate::error::AppError;
use crate::models::{
    approval_request::ApprovalRequest,
    leave_bank::{LeaveBalance, LeaveBank, LeaveBankAdjustment, LeaveBankSummary, LeaveCredit, LeaveType},
};
use crate::repositories::store::{Store, UnitOfWork};
use crate::services::{
    approvals::{settle, ApprovalService},
    roles::Actor,
};
use crate::types::{AdjustmentId, EmployeeId};
use crate::validation::rules;

impl<S: Store> ApprovalService<S> {
    /// Charges the request's leave days to its bank. No-op for unpaid or
    /// unbanked leave and for every other request kind.
    pub(crate) async fn debit_leave(
        &self,
        tx: &mut S::Tx,
        request: &ApprovalRequest,
    ) -> Result<(), AppError> {
        let Some((leave_type, year, days)) = request.leave_debit() else {
            return Ok(());
        };

        let mut bank = tx
            .leave_bank_for_update(
                request.employee_id,
                leave_type,
                year,
                self.policy.leave_default_days,
            )
            .await?;

        if !bank.can_cover(days) {
            match self.policy.overdraft {
                LeaveOverdraftPolicy::Block => {
                    return Err(AppError::Conflict(format!(
                        "Insufficient {} leave balance: {} day(s) remaining, {} requested",
                        leave_type.db_value(),
                        bank.remaining(),
                        days
                    )));
                }
                LeaveOverdraftPolicy::Warn => {
                    tracing::warn!(
                        request_id = %request.id,
                        employee_id = %request.employee_id,
                        leave_type = leave_type.db_value(),
                        year,
                        remaining_after = bank.remaining() - days,
                        "Leave bank overdrawn"
                    );
                }
            }
        }

        bank.used_days += days;
        tx.save_leave_bank(&bank).await?;
        tracing::debug!(
            request_id = %request.id,
            leave_type = leave_type.db_value(),
            year,
            days,
            used_days = bank.used_days,
            "Leave bank debited"
        );
        Ok(())
    }

    /// Sick and vacation balances for `year`, creating missing banks with the
    /// default allotment.
    pub async fn get_leave_bank(
        &self,
        employee_id: EmployeeId,
        year: Option<i32>,
        actor: &Actor,
    ) -> Result<LeaveBankSummary, AppError> {
        let year = year.unwrap_or_else(|| self.clock.today().year());
        let mut tx = self.store.begin().await?;
        let result = self.leave_bank_in(&mut tx, employee_id, year, actor).await;
        settle(tx, result).await
    }

    async fn leave_bank_in(
        &self,
        tx: &mut S::Tx,
        employee_id: EmployeeId,
        year: i32,
        actor: &Actor,
    ) -> Result<LeaveBankSummary, AppError> {
        let employee = tx
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;

        let profile = &actor.profile;
        let visible = profile.is_hr_authority()
            || profile.employee_id == Some(employee_id)
            || profile.manages(&employee.department);
        if !visible {
            return Err(AppError::Forbidden(
                "You are not allowed to view this leave bank".into(),
            ));
        }

        let default_total = self.policy.leave_default_days;
        let sick = tx
            .leave_bank_for_update(employee_id, LeaveType::Sick, year, default_total)
            .await?;
        let vacation = tx
            .leave_bank_for_update(employee_id, LeaveType::Vacation, year, default_total)
            .await?;

        Ok(LeaveBankSummary {
            employee_id,
            year,
            sick: LeaveBalance::from(&sick),
            vacation: LeaveBalance::from(&vacation),
        })
    }

    /// Adds days to the current year's bank and records an adjustment row.
    /// HRD managers and superadmins only.
    pub async fn add_leave_bank_days(
        &self,
        employee_id: EmployeeId,
        credit: LeaveCredit,
        actor: &Actor,
    ) -> Result<LeaveBank, AppError> {
        if !actor.profile.is_hr_authority() {
            return Err(AppError::Forbidden(
                "Only an HRD manager or a superadmin can credit leave".into(),
            ));
        }
        validate_credit(&credit)?;

        let year = self.clock.today().year();
        let mut tx = self.store.begin().await?;
        let result = self
            .credit_in(&mut tx, employee_id, year, &credit, actor)
            .await;
        settle(tx, result).await
    }

    async fn credit_in(
        &self,
        tx: &mut S::Tx,
        employee_id: EmployeeId,
        year: i32,
        credit: &LeaveCredit,
        actor: &Actor,
    ) -> Result<LeaveBank, AppError> {
        if tx.find_employee(employee_id).await?.is_none() {
            return Err(AppError::NotFound("Employee not found".into()));
        }

        let mut bank = tx
            .leave_bank_for_update(
                employee_id,
                credit.leave_type,
                year,
                self.policy.leave_default_days,
            )
            .await?;
        bank.total_days += credit.days;
        tx.save_leave_bank(&bank).await?;

        let now = self.clock.now();
        tx.insert_leave_adjustment(&LeaveBankAdjustment {
            id: AdjustmentId::new(),
            employee_id,
            leave_type: credit.leave_type,
            year,
            days: credit.days,
            reason: credit.reason.trim().to_string(),
            adjusted_by: actor.id(),
            created_at: now,
        })
        .await?;
        bank.updated_at = now;

        tracing::info!(
            employee_id = %employee_id,
            leave_type = credit.leave_type.db_value(),
            year,
            days = credit.days,
            total_days = bank.total_days,
            actor = %actor.id(),
            "Leave bank credited"
        );
        Ok(bank)
    }
}

fn validate_credit(credit: &LeaveCredit) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();
    if !credit.leave_type.is_banked() {
        errors.add(
            "leave_type",
            validator::ValidationError::new("leave_type_not_banked"),
        );
    }
    if let Err(e) = rules::validate_leave_credit(credit.days) {
        errors.add("days", e);
    }
    if let Err(e) = rules::validate_reason(&credit.reason) {
        errors.add("reason", e);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}
