//! Status transitions shared by every request kind.
//!
//! All functions here are pure: they inspect the actor and the request row,
//! mutate the row in place, and report what changed. Persisting the row and
//! touching the leave bank is left to the service.

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{
    approval_request::{ApprovalRequest, RequestDetails},
    request::{RequestStatus, StageLadder},
};
use crate::services::roles::Actor;
use crate::types::UserId;
use crate::validation::rules::MAX_TEXT_LENGTH;

const OVERRIDE_PREFIX: &str = "Administrative override:";

/// Outcome of a successful status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RequestStatus,
    pub to: RequestStatus,
    /// Set when intermediate stages were collapsed by a superadmin.
    pub forced: bool,
}

impl Transition {
    fn new(from: RequestStatus, to: RequestStatus) -> Self {
        Self {
            from,
            to,
            forced: false,
        }
    }

    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    /// True only for the step into `approved`; the leave bank is debited exactly here.
    pub fn lands_approved(&self) -> bool {
        self.to == RequestStatus::Approved && self.from != RequestStatus::Approved
    }
}

#[derive(Debug, Clone, Copy)]
enum Stamp {
    Department,
    Hrd,
    Final,
}

/// May act on `pending` (three-stage) or on any stage of a two-stage kind.
pub fn is_first_stage_approver(
    request: &ApprovalRequest,
    actor: &Actor,
    employee_department: Option<&str>,
) -> bool {
    actor.profile.is_super_admin
        || request.dept_manager_id == Some(actor.id())
        || employee_department.is_some_and(|d| actor.profile.manages(d))
}

/// May act on `manager_approved`.
pub fn is_second_stage_approver(actor: &Actor) -> bool {
    actor.profile.is_hr_authority()
}

fn is_stage_approver(
    request: &ApprovalRequest,
    actor: &Actor,
    employee_department: Option<&str>,
) -> bool {
    match (request.ladder(), request.status) {
        (StageLadder::ThreeStage, RequestStatus::Pending) => {
            is_first_stage_approver(request, actor, employee_department)
        }
        (StageLadder::ThreeStage, _) => is_second_stage_approver(actor),
        (StageLadder::TwoStage, _) => {
            is_first_stage_approver(request, actor, employee_department)
                || is_second_stage_approver(actor)
        }
    }
}

/// Remark used when an approver does not supply one.
pub fn default_remark(actor: &Actor) -> String {
    format!("Bulk/administrative action by {}", actor.role_label())
}

fn clean_remarks(remarks: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(text) = remarks.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(AppError::invalid(format!(
            "remarks: must be at most {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(Some(text.to_string()))
}

fn stamp(
    request: &mut ApprovalRequest,
    level: Stamp,
    by: UserId,
    at: DateTime<Utc>,
    remarks: String,
) {
    match level {
        Stamp::Department => {
            request.dept_approved_by = Some(by);
            request.dept_approved_at = Some(at);
            request.dept_remarks = Some(remarks);
        }
        Stamp::Hrd => {
            request.hrd_approved_by = Some(by);
            request.hrd_approved_at = Some(at);
            request.hrd_remarks = Some(remarks);
        }
        Stamp::Final => {
            request.approved_by = Some(by);
            request.approved_at = Some(at);
            request.remarks = Some(remarks);
        }
    }
}

/// Applies a normal-path status change requested by `actor`.
///
/// `employee_department` is the current department of the request's employee.
/// On error the request is left untouched.
pub fn apply_transition(
    request: &mut ApprovalRequest,
    target: RequestStatus,
    remarks: Option<&str>,
    actor: &Actor,
    employee_department: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    let from = request.status;
    let remarks = clean_remarks(remarks)?;

    if from == target {
        return update_remarks(request, remarks, actor, employee_department, now);
    }

    if from.is_terminal() {
        return Err(AppError::Forbidden(format!(
            "Request is already {from} and cannot be changed to {target}"
        )));
    }

    let ladder = request.ladder();
    let level = match (ladder, from, target) {
        (StageLadder::ThreeStage, RequestStatus::Pending, RequestStatus::Approved) => {
            if actor.profile.is_super_admin {
                return force_approve(request, remarks.as_deref(), actor, now);
            }
            return Err(AppError::Forbidden(
                "Request needs department approval before final approval".into(),
            ));
        }
        (
            StageLadder::ThreeStage,
            RequestStatus::Pending,
            RequestStatus::ManagerApproved | RequestStatus::Rejected,
        ) => {
            if !is_first_stage_approver(request, actor, employee_department) {
                return Err(AppError::Forbidden(
                    "Only the assigned department manager or a superadmin can act on this request"
                        .into(),
                ));
            }
            Stamp::Department
        }
        (
            StageLadder::ThreeStage,
            RequestStatus::ManagerApproved,
            RequestStatus::Approved | RequestStatus::Rejected,
        ) => {
            if !is_second_stage_approver(actor) {
                return Err(AppError::Forbidden(
                    "Only an HRD manager or a superadmin can give final approval".into(),
                ));
            }
            Stamp::Hrd
        }
        (
            StageLadder::TwoStage,
            RequestStatus::Pending,
            RequestStatus::Approved | RequestStatus::Rejected,
        ) => {
            if !is_stage_approver(request, actor, employee_department) {
                return Err(AppError::Forbidden(
                    "You are not authorized to act on this request".into(),
                ));
            }
            Stamp::Final
        }
        _ => {
            return Err(AppError::Forbidden(format!(
                "This {} cannot move from {from} to {target}",
                request.kind.label()
            )));
        }
    };

    if target == RequestStatus::Rejected && remarks.is_none() {
        return Err(AppError::invalid("remarks: required when rejecting a request"));
    }

    let remarks = remarks.unwrap_or_else(|| default_remark(actor));
    stamp(request, level, actor.id(), now, remarks);
    request.status = target;
    request.updated_at = now;
    Ok(Transition::new(from, target))
}

fn update_remarks(
    request: &mut ApprovalRequest,
    remarks: Option<String>,
    actor: &Actor,
    employee_department: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    let status = request.status;
    if status.is_terminal() {
        return Err(AppError::Conflict(format!("Request is already {status}")));
    }
    if !is_stage_approver(request, actor, employee_department) {
        return Err(AppError::Forbidden(
            "You are not authorized to act on this request".into(),
        ));
    }
    let Some(remarks) = remarks else {
        return Err(AppError::invalid(
            "remarks: required when the status does not change",
        ));
    };

    match (request.ladder(), status) {
        (StageLadder::ThreeStage, RequestStatus::Pending) => request.dept_remarks = Some(remarks),
        (StageLadder::ThreeStage, _) => request.hrd_remarks = Some(remarks),
        (StageLadder::TwoStage, _) => request.remarks = Some(remarks),
    }
    request.updated_at = now;
    Ok(Transition::new(status, status))
}

/// Collapses every remaining stage into a final approval. Superadmin only.
///
/// Department-level fields are filled only where they are still empty; the
/// final-level fields are always overwritten.
pub fn force_approve(
    request: &mut ApprovalRequest,
    remarks: Option<&str>,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    if !actor.profile.is_super_admin {
        return Err(AppError::Forbidden(
            "Only a superadmin can force-approve requests".into(),
        ));
    }
    let from = request.status;
    if from == RequestStatus::Approved {
        return Err(AppError::Conflict("Request is already approved".into()));
    }

    let note = match clean_remarks(remarks)? {
        Some(text) => format!("{OVERRIDE_PREFIX} {text}"),
        None => format!("{OVERRIDE_PREFIX} force-approved by {}", actor.role_label()),
    };

    match request.ladder() {
        StageLadder::ThreeStage => {
            request.dept_approved_by.get_or_insert(actor.id());
            request.dept_approved_at.get_or_insert(now);
            request.dept_remarks.get_or_insert_with(|| note.clone());
            stamp(request, Stamp::Hrd, actor.id(), now, note);
        }
        StageLadder::TwoStage => stamp(request, Stamp::Final, actor.id(), now, note),
    }

    request.status = RequestStatus::Approved;
    request.updated_at = now;
    Ok(Transition {
        from,
        to: RequestStatus::Approved,
        forced: true,
    })
}

/// Sets the initial stage of a freshly built request according to the filer's role.
///
/// Superadmins and HRD managers land the request directly in `approved`.
/// A department manager filing overtime or leave for an employee of a managed
/// department lands it in `manager_approved`; overtime must reach
/// `overtime_min_hours` for that. Filing for themselves only counts when their
/// own department is one they manage.
pub fn apply_filing_stage(
    request: &mut ApprovalRequest,
    filer: &Actor,
    employee_department: &str,
    overtime_min_hours: f64,
    now: DateTime<Utc>,
) -> RequestStatus {
    let profile = &filer.profile;
    let notice = format!("Auto-approved on filing by {}", filer.role_label());

    if profile.is_hr_authority() {
        match request.ladder() {
            StageLadder::ThreeStage => {
                stamp(request, Stamp::Department, filer.id(), now, notice.clone());
                stamp(request, Stamp::Hrd, filer.id(), now, notice);
            }
            StageLadder::TwoStage => stamp(request, Stamp::Final, filer.id(), now, notice),
        }
        request.status = RequestStatus::Approved;
        return request.status;
    }

    if profile.is_department_manager && profile.manages(employee_department) {
        let qualifies = match &request.details.0 {
            RequestDetails::Overtime(d) => d.hours() >= overtime_min_hours,
            RequestDetails::Slvl(_) => true,
            _ => false,
        };
        if qualifies {
            stamp(request, Stamp::Department, filer.id(), now, notice);
            request.status = RequestStatus::ManagerApproved;
        }
    }
    request.status
}
