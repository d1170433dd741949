//! The approval request record shared by all five request kinds.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use validator::Validate;

use crate::models::leave_bank::LeaveType;
use crate::models::request::{RequestKind, RequestStatus, StageLadder};
use crate::types::{EmployeeId, RequestId, UserId};
use crate::validation::rules;

/// Longest calendar span a single leave request may cover.
pub const MAX_LEAVE_SPAN_DAYS: i64 = 366;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OvertimeDetails {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// An end time earlier than the start time means the shift crosses midnight.
    pub end_time: NaiveTime,
}

impl OvertimeDetails {
    pub fn hours(&self) -> f64 {
        let mut minutes = (self.end_time - self.start_time).num_minutes();
        if minutes < 0 {
            minutes += 24 * 60;
        }
        minutes as f64 / 60.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaveDetails {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub half_day: bool,
    #[serde(default)]
    pub with_pay: bool,
    /// Weekday count computed when the request is filed; client input is ignored.
    #[serde(default)]
    pub total_days: f64,
}

impl LeaveDetails {
    /// Leave bank year the request is charged against.
    pub fn bank_year(&self) -> i32 {
        self.start_date.year()
    }

    /// Whether final approval debits a leave bank.
    pub fn is_banked(&self) -> bool {
        self.with_pay && self.leave_type.is_banked()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OffsetDetails {
    /// Day the extra hours were worked.
    pub work_date: NaiveDate,
    /// Day the hours are taken off.
    pub offset_date: NaiveDate,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleChangeDetails {
    pub effective_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub new_start_time: NaiveTime,
    pub new_end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayOffChangeDetails {
    pub original_date: NaiveDate,
    pub requested_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Kind-specific temporal payload.
pub enum RequestDetails {
    Overtime(OvertimeDetails),
    Slvl(LeaveDetails),
    Offset(OffsetDetails),
    TimeSchedule(ScheduleChangeDetails),
    ChangeOffSchedule(DayOffChangeDetails),
}

impl RequestDetails {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestDetails::Overtime(_) => RequestKind::Overtime,
            RequestDetails::Slvl(_) => RequestKind::Slvl,
            RequestDetails::Offset(_) => RequestKind::Offset,
            RequestDetails::TimeSchedule(_) => RequestKind::TimeSchedule,
            RequestDetails::ChangeOffSchedule(_) => RequestKind::ChangeOffSchedule,
        }
    }

    /// Inclusive date range covered by the request, used for filtering and overlap checks.
    pub fn period(&self) -> (NaiveDate, NaiveDate) {
        match self {
            RequestDetails::Overtime(d) => (d.date, d.date),
            RequestDetails::Slvl(d) => (d.start_date, d.end_date),
            RequestDetails::Offset(d) => ordered(d.work_date, d.offset_date),
            RequestDetails::TimeSchedule(d) => {
                (d.effective_date, d.end_date.unwrap_or(d.effective_date))
            }
            RequestDetails::ChangeOffSchedule(d) => ordered(d.original_date, d.requested_date),
        }
    }

    pub fn as_leave(&self) -> Option<&LeaveDetails> {
        match self {
            RequestDetails::Slvl(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_leave_mut(&mut self) -> Option<&mut LeaveDetails> {
        match self {
            RequestDetails::Slvl(d) => Some(d),
            _ => None,
        }
    }

    /// Checks the payload shape. Leave day counts are checked by the caller once computed.
    pub fn validate_payload(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        match self {
            RequestDetails::Overtime(d) => {
                if d.start_time == d.end_time {
                    errors.push("end_time: must differ from start_time".to_string());
                }
            }
            RequestDetails::Slvl(d) => {
                if d.start_date > d.end_date {
                    errors.push("end_date: must not be before start_date".to_string());
                } else if (d.end_date - d.start_date).num_days() + 1 > MAX_LEAVE_SPAN_DAYS {
                    errors.push(format!(
                        "end_date: leave may span at most {MAX_LEAVE_SPAN_DAYS} days"
                    ));
                }
            }
            RequestDetails::Offset(d) => {
                if let Err(e) = rules::validate_offset_hours(d.hours) {
                    errors.push(format!("hours: {}", e.code));
                }
            }
            RequestDetails::TimeSchedule(d) => {
                if matches!(d.end_date, Some(end) if end < d.effective_date) {
                    errors.push("end_date: must not be before effective_date".to_string());
                }
                if d.new_start_time == d.new_end_time {
                    errors.push("new_end_time: must differ from new_start_time".to_string());
                }
            }
            RequestDetails::ChangeOffSchedule(d) => {
                if d.original_date == d.requested_date {
                    errors.push("requested_date: must differ from original_date".to_string());
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn ordered(a: NaiveDate, b: NaiveDate) -> (NaiveDate, NaiveDate) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApprovalRequest {
    pub id: RequestId,
    pub kind: RequestKind,
    pub employee_id: EmployeeId,
    pub status: RequestStatus,
    pub reason: String,
    pub details: Json<RequestDetails>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub dept_manager_id: Option<UserId>,
    pub dept_approved_by: Option<UserId>,
    pub dept_approved_at: Option<DateTime<Utc>>,
    pub dept_remarks: Option<String>,
    pub hrd_approved_by: Option<UserId>,
    pub hrd_approved_at: Option<DateTime<Utc>>,
    pub hrd_remarks: Option<String>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApprovalRequest {
    pub fn new(
        employee_id: EmployeeId,
        reason: String,
        details: RequestDetails,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        let (period_start, period_end) = details.period();
        Self {
            id: RequestId::new(),
            kind: details.kind(),
            employee_id,
            status: RequestStatus::Pending,
            reason,
            details: Json(details),
            period_start,
            period_end,
            dept_manager_id: None,
            dept_approved_by: None,
            dept_approved_at: None,
            dept_remarks: None,
            hrd_approved_by: None,
            hrd_approved_at: None,
            hrd_remarks: None,
            approved_by: None,
            approved_at: None,
            remarks: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn ladder(&self) -> StageLadder {
        self.kind.ladder()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, RequestStatus::Pending)
    }

    pub fn leave(&self) -> Option<&LeaveDetails> {
        self.details.0.as_leave()
    }

    /// Leave bank charge applied on final approval: `(leave type, year, days)`.
    pub fn leave_debit(&self) -> Option<(LeaveType, i32, f64)> {
        self.leave()
            .filter(|d| d.is_banked() && d.total_days > 0.0)
            .map(|d| (d.leave_type, d.bank_year(), d.total_days))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
/// Payload for filing one request per listed employee.
pub struct NewRequest {
    #[validate(length(min = 1, message = "at least one employee is required"))]
    pub employee_ids: Vec<EmployeeId>,
    #[validate(custom(function = "rules::validate_reason"))]
    pub reason: String,
    pub details: RequestDetails,
}
