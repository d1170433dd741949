//! Leave bank ledger rows and their API views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{AdjustmentId, EmployeeId, LeaveBankId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Sick,
    Vacation,
    Emergency,
    Bereavement,
    Other,
}

impl LeaveType {
    pub fn db_value(&self) -> &'static str {
        match self {
            LeaveType::Sick => "sick",
            LeaveType::Vacation => "vacation",
            LeaveType::Emergency => "emergency",
            LeaveType::Bereavement => "bereavement",
            LeaveType::Other => "other",
        }
    }

    /// Only sick and vacation leave are tracked in a leave bank.
    pub fn is_banked(&self) -> bool {
        matches!(self, LeaveType::Sick | LeaveType::Vacation)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Annual allotment for one employee and one banked leave type.
pub struct LeaveBank {
    pub id: LeaveBankId,
    pub employee_id: EmployeeId,
    pub leave_type: LeaveType,
    pub year: i32,
    pub total_days: f64,
    pub used_days: f64,
    pub updated_at: DateTime<Utc>,
}

impl LeaveBank {
    pub fn new(employee_id: EmployeeId, leave_type: LeaveType, year: i32, total_days: f64) -> Self {
        Self {
            id: LeaveBankId::new(),
            employee_id,
            leave_type,
            year,
            total_days,
            used_days: 0.0,
            updated_at: Utc::now(),
        }
    }

    pub fn remaining(&self) -> f64 {
        self.total_days - self.used_days
    }

    pub fn can_cover(&self, days: f64) -> bool {
        days <= self.remaining()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Audit entry written for each administrative credit.
pub struct LeaveBankAdjustment {
    pub id: AdjustmentId,
    pub employee_id: EmployeeId,
    pub leave_type: LeaveType,
    pub year: i32,
    pub days: f64,
    pub reason: String,
    pub adjusted_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub total: f64,
    pub used: f64,
    pub remaining: f64,
}

impl From<&LeaveBank> for LeaveBalance {
    fn from(bank: &LeaveBank) -> Self {
        Self {
            total: bank.total_days,
            used: bank.used_days,
            remaining: bank.remaining(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveBankSummary {
    pub employee_id: EmployeeId,
    pub year: i32,
    pub sick: LeaveBalance,
    pub vacation: LeaveBalance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Payload for an administrative leave credit.
pub struct LeaveCredit {
    pub leave_type: LeaveType,
    pub days: f64,
    pub reason: String,
}
