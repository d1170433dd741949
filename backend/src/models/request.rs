//! Shared request-related enums used by every approval request kind.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
/// Workflow status shared by all request kinds.
///
/// Two-stage kinds never visit `ManagerApproved`.
pub enum RequestStatus {
    #[default]
    Pending,
    ManagerApproved,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn db_value(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::ManagerApproved => "manager_approved",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(RequestStatus::Pending),
            "manager_approved" => Some(RequestStatus::ManagerApproved),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.db_value())
    }
}

/// Number of approval levels a request kind goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageLadder {
    /// `pending -> manager_approved -> approved`, with department and HRD audit fields.
    ThreeStage,
    /// `pending -> approved`, with the single `approved_by/approved_at/remarks` triple.
    TwoStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Overtime,
    /// Sick, vacation, and other leave.
    Slvl,
    Offset,
    TimeSchedule,
    ChangeOffSchedule,
}

impl RequestKind {
    pub const ALL: [RequestKind; 5] = [
        RequestKind::Overtime,
        RequestKind::Slvl,
        RequestKind::Offset,
        RequestKind::TimeSchedule,
        RequestKind::ChangeOffSchedule,
    ];

    pub fn db_value(&self) -> &'static str {
        match self {
            RequestKind::Overtime => "overtime",
            RequestKind::Slvl => "slvl",
            RequestKind::Offset => "offset",
            RequestKind::TimeSchedule => "time_schedule",
            RequestKind::ChangeOffSchedule => "change_off_schedule",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.db_value().eq_ignore_ascii_case(value.trim()))
    }

    pub fn ladder(&self) -> StageLadder {
        match self {
            RequestKind::Overtime | RequestKind::Slvl => StageLadder::ThreeStage,
            RequestKind::Offset | RequestKind::TimeSchedule | RequestKind::ChangeOffSchedule => {
                StageLadder::TwoStage
            }
        }
    }

    /// Human-readable label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::Overtime => "overtime request",
            RequestKind::Slvl => "leave request",
            RequestKind::Offset => "offset request",
            RequestKind::TimeSchedule => "schedule change request",
            RequestKind::ChangeOffSchedule => "day-off change request",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.db_value())
    }
}
