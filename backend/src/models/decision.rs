//! Payloads and reports for approval decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    approval_request::ApprovalRequest,
    request::{RequestKind, RequestStatus},
    PaginationQuery,
};
use crate::types::{EmployeeId, RequestId};
use crate::validation::rules;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatusUpdate {
    pub status: RequestStatus,
    #[validate(custom(function = "rules::validate_remarks"))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkStatusUpdate {
    #[validate(length(min = 1, message = "at least one request id is required"))]
    pub request_ids: Vec<RequestId>,
    pub status: RequestStatus,
    #[validate(custom(function = "rules::validate_remarks"))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForceApproval {
    #[validate(length(min = 1, message = "at least one request id is required"))]
    pub request_ids: Vec<RequestId>,
    #[validate(custom(function = "rules::validate_remarks"))]
    pub remarks: Option<String>,
}

/// Accounting returned by bulk and force-approval operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub success_count: usize,
    pub fail_count: usize,
    pub errors: Vec<String>,
}

impl BulkOutcome {
    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, id: RequestId, reason: impl std::fmt::Display) {
        self.fail_count += 1;
        self.errors.push(format!("Request {id}: {reason}"));
    }
}

/// One employee a filing could not be created for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedFiling {
    pub employee_id: EmployeeId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOutcome {
    pub created: Vec<ApprovalRequest>,
    pub rejected: Vec<RejectedFiling>,
}

/// Query string of `GET /api/requests`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestListQuery {
    pub kind: Option<RequestKind>,
    pub status: Option<RequestStatus>,
    pub employee_id: Option<EmployeeId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl RequestListQuery {
    pub fn pagination(&self) -> PaginationQuery {
        let defaults = PaginationQuery::default();
        PaginationQuery {
            limit: self.limit.unwrap_or(defaults.limit),
            offset: self.offset.unwrap_or(defaults.offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_outcome_formats_item_errors() {
        let mut outcome = BulkOutcome::default();
        let id = RequestId::new();
        outcome.record_success();
        outcome.record_failure(id, "Request is already approved");
        assert_eq!(outcome.success_count, 1);
        assert_eq!(outcome.fail_count, 1);
        assert_eq!(
            outcome.errors,
            vec![format!("Request {id}: Request is already approved")]
        );
    }

    #[test]
    fn pagination_is_clamped() {
        let query = RequestListQuery {
            limit: Some(10_000),
            offset: Some(-5),
            ..Default::default()
        };
        let page = query.pagination();
        assert_eq!(page.limit(), 500);
        assert_eq!(page.offset(), 0);
        assert_eq!(RequestListQuery::default().pagination().limit(), 50);
    }

    #[test]
    fn remarks_length_is_validated() {
        let update = StatusUpdate {
            status: RequestStatus::Approved,
            remarks: Some("x".repeat(501)),
        };
        assert!(update.validate().is_err());
        let bulk = BulkStatusUpdate {
            request_ids: vec![],
            status: RequestStatus::Approved,
            remarks: None,
        };
        assert!(bulk.validate().is_err());
    }
}
