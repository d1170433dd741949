//! Storage port used by the approval core.
//!
//! Every service operation opens exactly one [`UnitOfWork`], performs all of its
//! reads and writes through it, and then commits or rolls back. Reads that
//! precede a mutation go through the `*_for_update` methods so concurrent
//! callers are serialized on the affected rows.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;
use crate::models::{
    approval_request::ApprovalRequest,
    employee::{Department, DepartmentManager, Employee},
    leave_bank::{LeaveBank, LeaveBankAdjustment, LeaveType},
    request::{RequestKind, RequestStatus},
    user::User,
};
use crate::types::{EmployeeId, RequestId, UserId};

/// Rows a caller is allowed to see when listing requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestScope {
    /// No restriction (superadmin, HRD manager).
    #[default]
    All,
    /// Requests assigned to `user_id`, filed for `employee_id`, or filed for an
    /// employee currently in one of `departments`.
    Visible {
        user_id: UserId,
        employee_id: Option<EmployeeId>,
        departments: Vec<String>,
    },
}

/// Filters for querying request lists.
#[derive(Debug, Clone, Default)]
pub struct RequestListFilters {
    pub kind: Option<RequestKind>,
    pub status: Option<RequestStatus>,
    pub employee_id: Option<EmployeeId>,
    /// Filter requests created from this timestamp (inclusive)
    pub from: Option<DateTime<Utc>>,
    /// Filter requests created until this timestamp (inclusive)
    pub to: Option<DateTime<Utc>>,
    pub scope: RequestScope,
}

/// Opens units of work against a backing store.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Tx: UnitOfWork;

    async fn begin(&self) -> Result<Self::Tx, AppError>;
}

/// One transaction's worth of reads and writes.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] discards
/// every write made through it.
#[async_trait]
pub trait UnitOfWork: Send + 'static {
    /// Loads a user together with its explicit role grants.
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, AppError>;

    /// Id of the oldest account, used only by the legacy role heuristics.
    async fn first_user_id(&mut self) -> Result<Option<UserId>, AppError>;

    async fn find_employee(&mut self, id: EmployeeId) -> Result<Option<Employee>, AppError>;

    /// Loads an employee and locks the row until the unit of work ends.
    /// Concurrent filings for the same employee queue behind this lock.
    async fn find_employee_for_update(
        &mut self,
        id: EmployeeId,
    ) -> Result<Option<Employee>, AppError>;

    async fn find_department(&mut self, name: &str) -> Result<Option<Department>, AppError>;

    async fn department_manager(
        &mut self,
        department: &str,
    ) -> Result<Option<DepartmentManager>, AppError>;

    async fn departments_managed_by(
        &mut self,
        manager_id: UserId,
    ) -> Result<Vec<DepartmentManager>, AppError>;

    async fn find_request(&mut self, id: RequestId) -> Result<Option<ApprovalRequest>, AppError>;

    /// Loads a request and locks it until the unit of work ends.
    async fn find_request_for_update(
        &mut self,
        id: RequestId,
    ) -> Result<Option<ApprovalRequest>, AppError>;

    async fn insert_request(&mut self, request: &ApprovalRequest) -> Result<(), AppError>;

    async fn update_request(&mut self, request: &ApprovalRequest) -> Result<(), AppError>;

    /// Deletes a request only while it is still pending; returns the affected row count.
    async fn delete_pending_request(&mut self, id: RequestId) -> Result<u64, AppError>;

    async fn list_requests(
        &mut self,
        filters: &RequestListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ApprovalRequest>, i64), AppError>;

    /// Non-rejected leave requests of `employee_id` whose inclusive range meets `[start, end]`.
    async fn overlapping_leave(
        &mut self,
        employee_id: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ApprovalRequest>, AppError>;

    /// Returns the leave bank row, creating it with `default_total` days if absent,
    /// and locks it until the unit of work ends.
    async fn leave_bank_for_update(
        &mut self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
        default_total: f64,
    ) -> Result<LeaveBank, AppError>;

    async fn save_leave_bank(&mut self, bank: &LeaveBank) -> Result<(), AppError>;

    async fn insert_leave_adjustment(
        &mut self,
        adjustment: &LeaveBankAdjustment,
    ) -> Result<(), AppError>;

    async fn commit(self) -> Result<(), AppError>;

    async fn rollback(self) -> Result<(), AppError>;
}
