//! In-memory implementation of the storage port.
//!
//! A unit of work takes the store's lock for its whole lifetime and mutates a
//! private copy of the data; the copy replaces the shared state only on commit.
//! This gives the same all-or-nothing and serialization guarantees the Postgres
//! store gets from transactions and row locks.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::AppError;
use crate::models::{
    approval_request::ApprovalRequest,
    employee::{Department, DepartmentManager, Employee},
    leave_bank::{LeaveBank, LeaveBankAdjustment, LeaveType},
    request::{RequestKind, RequestStatus},
    user::User,
};
use crate::repositories::store::{RequestListFilters, RequestScope, Store, UnitOfWork};
use crate::services::leave::ranges_overlap;
use crate::types::{EmployeeId, RequestId, UserId};

type BankKey = (EmployeeId, LeaveType, i32);

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    employees: HashMap<EmployeeId, Employee>,
    departments: HashMap<String, Department>,
    managers: HashMap<String, DepartmentManager>,
    requests: HashMap<RequestId, ApprovalRequest>,
    leave_banks: HashMap<BankKey, LeaveBank>,
    adjustments: Vec<LeaveBankAdjustment>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    writes_until_fault: Arc<StdMutex<Option<usize>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the write after the next `writes` successful ones fail with a
    /// storage error. The fault fires once.
    pub fn fail_after_writes(&self, writes: usize) {
        if let Ok(mut slot) = self.writes_until_fault.lock() {
            *slot = Some(writes);
        }
    }

    pub async fn insert_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }

    pub async fn insert_employee(&self, employee: Employee) {
        self.state
            .lock()
            .await
            .employees
            .insert(employee.id, employee);
    }

    pub async fn insert_department(&self, department: Department) {
        self.state
            .lock()
            .await
            .departments
            .insert(department.name.clone(), department);
    }

    pub async fn assign_manager(&self, assignment: DepartmentManager) {
        self.state
            .lock()
            .await
            .managers
            .insert(assignment.department.clone(), assignment);
    }

    pub async fn request(&self, id: RequestId) -> Option<ApprovalRequest> {
        self.state.lock().await.requests.get(&id).cloned()
    }

    pub async fn requests(&self) -> Vec<ApprovalRequest> {
        let mut rows: Vec<_> = self.state.lock().await.requests.values().cloned().collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        rows
    }

    pub async fn leave_bank(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
    ) -> Option<LeaveBank> {
        self.state
            .lock()
            .await
            .leave_banks
            .get(&(employee_id, leave_type, year))
            .cloned()
    }

    pub async fn put_leave_bank(&self, bank: LeaveBank) {
        self.state
            .lock()
            .await
            .leave_banks
            .insert((bank.employee_id, bank.leave_type, bank.year), bank);
    }

    pub async fn adjustments(&self) -> Vec<LeaveBankAdjustment> {
        self.state.lock().await.adjustments.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnitOfWork {
            guard,
            working,
            writes_until_fault: self.writes_until_fault.clone(),
        })
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    writes_until_fault: Arc<StdMutex<Option<usize>>>,
}

impl MemoryUnitOfWork {
    fn record_write(&self) -> Result<(), AppError> {
        let mut slot = self
            .writes_until_fault
            .lock()
            .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("fault plan poisoned")))?;
        match slot.as_mut() {
            Some(0) => {
                *slot = None;
                Err(AppError::InternalServerError(anyhow::anyhow!(
                    "injected storage fault"
                )))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn in_scope(&self, request: &ApprovalRequest, scope: &RequestScope) -> bool {
        match scope {
            RequestScope::All => true,
            RequestScope::Visible {
                user_id,
                employee_id,
                departments,
            } => {
                request.dept_manager_id == Some(*user_id)
                    || Some(request.employee_id) == *employee_id
                    || self
                        .working
                        .employees
                        .get(&request.employee_id)
                        .is_some_and(|e| departments.contains(&e.department))
            }
        }
    }
}

fn matches_filters(request: &ApprovalRequest, filters: &RequestListFilters) -> bool {
    filters.kind.is_none_or(|kind| request.kind == kind)
        && filters.status.is_none_or(|status| request.status == status)
        && filters
            .employee_id
            .is_none_or(|employee_id| request.employee_id == employee_id)
        && filters.from.is_none_or(|from| request.created_at >= from)
        && filters.to.is_none_or(|to| request.created_at <= to)
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn first_user_id(&mut self) -> Result<Option<UserId>, AppError> {
        Ok(self
            .working
            .users
            .values()
            .min_by_key(|u| (u.created_at, u.id))
            .map(|u| u.id))
    }

    async fn find_employee(&mut self, id: EmployeeId) -> Result<Option<Employee>, AppError> {
        Ok(self.working.employees.get(&id).cloned())
    }

    async fn find_employee_for_update(
        &mut self,
        id: EmployeeId,
    ) -> Result<Option<Employee>, AppError> {
        self.find_employee(id).await
    }

    async fn find_department(&mut self, name: &str) -> Result<Option<Department>, AppError> {
        Ok(self.working.departments.get(name).cloned())
    }

    async fn department_manager(
        &mut self,
        department: &str,
    ) -> Result<Option<DepartmentManager>, AppError> {
        Ok(self.working.managers.get(department).cloned())
    }

    async fn departments_managed_by(
        &mut self,
        manager_id: UserId,
    ) -> Result<Vec<DepartmentManager>, AppError> {
        let mut rows: Vec<_> = self
            .working
            .managers
            .values()
            .filter(|m| m.manager_id == manager_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.department.cmp(&b.department));
        Ok(rows)
    }

    async fn find_request(&mut self, id: RequestId) -> Result<Option<ApprovalRequest>, AppError> {
        Ok(self.working.requests.get(&id).cloned())
    }

    async fn find_request_for_update(
        &mut self,
        id: RequestId,
    ) -> Result<Option<ApprovalRequest>, AppError> {
        Ok(self.working.requests.get(&id).cloned())
    }

    async fn insert_request(&mut self, request: &ApprovalRequest) -> Result<(), AppError> {
        self.record_write()?;
        if self.working.requests.contains_key(&request.id) {
            return Err(AppError::Conflict("Request already exists".into()));
        }
        self.working.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn update_request(&mut self, request: &ApprovalRequest) -> Result<(), AppError> {
        self.record_write()?;
        match self.working.requests.get_mut(&request.id) {
            Some(row) => {
                *row = request.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Request not found".into())),
        }
    }

    async fn delete_pending_request(&mut self, id: RequestId) -> Result<u64, AppError> {
        self.record_write()?;
        let pending = self
            .working
            .requests
            .get(&id)
            .is_some_and(|r| r.status == RequestStatus::Pending);
        if pending {
            self.working.requests.remove(&id);
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn list_requests(
        &mut self,
        filters: &RequestListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ApprovalRequest>, i64), AppError> {
        let mut rows: Vec<_> = self
            .working
            .requests
            .values()
            .filter(|r| matches_filters(r, filters) && self.in_scope(r, &filters.scope))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn overlapping_leave(
        &mut self,
        employee_id: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ApprovalRequest>, AppError> {
        Ok(self
            .working
            .requests
            .values()
            .filter(|r| {
                r.kind == RequestKind::Slvl
                    && r.employee_id == employee_id
                    && r.status != RequestStatus::Rejected
                    && ranges_overlap((r.period_start, r.period_end), (start, end))
            })
            .cloned()
            .collect())
    }

    async fn leave_bank_for_update(
        &mut self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
        default_total: f64,
    ) -> Result<LeaveBank, AppError> {
        let key = (employee_id, leave_type, year);
        if let Some(bank) = self.working.leave_banks.get(&key) {
            return Ok(bank.clone());
        }
        self.record_write()?;
        let bank = LeaveBank::new(employee_id, leave_type, year, default_total);
        self.working.leave_banks.insert(key, bank.clone());
        Ok(bank)
    }

    async fn save_leave_bank(&mut self, bank: &LeaveBank) -> Result<(), AppError> {
        self.record_write()?;
        let mut row = bank.clone();
        row.updated_at = Utc::now();
        self.working
            .leave_banks
            .insert((bank.employee_id, bank.leave_type, bank.year), row);
        Ok(())
    }

    async fn insert_leave_adjustment(
        &mut self,
        adjustment: &LeaveBankAdjustment,
    ) -> Result<(), AppError> {
        self.record_write()?;
        self.working.adjustments.push(adjustment.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        let MemoryUnitOfWork {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        Ok(())
    }
}
