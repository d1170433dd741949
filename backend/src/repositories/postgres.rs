//! PostgreSQL implementation of the storage port.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::error::AppError;
use crate::models::{
    approval_request::ApprovalRequest,
    employee::{Department, DepartmentManager, Employee},
    leave_bank::{LeaveBank, LeaveBankAdjustment, LeaveType},
    user::{RoleGrant, User},
};
use crate::repositories::store::{RequestListFilters, RequestScope, Store, UnitOfWork};
use crate::types::{EmployeeId, RequestId, UserId};

const REQUEST_COLUMNS: &str = "id, kind, employee_id, status, reason, details, period_start, \
    period_end, dept_manager_id, dept_approved_by, dept_approved_at, dept_remarks, \
    hrd_approved_by, hrd_approved_at, hrd_remarks, approved_by, approved_at, remarks, \
    created_by, created_at, updated_at";

const LEAVE_BANK_COLUMNS: &str =
    "id, employee_id, leave_type, year, total_days, used_days, updated_at";

fn db_error(e: sqlx::Error) -> AppError {
    AppError::InternalServerError(e.into())
}

/// Appends WHERE or AND to the query builder depending on whether a clause has already been added.
fn push_clause(builder: &mut QueryBuilder<'_, Postgres>, has_clause: &mut bool) {
    if *has_clause {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_clause = true;
    }
}

fn apply_request_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &RequestListFilters) {
    let mut has_clause = false;
    if let Some(kind) = filters.kind {
        push_clause(builder, &mut has_clause);
        builder.push("kind = ").push_bind(kind.db_value());
    }
    if let Some(status) = filters.status {
        push_clause(builder, &mut has_clause);
        builder.push("status = ").push_bind(status.db_value());
    }
    if let Some(employee_id) = filters.employee_id {
        push_clause(builder, &mut has_clause);
        builder.push("employee_id = ").push_bind(employee_id);
    }
    if let Some(from) = filters.from {
        push_clause(builder, &mut has_clause);
        builder.push("created_at >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        push_clause(builder, &mut has_clause);
        builder.push("created_at <= ").push_bind(to);
    }
    if let RequestScope::Visible {
        user_id,
        employee_id,
        departments,
    } = &filters.scope
    {
        push_clause(builder, &mut has_clause);
        builder
            .push("(dept_manager_id = ")
            .push_bind(*user_id)
            .push(" OR employee_id = ")
            .push_bind(*employee_id)
            .push(" OR employee_id IN (SELECT id FROM employees WHERE department = ANY(")
            .push_bind(departments.clone())
            .push(")))");
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx, AppError> {
        let tx = self.pool.begin().await.map_err(db_error)?;
        Ok(PgUnitOfWork { tx })
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, employee_id, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)?;

        let Some(mut user) = user else {
            return Ok(None);
        };

        let roles: Vec<String> =
            sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role")
                .bind(id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(db_error)?;
        for role in roles {
            match RoleGrant::parse(&role) {
                Some(grant) => user = user.with_grant(grant),
                None => tracing::warn!(user_id = %id, role = %role, "Ignoring unknown role grant"),
            }
        }
        Ok(Some(user))
    }

    async fn first_user_id(&mut self) -> Result<Option<UserId>, AppError> {
        sqlx::query_scalar("SELECT id FROM users ORDER BY created_at, id LIMIT 1")
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)
    }

    async fn find_employee(&mut self, id: EmployeeId) -> Result<Option<Employee>, AppError> {
        sqlx::query_as::<_, Employee>(
            "SELECT id, employee_no, full_name, department, created_at FROM employees WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)
    }

    async fn find_employee_for_update(
        &mut self,
        id: EmployeeId,
    ) -> Result<Option<Employee>, AppError> {
        sqlx::query_as::<_, Employee>(
            "SELECT id, employee_no, full_name, department, created_at FROM employees \
             WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)
    }

    async fn find_department(&mut self, name: &str) -> Result<Option<Department>, AppError> {
        sqlx::query_as::<_, Department>("SELECT name, is_active FROM departments WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)
    }

    async fn department_manager(
        &mut self,
        department: &str,
    ) -> Result<Option<DepartmentManager>, AppError> {
        sqlx::query_as::<_, DepartmentManager>(
            "SELECT department, manager_id, assigned_at FROM department_managers WHERE department = $1",
        )
        .bind(department)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)
    }

    async fn departments_managed_by(
        &mut self,
        manager_id: UserId,
    ) -> Result<Vec<DepartmentManager>, AppError> {
        sqlx::query_as::<_, DepartmentManager>(
            "SELECT department, manager_id, assigned_at FROM department_managers \
             WHERE manager_id = $1 ORDER BY department",
        )
        .bind(manager_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error)
    }

    async fn find_request(&mut self, id: RequestId) -> Result<Option<ApprovalRequest>, AppError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM approval_requests WHERE id = $1");
        sqlx::query_as::<_, ApprovalRequest>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)
    }

    async fn find_request_for_update(
        &mut self,
        id: RequestId,
    ) -> Result<Option<ApprovalRequest>, AppError> {
        let sql =
            format!("SELECT {REQUEST_COLUMNS} FROM approval_requests WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ApprovalRequest>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)
    }

    async fn insert_request(&mut self, request: &ApprovalRequest) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO approval_requests (id, kind, employee_id, status, reason, details, \
             period_start, period_end, dept_manager_id, dept_approved_by, dept_approved_at, \
             dept_remarks, hrd_approved_by, hrd_approved_at, hrd_remarks, approved_by, \
             approved_at, remarks, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21)",
        )
        .bind(request.id)
        .bind(request.kind.db_value())
        .bind(request.employee_id)
        .bind(request.status.db_value())
        .bind(&request.reason)
        .bind(&request.details)
        .bind(request.period_start)
        .bind(request.period_end)
        .bind(request.dept_manager_id)
        .bind(request.dept_approved_by)
        .bind(request.dept_approved_at)
        .bind(&request.dept_remarks)
        .bind(request.hrd_approved_by)
        .bind(request.hrd_approved_at)
        .bind(&request.hrd_remarks)
        .bind(request.approved_by)
        .bind(request.approved_at)
        .bind(&request.remarks)
        .bind(request.created_by)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn update_request(&mut self, request: &ApprovalRequest) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE approval_requests SET status = $2, details = $3, dept_approved_by = $4, \
             dept_approved_at = $5, dept_remarks = $6, hrd_approved_by = $7, \
             hrd_approved_at = $8, hrd_remarks = $9, approved_by = $10, approved_at = $11, \
             remarks = $12, updated_at = $13 WHERE id = $1",
        )
        .bind(request.id)
        .bind(request.status.db_value())
        .bind(&request.details)
        .bind(request.dept_approved_by)
        .bind(request.dept_approved_at)
        .bind(&request.dept_remarks)
        .bind(request.hrd_approved_by)
        .bind(request.hrd_approved_at)
        .bind(&request.hrd_remarks)
        .bind(request.approved_by)
        .bind(request.approved_at)
        .bind(&request.remarks)
        .bind(request.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Request not found".into()));
        }
        Ok(())
    }

    async fn delete_pending_request(&mut self, id: RequestId) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM approval_requests WHERE id = $1 AND status = 'pending'")
                .bind(id)
                .execute(&mut *self.tx)
                .await
                .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn list_requests(
        &mut self,
        filters: &RequestListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ApprovalRequest>, i64), AppError> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM approval_requests");
        apply_request_filters(&mut count_builder, filters);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error)?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {REQUEST_COLUMNS} FROM approval_requests"));
        apply_request_filters(&mut builder, filters);
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = builder
            .build_query_as::<ApprovalRequest>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error)?;

        Ok((rows, total))
    }

    async fn overlapping_leave(
        &mut self,
        employee_id: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ApprovalRequest>, AppError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM approval_requests \
             WHERE kind = 'slvl' AND employee_id = $1 AND status <> 'rejected' \
             AND period_start <= $3 AND period_end >= $2"
        );
        sqlx::query_as::<_, ApprovalRequest>(&sql)
            .bind(employee_id)
            .bind(start)
            .bind(end)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error)
    }

    async fn leave_bank_for_update(
        &mut self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
        default_total: f64,
    ) -> Result<LeaveBank, AppError> {
        let fresh = LeaveBank::new(employee_id, leave_type, year, default_total);
        sqlx::query(
            "INSERT INTO leave_banks (id, employee_id, leave_type, year, total_days, used_days, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (employee_id, leave_type, year) DO NOTHING",
        )
        .bind(fresh.id)
        .bind(employee_id)
        .bind(leave_type.db_value())
        .bind(year)
        .bind(fresh.total_days)
        .bind(fresh.used_days)
        .bind(fresh.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;

        let sql = format!(
            "SELECT {LEAVE_BANK_COLUMNS} FROM leave_banks \
             WHERE employee_id = $1 AND leave_type = $2 AND year = $3 FOR UPDATE"
        );
        sqlx::query_as::<_, LeaveBank>(&sql)
            .bind(employee_id)
            .bind(leave_type.db_value())
            .bind(year)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error)
    }

    async fn save_leave_bank(&mut self, bank: &LeaveBank) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE leave_banks SET total_days = $2, used_days = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(bank.id)
        .bind(bank.total_days)
        .bind(bank.used_days)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn insert_leave_adjustment(
        &mut self,
        adjustment: &LeaveBankAdjustment,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO leave_bank_adjustments (id, employee_id, leave_type, year, days, reason, adjusted_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(adjustment.id)
        .bind(adjustment.employee_id)
        .bind(adjustment.leave_type.db_value())
        .bind(adjustment.year)
        .bind(adjustment.days)
        .bind(&adjustment.reason)
        .bind(adjustment.adjusted_by)
        .bind(adjustment.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await.map_err(db_error)
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await.map_err(db_error)
    }
}
