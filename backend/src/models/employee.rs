//! Employees, departments, and department manager assignments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{EmployeeId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: EmployeeId,
    pub employee_no: String,
    pub full_name: String,
    /// Name of the department the employee currently belongs to.
    pub department: String,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(
        employee_no: impl Into<String>,
        full_name: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            id: EmployeeId::new(),
            employee_no: employee_no.into(),
            full_name: full_name.into(),
            department: department.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub name: String,
    pub is_active: bool,
}

impl Department {
    pub fn active(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_active: true,
        }
    }

    pub fn inactive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_active: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Maps a department to the user responsible for first-level approval.
///
/// A user may manage several departments; each department has at most one manager.
pub struct DepartmentManager {
    pub department: String,
    pub manager_id: UserId,
    pub assigned_at: DateTime<Utc>,
}

impl DepartmentManager {
    pub fn new(department: impl Into<String>, manager_id: UserId) -> Self {
        Self {
            department: department.into(),
            manager_id,
            assigned_at: Utc::now(),
        }
    }
}
