//! Resolves the approval authority a user holds.

use serde::{Deserialize, Serialize};

use crate::models::{
    employee::{DepartmentManager, Employee},
    user::{RoleGrant, User},
};
use crate::types::{EmployeeId, UserId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorityProfile {
    pub is_super_admin: bool,
    pub is_hrd_manager: bool,
    pub is_department_manager: bool,
    pub is_employee: bool,
    pub managed_departments: Vec<String>,
    pub employee_id: Option<EmployeeId>,
}

impl AuthorityProfile {
    /// Human readable role used in generated remarks.
    pub fn role_label(&self) -> &'static str {
        if self.is_super_admin {
            "Super Admin"
        } else if self.is_hrd_manager {
            "HRD Manager"
        } else if self.is_department_manager {
            "Department Manager"
        } else {
            "Employee"
        }
    }

    pub fn manages(&self, department: &str) -> bool {
        self.managed_departments.iter().any(|d| d == department)
    }

    /// Second-stage authority.
    pub fn is_hr_authority(&self) -> bool {
        self.is_super_admin || self.is_hrd_manager
    }
}

/// Everything the resolver looks at for one user.
#[derive(Debug, Clone, Copy)]
pub struct RoleInputs<'a> {
    pub user: &'a User,
    pub employee: Option<&'a Employee>,
    pub managed: &'a [DepartmentManager],
    /// Oldest account in the system; consulted only with legacy heuristics.
    pub first_user_id: Option<UserId>,
    pub legacy_heuristics: bool,
}

/// Builds the authority profile. Never fails; an unknown user simply gets an
/// all-false profile.
pub fn resolve_authority(inputs: RoleInputs<'_>) -> AuthorityProfile {
    let user = inputs.user;
    let legacy = inputs.legacy_heuristics;

    let is_super_admin = user.has_grant(RoleGrant::SuperAdmin)
        || (legacy
            && (inputs.first_user_id == Some(user.id)
                || contains_ignore_case(&user.name, "admin")));

    let is_hrd_manager = user.has_grant(RoleGrant::HrdManager)
        || (legacy
            && (contains_ignore_case(&user.name, "hrd")
                || contains_ignore_case(&user.email, "hrd")));

    let managed_departments: Vec<String> = inputs
        .managed
        .iter()
        .filter(|m| m.manager_id == user.id)
        .map(|m| m.department.clone())
        .collect();

    let is_department_manager =
        !managed_departments.is_empty() || user.has_grant(RoleGrant::DepartmentManager);

    AuthorityProfile {
        is_super_admin,
        is_hrd_manager,
        is_department_manager,
        is_employee: inputs.employee.is_some(),
        managed_departments,
        employee_id: inputs.employee.map(|e| e.id).or(user.employee_id),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// The authenticated user performing an operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user: User,
    pub profile: AuthorityProfile,
}

impl Actor {
    pub fn new(user: User, profile: AuthorityProfile) -> Self {
        Self { user, profile }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn role_label(&self) -> &'static str {
        self.profile.role_label()
    }
}
