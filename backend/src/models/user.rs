//! Models that represent users and their explicit role grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;

use crate::types::{EmployeeId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of a user account.
pub struct User {
    /// Unique identifier for the user.
    pub id: UserId,
    /// Display name.
    pub name: String,
    pub email: String,
    /// Employee record linked to this account, if any.
    pub employee_id: Option<EmployeeId>,
    pub created_at: DateTime<Utc>,
    /// Explicit grants loaded from `user_roles`.
    #[sqlx(skip)]
    #[serde(default)]
    pub role_grants: Vec<RoleGrant>,
}

impl User {
    /// Constructs a new user without any grants.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            employee_id: None,
            created_at: Utc::now(),
            role_grants: Vec::new(),
        }
    }

    pub fn with_employee(mut self, employee_id: EmployeeId) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn with_grant(mut self, grant: RoleGrant) -> Self {
        if !self.role_grants.contains(&grant) {
            self.role_grants.push(grant);
        }
        self
    }

    pub fn has_grant(&self, grant: RoleGrant) -> bool {
        self.role_grants.contains(&grant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Roles that can be granted explicitly in `user_roles`.
pub enum RoleGrant {
    SuperAdmin,
    HrdManager,
    DepartmentManager,
}

impl RoleGrant {
    /// Returns the canonical representation stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleGrant::SuperAdmin => "superadmin",
            RoleGrant::HrdManager => "hrd_manager",
            RoleGrant::DepartmentManager => "department_manager",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "superadmin" | "super_admin" => Some(RoleGrant::SuperAdmin),
            "hrd_manager" => Some(RoleGrant::HrdManager),
            "department_manager" => Some(RoleGrant::DepartmentManager),
            _ => None,
        }
    }
}

impl Serialize for RoleGrant {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoleGrant {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RoleGrant::parse(&s).ok_or_else(|| {
            serde::de::Error::unknown_variant(
                &s,
                &["superadmin", "hrd_manager", "department_manager"],
            )
        })
    }
}
