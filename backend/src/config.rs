use anyhow::anyhow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{env, net::SocketAddr};

/// What happens when a final approval would push a leave bank past its allotment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeaveOverdraftPolicy {
    /// Refuse the approval with a conflict.
    #[default]
    Block,
    /// Allow the debit and log a warning.
    Warn,
}

impl LeaveOverdraftPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "block" => Some(Self::Block),
            "warn" => Some(Self::Warn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub time_zone: Tz,
    pub leave_default_days: f64,
    pub overtime_manager_min_hours: f64,
    pub leave_overdraft_policy: LeaveOverdraftPolicy,
    pub legacy_role_heuristics: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "postgres://localhost/hrflow".to_string());

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let bind_addr = lookup("BIND_ADDR")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let time_zone_name = lookup("APP_TIMEZONE").unwrap_or_else(|| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let leave_default_days = lookup("LEAVE_DEFAULT_DAYS")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| *v >= 0.0)
            .unwrap_or(15.0);

        let overtime_manager_min_hours = lookup("OVERTIME_MANAGER_MIN_HOURS")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| *v >= 0.0)
            .unwrap_or(4.0);

        let leave_overdraft_policy = lookup("LEAVE_OVERDRAFT_POLICY")
            .and_then(|v| LeaveOverdraftPolicy::parse(&v))
            .unwrap_or_default();

        let legacy_role_heuristics = lookup("LEGACY_ROLE_HEURISTICS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Config {
            database_url,
            database_max_connections,
            bind_addr,
            time_zone,
            leave_default_days,
            overtime_manager_min_hours,
            leave_overdraft_policy,
            legacy_role_heuristics,
        })
    }
}
