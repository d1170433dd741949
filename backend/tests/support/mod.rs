#![allow(dead_code)]
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use hrflow_backend::{
    config::{Config, LeaveOverdraftPolicy},
    models::{
        approval_request::{
            DayOffChangeDetails, LeaveDetails, NewRequest, OvertimeDetails, RequestDetails,
        },
        employee::{Department, DepartmentManager, Employee},
        leave_bank::LeaveType,
        user::{RoleGrant, User},
    },
    repositories::MemoryStore,
    services::{Actor, ApprovalPolicy, ApprovalService},
    state::AppState,
    types::EmployeeId,
    utils::time::{Clock, FixedClock},
};

/// A small organization: two departments with their managers, an HRD
/// manager, a superadmin, and three rank-and-file employees.
pub struct World {
    pub store: MemoryStore,
    pub service: ApprovalService<MemoryStore>,
    pub clock: Arc<dyn Clock>,
    pub admin: User,
    pub hrd: User,
    pub finance_manager: User,
    pub it_manager: User,
    pub alice: User,
    pub alice_employee: Employee,
    pub bob_employee: Employee,
    pub carol: User,
    pub carol_employee: Employee,
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    let at = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
    Arc::new(FixedClock::new(at, chrono_tz::UTC))
}

pub async fn world() -> World {
    world_with(ApprovalPolicy::default()).await
}

pub async fn world_with(policy: ApprovalPolicy) -> World {
    let store = MemoryStore::new();

    store.insert_department(Department::active("Finance")).await;
    store.insert_department(Department::active("IT")).await;
    store.insert_department(Department::inactive("Archive")).await;

    let alice_employee = Employee::new("E-001", "Alice Reyes", "Finance");
    let bob_employee = Employee::new("E-002", "Bob Cruz", "Finance");
    let carol_employee = Employee::new("E-003", "Carol Lim", "IT");
    for employee in [&alice_employee, &bob_employee, &carol_employee] {
        store.insert_employee(employee.clone()).await;
    }

    let admin = User::new("Root", "root@example.com").with_grant(RoleGrant::SuperAdmin);
    let hrd = User::new("Hana", "hana@example.com").with_grant(RoleGrant::HrdManager);
    let finance_manager = User::new("Mara", "mara@example.com");
    let it_manager = User::new("Ivo", "ivo@example.com");
    let alice = User::new("Alice", "alice@example.com").with_employee(alice_employee.id);
    let carol = User::new("Carol", "carol@example.com").with_employee(carol_employee.id);
    for user in [&admin, &hrd, &finance_manager, &it_manager, &alice, &carol] {
        store.insert_user(user.clone()).await;
    }

    store
        .assign_manager(DepartmentManager::new("Finance", finance_manager.id))
        .await;
    store
        .assign_manager(DepartmentManager::new("IT", it_manager.id))
        .await;

    let clock = fixed_clock();
    let service = ApprovalService::new(store.clone(), policy, clock.clone());

    World {
        store,
        service,
        clock,
        admin,
        hrd,
        finance_manager,
        it_manager,
        alice,
        alice_employee,
        bob_employee,
        carol,
        carol_employee,
    }
}

impl World {
    pub async fn actor(&self, user: &User) -> Actor {
        self.service
            .resolve_actor(user.id)
            .await
            .expect("resolve actor")
    }

    /// Router state sharing this world's store and clock.
    pub fn app_state(&self, overdraft: LeaveOverdraftPolicy) -> AppState<MemoryStore> {
        let mut config = Config::from_lookup(|_| None).expect("default config");
        config.leave_overdraft_policy = overdraft;
        AppState::new(self.store.clone(), config, self.clock.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn overtime(employee_ids: Vec<EmployeeId>, hours: u32) -> NewRequest {
    NewRequest {
        employee_ids,
        reason: "Quarter close".into(),
        details: RequestDetails::Overtime(OvertimeDetails {
            date: date(2024, 6, 3),
            start_time: time(17, 0),
            end_time: time(17 + hours, 0),
        }),
    }
}

pub fn leave(
    employee_ids: Vec<EmployeeId>,
    leave_type: LeaveType,
    start: NaiveDate,
    end: NaiveDate,
) -> NewRequest {
    NewRequest {
        employee_ids,
        reason: "Family trip".into(),
        details: RequestDetails::Slvl(LeaveDetails {
            leave_type,
            start_date: start,
            end_date: end,
            half_day: false,
            with_pay: true,
            total_days: 0.0,
        }),
    }
}

pub fn day_off_change(employee_ids: Vec<EmployeeId>) -> NewRequest {
    NewRequest {
        employee_ids,
        reason: "Swap rest day".into(),
        details: RequestDetails::ChangeOffSchedule(DayOffChangeDetails {
            original_date: date(2024, 6, 8),
            requested_date: date(2024, 6, 10),
        }),
    }
}
