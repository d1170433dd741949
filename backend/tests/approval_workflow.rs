use hrflow_backend::{
    config::LeaveOverdraftPolicy,
    error::AppError,
    models::{
        decision::RequestListQuery,
        employee::Employee,
        leave_bank::{LeaveBank, LeaveCredit, LeaveType},
        request::RequestStatus,
    },
    services::ApprovalPolicy,
    types::EmployeeId,
    utils::time::Clock,
};

#[path = "support/mod.rs"]
mod support;

use support::{date, day_off_change, leave, overtime, world, world_with};

#[tokio::test]
async fn overtime_moves_through_department_and_hrd_stages() {
    let w = world().await;
    let alice = w.actor(&w.alice).await;
    let manager = w.actor(&w.finance_manager).await;
    let outsider = w.actor(&w.it_manager).await;
    let hrd = w.actor(&w.hrd).await;

    let outcome = w
        .service
        .create_request(overtime(vec![w.alice_employee.id], 4), &alice)
        .await
        .unwrap();
    assert!(outcome.rejected.is_empty());
    let filed = &outcome.created[0];
    assert_eq!(filed.status, RequestStatus::Pending);
    assert_eq!(filed.dept_manager_id, Some(w.finance_manager.id));

    let staged = w
        .service
        .transition(filed.id, RequestStatus::ManagerApproved, None, &manager)
        .await
        .unwrap();
    assert_eq!(staged.status, RequestStatus::ManagerApproved);
    assert_eq!(staged.dept_approved_by, Some(w.finance_manager.id));

    let err = w
        .service
        .transition(filed.id, RequestStatus::ManagerApproved, None, &outsider)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = w
        .service
        .transition(filed.id, RequestStatus::Approved, None, &outsider)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let unchanged = w.store.request(filed.id).await.unwrap();
    assert_eq!(unchanged.status, RequestStatus::ManagerApproved);
    assert!(unchanged.hrd_approved_by.is_none());

    let approved = w
        .service
        .transition(filed.id, RequestStatus::Approved, Some("Budget ok"), &hrd)
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.hrd_approved_by, Some(w.hrd.id));
    assert_eq!(approved.hrd_remarks.as_deref(), Some("Budget ok"));
    assert_eq!(approved.hrd_approved_at, Some(w.clock.now()));
}

#[tokio::test]
async fn overlapping_leave_is_refused_until_rejected() {
    let w = world().await;
    let alice = w.actor(&w.alice).await;
    let manager = w.actor(&w.finance_manager).await;

    let first = w
        .service
        .create_request(
            leave(
                vec![w.alice_employee.id],
                LeaveType::Vacation,
                date(2024, 6, 10),
                date(2024, 6, 14),
            ),
            &alice,
        )
        .await
        .unwrap();
    let first = first.created[0].clone();
    assert_eq!(first.leave().unwrap().total_days, 5.0);

    let second = w
        .service
        .create_request(
            leave(
                vec![w.alice_employee.id],
                LeaveType::Sick,
                date(2024, 6, 14),
                date(2024, 6, 18),
            ),
            &alice,
        )
        .await
        .unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.rejected.len(), 1);
    assert!(second.rejected[0].reason.contains("overlaps"));

    w.service
        .transition(first.id, RequestStatus::Rejected, Some("Peak season"), &manager)
        .await
        .unwrap();

    let retry = w
        .service
        .create_request(
            leave(
                vec![w.alice_employee.id],
                LeaveType::Sick,
                date(2024, 6, 14),
                date(2024, 6, 18),
            ),
            &alice,
        )
        .await
        .unwrap();
    assert_eq!(retry.created.len(), 1);
}

#[tokio::test]
async fn leave_bank_is_debited_exactly_once() {
    let w = world().await;
    let alice = w.actor(&w.alice).await;
    let manager = w.actor(&w.finance_manager).await;
    let hrd = w.actor(&w.hrd).await;

    let filed = w
        .service
        .create_request(
            leave(
                vec![w.alice_employee.id],
                LeaveType::Vacation,
                date(2024, 6, 10),
                date(2024, 6, 14),
            ),
            &alice,
        )
        .await
        .unwrap()
        .created[0]
        .clone();
    w.service
        .transition(filed.id, RequestStatus::ManagerApproved, None, &manager)
        .await
        .unwrap();

    let outcome = w
        .service
        .bulk_transition(&[filed.id, filed.id], RequestStatus::Approved, None, &hrd)
        .await
        .unwrap();
    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.fail_count, 1);
    assert!(outcome.errors[0].contains("already approved"));

    let bank = w
        .store
        .leave_bank(w.alice_employee.id, LeaveType::Vacation, 2024)
        .await
        .unwrap();
    assert_eq!(bank.used_days, 5.0);

    let err = w
        .service
        .transition(filed.id, RequestStatus::Approved, None, &hrd)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let bank = w
        .store
        .leave_bank(w.alice_employee.id, LeaveType::Vacation, 2024)
        .await
        .unwrap();
    assert_eq!(bank.used_days, 5.0);
}

#[tokio::test]
async fn insufficient_balance_refuses_filing() {
    let w = world().await;
    let alice = w.actor(&w.alice).await;
    w.store
        .put_leave_bank(LeaveBank::new(w.alice_employee.id, LeaveType::Sick, 2024, 2.0))
        .await;

    let outcome = w
        .service
        .create_request(
            leave(
                vec![w.alice_employee.id],
                LeaveType::Sick,
                date(2024, 6, 10),
                date(2024, 6, 12),
            ),
            &alice,
        )
        .await
        .unwrap();
    assert!(outcome.created.is_empty());
    assert!(outcome.rejected[0].reason.contains("Insufficient sick leave balance"));
}

async fn drain_bank_then_approve(policy: LeaveOverdraftPolicy) -> (Result<(), AppError>, f64) {
    let w = world_with(ApprovalPolicy {
        overdraft: policy,
        ..ApprovalPolicy::default()
    })
    .await;
    let alice = w.actor(&w.alice).await;
    let manager = w.actor(&w.finance_manager).await;
    let hrd = w.actor(&w.hrd).await;

    let filed = w
        .service
        .create_request(
            leave(
                vec![w.alice_employee.id],
                LeaveType::Vacation,
                date(2024, 6, 10),
                date(2024, 6, 14),
            ),
            &alice,
        )
        .await
        .unwrap()
        .created[0]
        .clone();
    w.service
        .transition(filed.id, RequestStatus::ManagerApproved, None, &manager)
        .await
        .unwrap();

    let mut bank = w
        .store
        .leave_bank(w.alice_employee.id, LeaveType::Vacation, 2024)
        .await
        .unwrap();
    bank.used_days = 12.0;
    w.store.put_leave_bank(bank).await;

    let result = w
        .service
        .transition(filed.id, RequestStatus::Approved, None, &hrd)
        .await
        .map(|_| ());
    let used = w
        .store
        .leave_bank(w.alice_employee.id, LeaveType::Vacation, 2024)
        .await
        .unwrap()
        .used_days;
    (result, used)
}

#[tokio::test]
async fn overdraft_is_blocked_by_default() {
    let (result, used) = drain_bank_then_approve(LeaveOverdraftPolicy::Block).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(used, 12.0);
}

#[tokio::test]
async fn overdraft_is_allowed_under_warn_policy() {
    let (result, used) = drain_bank_then_approve(LeaveOverdraftPolicy::Warn).await;
    assert!(result.is_ok());
    assert_eq!(used, 17.0);
}

#[tokio::test]
async fn force_approve_backfills_and_reports_already_approved() {
    let w = world().await;
    let alice = w.actor(&w.alice).await;
    let admin = w.actor(&w.admin).await;
    let hrd = w.actor(&w.hrd).await;

    let pending = w
        .service
        .create_request(overtime(vec![w.alice_employee.id], 5), &alice)
        .await
        .unwrap()
        .created[0]
        .clone();
    let approved = w
        .service
        .create_request(day_off_change(vec![w.bob_employee.id]), &hrd)
        .await
        .unwrap()
        .created[0]
        .clone();
    assert_eq!(approved.status, RequestStatus::Approved);

    let err = w
        .service
        .force_approve(&[pending.id], None, &hrd)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let outcome = w
        .service
        .force_approve(&[pending.id, approved.id], Some("Payroll cutoff"), &admin)
        .await
        .unwrap();
    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.fail_count, 1);
    assert_eq!(
        outcome.errors,
        vec![format!("Request {}: Request is already approved", approved.id)]
    );

    let forced = w.store.request(pending.id).await.unwrap();
    assert_eq!(forced.status, RequestStatus::Approved);
    assert_eq!(forced.dept_approved_by, Some(w.admin.id));
    assert_eq!(
        forced.dept_remarks.as_deref(),
        Some("Administrative override: Payroll cutoff")
    );
    assert_eq!(forced.hrd_approved_by, Some(w.admin.id));

    let untouched = w.store.request(approved.id).await.unwrap();
    assert_eq!(untouched.approved_by, Some(w.hrd.id));
}

#[tokio::test]
async fn filing_role_decides_initial_stage() {
    let w = world().await;
    let manager = w.actor(&w.finance_manager).await;
    let hrd = w.actor(&w.hrd).await;

    let long = w
        .service
        .create_request(overtime(vec![w.bob_employee.id], 4), &manager)
        .await
        .unwrap();
    assert_eq!(long.created[0].status, RequestStatus::ManagerApproved);
    assert_eq!(long.created[0].dept_approved_by, Some(w.finance_manager.id));

    let short = w
        .service
        .create_request(overtime(vec![w.alice_employee.id], 2), &manager)
        .await
        .unwrap();
    assert_eq!(short.created[0].status, RequestStatus::Pending);

    let by_hrd = w
        .service
        .create_request(day_off_change(vec![w.carol_employee.id]), &hrd)
        .await
        .unwrap();
    let request = &by_hrd.created[0];
    assert_eq!(request.status, RequestStatus::Approved);
    assert_eq!(request.approved_by, Some(w.hrd.id));
    assert_eq!(
        request.remarks.as_deref(),
        Some("Auto-approved on filing by HRD Manager")
    );

    let paid_leave = w
        .service
        .create_request(
            leave(
                vec![w.carol_employee.id],
                LeaveType::Sick,
                date(2024, 6, 3),
                date(2024, 6, 4),
            ),
            &hrd,
        )
        .await
        .unwrap();
    assert_eq!(paid_leave.created[0].status, RequestStatus::Approved);
    let bank = w
        .store
        .leave_bank(w.carol_employee.id, LeaveType::Sick, 2024)
        .await
        .unwrap();
    assert_eq!(bank.used_days, 2.0);
}

#[tokio::test]
async fn manager_filing_for_themselves_outside_managed_department_stays_pending() {
    let w = world().await;
    let ivo_employee = Employee::new("E-004", "Ivo Santos", "Finance");
    w.store.insert_employee(ivo_employee.clone()).await;
    let it_manager = w.it_manager.clone().with_employee(ivo_employee.id);
    w.store.insert_user(it_manager.clone()).await;
    let manager = w.actor(&it_manager).await;

    let outcome = w
        .service
        .create_request(overtime(vec![ivo_employee.id], 5), &manager)
        .await
        .unwrap();
    let request = &outcome.created[0];
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(request.dept_approved_by.is_none());
    assert_eq!(request.dept_manager_id, Some(w.finance_manager.id));

    let own_leave = w
        .service
        .create_request(
            leave(
                vec![ivo_employee.id],
                LeaveType::Vacation,
                date(2024, 7, 1),
                date(2024, 7, 2),
            ),
            &manager,
        )
        .await
        .unwrap();
    assert_eq!(own_leave.created[0].status, RequestStatus::Pending);

    let finance = w.actor(&w.finance_manager).await;
    let approved = w
        .service
        .transition(request.id, RequestStatus::ManagerApproved, None, &finance)
        .await
        .unwrap();
    assert_eq!(approved.dept_approved_by, Some(w.finance_manager.id));
}

#[tokio::test]
async fn filing_rejects_items_individually() {
    let w = world().await;
    let carol = w.actor(&w.carol).await;
    let hrd = w.actor(&w.hrd).await;

    let outcome = w
        .service
        .create_request(
            overtime(vec![w.carol_employee.id, w.alice_employee.id], 3),
            &carol,
        )
        .await
        .unwrap();
    assert_eq!(outcome.created.len(), 1);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].employee_id, w.alice_employee.id);

    let archived = Employee::new("E-900", "Old Timer", "Archive");
    w.store.insert_employee(archived.clone()).await;
    let outcome = w
        .service
        .create_request(
            leave(
                vec![archived.id, EmployeeId::new()],
                LeaveType::Vacation,
                date(2024, 7, 1),
                date(2024, 7, 2),
            ),
            &hrd,
        )
        .await
        .unwrap();
    assert!(outcome.created.is_empty());
    assert!(outcome.rejected[0].reason.contains("inactive"));
    assert_eq!(outcome.rejected[1].reason, "Employee not found");
}

#[tokio::test]
async fn invalid_payloads_fail_before_any_write() {
    let w = world().await;
    let alice = w.actor(&w.alice).await;

    let mut blank = overtime(vec![w.alice_employee.id], 4);
    blank.reason = "   ".into();
    let err = w.service.create_request(blank, &alice).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let weekend = leave(
        vec![w.alice_employee.id],
        LeaveType::Vacation,
        date(2024, 6, 8),
        date(2024, 6, 9),
    );
    let err = w.service.create_request(weekend, &alice).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(w.store.requests().await.is_empty());
}

#[tokio::test]
async fn only_pending_requests_can_be_deleted() {
    let w = world().await;
    let alice = w.actor(&w.alice).await;
    let carol = w.actor(&w.carol).await;
    let manager = w.actor(&w.finance_manager).await;

    let first = w
        .service
        .create_request(overtime(vec![w.alice_employee.id], 2), &alice)
        .await
        .unwrap()
        .created[0]
        .clone();
    let err = w.service.delete_request(first.id, &carol).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    w.service.delete_request(first.id, &alice).await.unwrap();
    assert!(w.store.request(first.id).await.is_none());

    let second = w
        .service
        .create_request(overtime(vec![w.alice_employee.id], 2), &alice)
        .await
        .unwrap()
        .created[0]
        .clone();
    w.service
        .transition(second.id, RequestStatus::ManagerApproved, None, &manager)
        .await
        .unwrap();
    let err = w.service.delete_request(second.id, &alice).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn listing_is_scoped_to_the_caller() {
    let w = world().await;
    let hrd = w.actor(&w.hrd).await;
    w.service
        .create_request(
            overtime(
                vec![
                    w.alice_employee.id,
                    w.bob_employee.id,
                    w.carol_employee.id,
                ],
                2,
            ),
            &hrd,
        )
        .await
        .unwrap();

    let all = w
        .service
        .list_requests(RequestListQuery::default(), &hrd)
        .await
        .unwrap();
    assert_eq!(all.total, 3);

    let manager = w.actor(&w.finance_manager).await;
    let finance = w
        .service
        .list_requests(RequestListQuery::default(), &manager)
        .await
        .unwrap();
    assert_eq!(finance.total, 2);

    let alice = w.actor(&w.alice).await;
    let own = w
        .service
        .list_requests(RequestListQuery::default(), &alice)
        .await
        .unwrap();
    assert_eq!(own.total, 1);
    assert_eq!(own.data[0].employee_id, w.alice_employee.id);

    let paged = w
        .service
        .list_requests(
            RequestListQuery {
                limit: Some(1),
                status: Some(RequestStatus::Approved),
                ..Default::default()
            },
            &hrd,
        )
        .await
        .unwrap();
    assert_eq!(paged.total, 3);
    assert_eq!(paged.data.len(), 1);

    let carol = w.actor(&w.carol).await;
    let alices = own.data[0].id;
    let err = w.service.get_request(alices, &carol).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(w.service.get_request(alices, &manager).await.is_ok());
}

#[tokio::test]
async fn leave_bank_credit_is_restricted_and_audited() {
    let w = world().await;
    let hrd = w.actor(&w.hrd).await;
    let alice = w.actor(&w.alice).await;

    let summary = w
        .service
        .get_leave_bank(w.alice_employee.id, None, &alice)
        .await
        .unwrap();
    assert_eq!(summary.year, 2024);
    assert_eq!(summary.sick.total, 15.0);
    assert_eq!(summary.vacation.remaining, 15.0);

    let credit = LeaveCredit {
        leave_type: LeaveType::Vacation,
        days: 2.5,
        reason: "Service award".into(),
    };
    let err = w
        .service
        .add_leave_bank_days(w.alice_employee.id, credit.clone(), &alice)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let bank = w
        .service
        .add_leave_bank_days(w.alice_employee.id, credit, &hrd)
        .await
        .unwrap();
    assert_eq!(bank.total_days, 17.5);
    assert_eq!(bank.year, 2024);

    let adjustments = w.store.adjustments().await;
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].adjusted_by, w.hrd.id);
    assert_eq!(adjustments[0].days, 2.5);

    let err = w
        .service
        .add_leave_bank_days(
            w.alice_employee.id,
            LeaveCredit {
                leave_type: LeaveType::Emergency,
                days: 1.0,
                reason: "n/a".into(),
            },
            &hrd,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let carol = w.actor(&w.carol).await;
    let err = w
        .service
        .get_leave_bank(w.alice_employee.id, Some(2024), &carol)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
