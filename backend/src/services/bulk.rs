//! Batch status changes and superadmin force-approval.
//!
//! A batch runs in one unit of work. Items are processed in the order given;
//! an item-level error is recorded and the loop moves on, while a storage
//! error aborts the batch and nothing is committed.

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{decision::BulkOutcome, request::RequestStatus};
use crate::repositories::store::Store;
use crate::services::{
    approvals::{settle, ApprovalService},
    roles::Actor,
    state_machine,
};
use crate::types::RequestId;

impl<S: Store> ApprovalService<S> {
    /// Applies the same target status to every listed request.
    pub async fn bulk_transition(
        &self,
        ids: &[RequestId],
        target: RequestStatus,
        remarks: Option<&str>,
        actor: &Actor,
    ) -> Result<BulkOutcome, AppError> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let result = self.bulk_in(&mut tx, ids, target, remarks, actor, now).await;
        let outcome = settle(tx, result).await?;
        tracing::info!(
            target = %target,
            succeeded = outcome.success_count,
            failed = outcome.fail_count,
            actor = %actor.id(),
            "Bulk status update finished"
        );
        Ok(outcome)
    }

    async fn bulk_in(
        &self,
        tx: &mut S::Tx,
        ids: &[RequestId],
        target: RequestStatus,
        remarks: Option<&str>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<BulkOutcome, AppError> {
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            match self
                .transition_in(tx, id, target, remarks, actor, now)
                .await
            {
                Ok(_) => outcome.record_success(),
                Err(err) if err.is_item_level() => {
                    tracing::warn!(request_id = %id, error = %err, "Bulk item skipped");
                    outcome.record_failure(id, &err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(outcome)
    }

    /// Approves every listed request in one step, back-filling skipped stages.
    /// Superadmin only.
    pub async fn force_approve(
        &self,
        ids: &[RequestId],
        remarks: Option<&str>,
        actor: &Actor,
    ) -> Result<BulkOutcome, AppError> {
        if !actor.profile.is_super_admin {
            return Err(AppError::Forbidden(
                "Only a superadmin can force-approve requests".into(),
            ));
        }

        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let result = self.force_in(&mut tx, ids, remarks, actor, now).await;
        let outcome = settle(tx, result).await?;
        tracing::info!(
            succeeded = outcome.success_count,
            failed = outcome.fail_count,
            actor = %actor.id(),
            "Force approval finished"
        );
        Ok(outcome)
    }

    async fn force_in(
        &self,
        tx: &mut S::Tx,
        ids: &[RequestId],
        remarks: Option<&str>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<BulkOutcome, AppError> {
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            match self.force_one(tx, id, remarks, actor, now).await {
                Ok(()) => outcome.record_success(),
                Err(err) if err.is_item_level() => {
                    tracing::warn!(request_id = %id, error = %err, "Force approval item skipped");
                    outcome.record_failure(id, &err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(outcome)
    }

    async fn force_one(
        &self,
        tx: &mut S::Tx,
        id: RequestId,
        remarks: Option<&str>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut request = self.load_for_update(tx, id).await?;
        let step = state_machine::force_approve(&mut request, remarks, actor, now)?;
        self.persist_step(tx, &request, step, actor).await
    }
}
