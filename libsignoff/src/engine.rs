//! The workflow engine: creates tasks with their approval fan-out and
//! applies approve/reject decisions.
//!
//! Every write runs inside one store write transaction. Preconditions are
//! checked before anything is staged, so a failed call leaves the store
//! untouched, and the guard on an approval's status is evaluated under the
//! same exclusive transaction that records the decision.

use std::collections::HashSet;

use chrono::Utc;
use log::*;
use serde::{Deserialize, Serialize};
use signoff_config::{DuplicateApprovers, Policy};

use crate::error::{ValidationError, WorkflowError};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::model::{Approval, ApprovalId, NewTask, Rejection, Task, TaskId};
use crate::projector::{self, ApprovalWithTask, Health, Progress, Stats};
use crate::store::{MutTxnT, Store, StoreError, TxnT};

/// Result of an approve or reject call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub task: Task,
    pub approval: Approval,
}

pub struct Engine<S> {
    store: S,
    ids: Box<dyn IdGenerator>,
    policy: Policy,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S, policy: Policy) -> Self {
        Engine {
            store,
            ids: Box::new(UuidGenerator),
            policy,
        }
    }

    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a task and one pending approval per approver.
    pub fn create_task(&self, new: NewTask) -> Result<Task, WorkflowError> {
        let new = validate(new, self.policy.duplicate_approvers)?;
        let mut txn = self.store.mut_txn_begin()?;
        let id = self.ids.next_id();
        if txn.get_task(&id)?.is_some() {
            return Err(StoreError::DuplicateKey(id.to_string()).into());
        }

        let now = Utc::now();
        let task = Task::new(id, new, now);
        txn.put_task(task.clone())?;
        for approver in task.approvers.iter() {
            txn.put_approval(Approval::new(&task.id, approver, now))?;
        }
        txn.commit()?;

        info!(
            "task {} created by {} with {} approver(s)",
            task.id,
            task.requester,
            task.approvers.len()
        );
        Ok(task)
    }

    /// Approve on behalf of `approver`. Surrounding whitespace is ignored,
    /// as it is when the approver list is validated.
    pub fn approve_task(&self, task_id: &TaskId, approver: &str) -> Result<Decision, WorkflowError> {
        let approver = approver.trim();
        let mut txn = self.store.mut_txn_begin()?;
        let (mut task, mut approval) = load_pending(&txn, task_id, approver)?;

        approval.approve(Utc::now()).map_err(|e| conflict(&approval, e))?;
        task.record_approval(approver, self.policy.rejection);

        txn.put_approval(approval.clone())?;
        txn.put_task(task.clone())?;
        txn.commit()?;

        info!(
            "task {} approved by {} ({}/{}), status {}",
            task.id,
            approver,
            task.approved_by().len(),
            task.approvers.len(),
            task.status()
        );
        Ok(Decision { task, approval })
    }

    /// Reject on behalf of `approver`. A missing or blank reason is
    /// replaced by the policy's default text.
    pub fn reject_task(
        &self,
        task_id: &TaskId,
        approver: &str,
        reason: Option<&str>,
    ) -> Result<Decision, WorkflowError> {
        let approver = approver.trim();
        let reason = match reason.map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => self.policy.default_reject_reason.clone(),
        };

        let mut txn = self.store.mut_txn_begin()?;
        let (mut task, mut approval) = load_pending(&txn, task_id, approver)?;

        approval
            .reject(Utc::now(), reason.clone())
            .map_err(|e| conflict(&approval, e))?;
        task.record_rejection(
            Rejection {
                approver: approver.to_string(),
                reason,
            },
            self.policy.rejection,
        );

        txn.put_approval(approval.clone())?;
        txn.put_task(task.clone())?;
        txn.commit()?;

        info!("task {} rejected by {}", task.id, approver);
        Ok(Decision { task, approval })
    }

    pub fn get_task(&self, task_id: &TaskId) -> Result<Task, WorkflowError> {
        let txn = self.store.txn_begin()?;
        txn.get_task(task_id)?
            .ok_or_else(|| WorkflowError::task_not_found(task_id))
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, WorkflowError> {
        Ok(self.store.txn_begin()?.tasks()?)
    }

    /// Approvals of a task. Unknown tasks simply have none.
    pub fn task_approvals(&self, task_id: &TaskId) -> Result<Vec<Approval>, WorkflowError> {
        Ok(self.store.txn_begin()?.approvals_for_task(task_id)?)
    }

    pub fn progress(&self, task_id: &TaskId) -> Result<Progress, WorkflowError> {
        projector::progress(&self.store.txn_begin()?, task_id)
    }

    pub fn pending_approvals_for(&self, user: &str) -> Result<Vec<ApprovalWithTask>, WorkflowError> {
        projector::pending_approvals_for(&self.store.txn_begin()?, user)
    }

    pub fn approval_history_for(&self, user: &str) -> Result<Vec<ApprovalWithTask>, WorkflowError> {
        projector::approval_history_for(&self.store.txn_begin()?, user)
    }

    pub fn stats(&self) -> Result<Stats, WorkflowError> {
        projector::stats(&self.store.txn_begin()?)
    }

    pub fn health(&self) -> Result<Health, WorkflowError> {
        projector::health(&self.store.txn_begin()?)
    }
}

/// Check the three approve/reject preconditions, in order.
fn load_pending<T: TxnT>(
    txn: &T,
    task_id: &TaskId,
    approver: &str,
) -> Result<(Task, Approval), WorkflowError> {
    let task = txn.get_task(task_id)?.ok_or_else(|| {
        warn!("decision on unknown task {}", task_id);
        WorkflowError::task_not_found(task_id)
    })?;
    let approval_id = ApprovalId::new(task_id, approver);
    let approval = txn.get_approval(&approval_id)?.ok_or_else(|| {
        warn!("{} is not an approver of task {}", approver, task_id);
        WorkflowError::approval_not_found(&approval_id)
    })?;
    if !approval.status().is_pending() {
        warn!(
            "approval {} already processed ({})",
            approval.id,
            approval.status()
        );
        let status = approval.status();
        return Err(WorkflowError::Conflict {
            id: approval.id,
            status,
        });
    }
    Ok((task, approval))
}

fn conflict(approval: &Approval, e: crate::state::InvalidTransition) -> WorkflowError {
    WorkflowError::Conflict {
        id: approval.id.clone(),
        status: e.from,
    }
}

/// Trim and check creation input.
pub fn validate(new: NewTask, duplicates: DuplicateApprovers) -> Result<NewTask, ValidationError> {
    let title = required(new.title, "title")?;
    let description = required(new.description, "description")?;
    let requester = required(new.requester, "requester")?;
    if new.approvers.is_empty() {
        return Err(ValidationError::NoApprovers);
    }

    let mut seen = HashSet::new();
    let mut approvers = Vec::with_capacity(new.approvers.len());
    for (i, approver) in new.approvers.into_iter().enumerate() {
        let approver = approver.trim().to_string();
        if approver.is_empty() {
            return Err(ValidationError::BlankApprover(i));
        }
        if !seen.insert(approver.clone()) {
            match duplicates {
                DuplicateApprovers::Reject => {
                    return Err(ValidationError::DuplicateApprover(approver))
                }
                DuplicateApprovers::Dedupe => {
                    debug!("dropping repeated approver {}", approver);
                    continue;
                }
            }
        }
        approvers.push(approver);
    }

    Ok(NewTask {
        title,
        description,
        requester,
        approvers,
    })
}

fn required(value: String, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}
