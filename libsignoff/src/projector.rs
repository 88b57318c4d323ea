//! Read-only views derived from the stores. Nothing here is cached: each
//! view is recomputed from a single read transaction when asked for.

use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::model::{Approval, Status, Task, TaskId};
use crate::store::TxnT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub task_id: TaskId,
    pub total_approvers: usize,
    pub approved_count: usize,
    pub rejected_count: usize,
    pub pending_count: usize,
    pub can_proceed: bool,
    pub is_rejected: bool,
    pub progress_percentage: f64,
}

/// An approval together with the task it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalWithTask {
    #[serde(flatten)]
    pub approval: Approval,
    pub task: Task,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn tally<I: IntoIterator<Item = Status>>(statuses: I) -> Self {
        let mut counts = StatusCounts::default();
        for status in statuses {
            counts.total += 1;
            match status {
                Status::Pending => counts.pending += 1,
                Status::Approved => counts.approved += 1,
                Status::Rejected => counts.rejected += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub tasks: StatusCounts,
    pub approvals: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub tasks_count: usize,
    pub approvals_count: usize,
}

pub fn progress<T: TxnT>(txn: &T, task_id: &TaskId) -> Result<Progress, WorkflowError> {
    let task = txn
        .get_task(task_id)?
        .ok_or_else(|| WorkflowError::task_not_found(task_id))?;
    let counts = StatusCounts::tally(
        txn.approvals_for_task(task_id)?
            .iter()
            .map(|a| a.status()),
    );
    // Creation rejects empty approver lists, so this is never zero.
    let total = task.approvers.len();
    Ok(Progress {
        task_id: task.id,
        total_approvers: total,
        approved_count: counts.approved,
        rejected_count: counts.rejected,
        pending_count: counts.pending,
        can_proceed: counts.approved == total,
        is_rejected: counts.rejected > 0,
        progress_percentage: 100.0 * counts.approved as f64 / total as f64,
    })
}

pub fn pending_approvals_for<T: TxnT>(
    txn: &T,
    user: &str,
) -> Result<Vec<ApprovalWithTask>, WorkflowError> {
    let approvals = txn.approvals_for_approver(user, Status::Pending)?;
    join_tasks(txn, approvals)
}

/// Every decided approval of `user`, approved or rejected.
pub fn approval_history_for<T: TxnT>(
    txn: &T,
    user: &str,
) -> Result<Vec<ApprovalWithTask>, WorkflowError> {
    let approvals =
        txn.approvals_where(&mut |a: &Approval| a.approver == user && !a.status().is_pending())?;
    join_tasks(txn, approvals)
}

pub fn stats<T: TxnT>(txn: &T) -> Result<Stats, WorkflowError> {
    Ok(Stats {
        tasks: StatusCounts::tally(txn.tasks()?.iter().map(|t| t.status())),
        approvals: StatusCounts::tally(txn.approvals()?.iter().map(|a| a.status())),
    })
}

pub fn health<T: TxnT>(txn: &T) -> Result<Health, WorkflowError> {
    Ok(Health {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        tasks_count: txn.tasks()?.len(),
        approvals_count: txn.approvals()?.len(),
    })
}

fn join_tasks<T: TxnT>(
    txn: &T,
    approvals: Vec<Approval>,
) -> Result<Vec<ApprovalWithTask>, WorkflowError> {
    let mut joined = Vec::with_capacity(approvals.len());
    for approval in approvals {
        match txn.get_task(&approval.task_id)? {
            Some(task) => joined.push(ApprovalWithTask { approval, task }),
            None => warn!("approval {} has no task", approval.id),
        }
    }
    Ok(joined)
}
