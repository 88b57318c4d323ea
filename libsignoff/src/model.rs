//! Task and Approval records.
//!
//! Workflow fields (status, decisions, derived caches) are only writable
//! from inside this crate; callers read them through accessors.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signoff_config::RejectionPolicy;

use crate::state;

/// Shared by tasks and approvals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Approved,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::Approved, Status::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
        }
    }

    pub fn is_pending(&self) -> bool {
        *self == Status::Pending
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

/// Composite key `{task}-{approver}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalId(String);

impl ApprovalId {
    pub fn new(task: &TaskId, approver: &str) -> Self {
        ApprovalId(format!("{}-{}", task, approver))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input to task creation. Empty fields are reported by validation, so a
/// partially filled request deserializes fine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub requester: String,
    pub approvers: Vec<String>,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        requester: impl Into<String>,
    ) -> Self {
        NewTask {
            title: title.into(),
            description: description.into(),
            requester: requester.into(),
            approvers: Vec::new(),
        }
    }

    pub fn approver(mut self, approver: impl Into<String>) -> Self {
        self.approvers.push(approver.into());
        self
    }

    pub fn approvers<I, A>(mut self, approvers: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.approvers.extend(approvers.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub approver: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub requester: String,
    pub approvers: Vec<String>,
    pub(crate) status: Status,
    pub(crate) approved_by: Vec<String>,
    pub(crate) rejected_by: Vec<Rejection>,
    pub(crate) current_step: usize,
    pub(crate) can_proceed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub(crate) fn new(id: TaskId, new: NewTask, created_at: DateTime<Utc>) -> Self {
        Task {
            id,
            title: new.title,
            description: new.description,
            requester: new.requester,
            approvers: new.approvers,
            status: Status::Pending,
            approved_by: Vec::new(),
            rejected_by: Vec::new(),
            current_step: 0,
            can_proceed: false,
            created_at,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn approved_by(&self) -> &[String] {
        &self.approved_by
    }

    pub fn rejected_by(&self) -> &[Rejection] {
        &self.rejected_by
    }

    /// Number of approvals recorded so far.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn can_proceed(&self) -> bool {
        self.can_proceed
    }

    pub fn is_unanimous(&self) -> bool {
        self.approved_by.len() == self.approvers.len()
    }

    /// `Approved`, `Rejected`, or `Pending (k/N)`.
    pub fn status_label(&self) -> String {
        match self.status {
            Status::Approved => "Approved".to_string(),
            Status::Rejected => "Rejected".to_string(),
            Status::Pending => format!(
                "Pending ({}/{})",
                self.approved_by.len(),
                self.approvers.len()
            ),
        }
    }

    pub(crate) fn record_approval(&mut self, approver: &str, policy: RejectionPolicy) {
        self.approved_by.push(approver.to_string());
        self.refresh(policy);
    }

    /// A rejection always moves the task to `rejected`, whatever the
    /// approval count.
    pub(crate) fn record_rejection(&mut self, rejection: Rejection, policy: RejectionPolicy) {
        self.rejected_by.push(rejection);
        self.settle(Status::Rejected, policy);
    }

    /// Recompute status from `approved_by`, `rejected_by` and `approvers`.
    fn refresh(&mut self, policy: RejectionPolicy) {
        let next = state::task_status(self.is_unanimous(), !self.rejected_by.is_empty(), policy);
        self.settle(next, policy);
    }

    fn settle(&mut self, next: Status, policy: RejectionPolicy) {
        if state::task_transition_allowed(self.status, next, policy) {
            self.status = next;
        }
        self.current_step = self.approved_by.len();
        self.can_proceed = self.status == Status::Approved;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub id: ApprovalId,
    pub task_id: TaskId,
    pub approver: String,
    pub(crate) status: Status,
    pub created_at: DateTime<Utc>,
    pub(crate) approved_at: Option<DateTime<Utc>>,
    pub(crate) rejected_at: Option<DateTime<Utc>>,
    pub(crate) reason: Option<String>,
}

impl Approval {
    pub(crate) fn new(task_id: &TaskId, approver: &str, created_at: DateTime<Utc>) -> Self {
        Approval {
            id: ApprovalId::new(task_id, approver),
            task_id: task_id.clone(),
            approver: approver.to_string(),
            status: Status::Pending,
            created_at,
            approved_at: None,
            rejected_at: None,
            reason: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.rejected_at
    }

    /// When the decision was taken, if any.
    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at.or(self.rejected_at)
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub(crate) fn approve(&mut self, at: DateTime<Utc>) -> Result<(), state::InvalidTransition> {
        state::approval_transition(self.status, Status::Approved)?;
        self.status = Status::Approved;
        self.approved_at = Some(at);
        Ok(())
    }

    pub(crate) fn reject(
        &mut self,
        at: DateTime<Utc>,
        reason: String,
    ) -> Result<(), state::InvalidTransition> {
        state::approval_transition(self.status, Status::Rejected)?;
        self.status = Status::Rejected;
        self.rejected_at = Some(at);
        self.reason = Some(reason);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(approvers: &[&str]) -> Task {
        Task::new(
            TaskId::from("1"),
            NewTask::new("t", "d", "r").approvers(approvers.iter().copied()),
            Utc::now(),
        )
    }

    #[test]
    fn test_approval_id_is_composite() {
        let id = ApprovalId::new(&TaskId::from("42"), "a@company.com");
        assert_eq!(id.as_str(), "42-a@company.com");
    }

    #[test]
    fn test_status_label() {
        let mut t = task(&["a", "b", "c"]);
        assert_eq!(t.status_label(), "Pending (0/3)");
        t.record_approval("a", RejectionPolicy::Overridable);
        assert_eq!(t.status_label(), "Pending (1/3)");
        t.record_approval("b", RejectionPolicy::Overridable);
        t.record_approval("c", RejectionPolicy::Overridable);
        assert_eq!(t.status_label(), "Approved");
        assert_eq!(t.current_step(), 3);
        assert!(t.can_proceed());
    }

    #[test]
    fn test_rejection_is_overridden_by_unanimity() {
        let mut t = task(&["a", "b"]);
        t.record_rejection(
            Rejection {
                approver: "z".into(),
                reason: "no".into(),
            },
            RejectionPolicy::Overridable,
        );
        assert_eq!(t.status(), Status::Rejected);
        assert!(!t.can_proceed());
        t.record_approval("a", RejectionPolicy::Overridable);
        assert_eq!(t.status(), Status::Rejected);
        t.record_approval("b", RejectionPolicy::Overridable);
        assert_eq!(t.status(), Status::Approved);
        assert!(t.can_proceed());
        assert_eq!(t.rejected_by().len(), 1);
    }

    #[test]
    fn test_terminal_rejection_sticks() {
        let mut t = task(&["a"]);
        t.record_rejection(
            Rejection {
                approver: "z".into(),
                reason: "no".into(),
            },
            RejectionPolicy::Terminal,
        );
        t.record_approval("a", RejectionPolicy::Terminal);
        assert_eq!(t.status(), Status::Rejected);
        assert!(!t.can_proceed());
        assert_eq!(t.current_step(), 1);
    }

    #[test]
    fn test_approval_decides_once() {
        let mut a = Approval::new(&TaskId::from("1"), "a", Utc::now());
        a.approve(Utc::now()).unwrap();
        assert!(a.approved_at().is_some());
        assert!(a.reject(Utc::now(), "late".into()).is_err());
        assert_eq!(a.status(), Status::Approved);
        assert_eq!(a.reason(), None);
        assert_eq!(a.rejected_at(), None);
    }

    #[test]
    fn test_serialized_field_names() {
        let t = task(&["a"]);
        let value = serde_json::to_value(&t).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["approvedBy"], serde_json::json!([]));
        assert_eq!(value["currentStep"], 0);
        assert_eq!(value["canProceed"], false);
        assert!(value.get("createdAt").is_some());
    }
}
