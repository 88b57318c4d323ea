//! Handlers binding message payloads to the workflow engine and the user
//! directory.

use std::sync::Arc;

use libsignoff::{Decision, Engine, Store};
use signoff_config::Directory;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::message::{DecisionMessage, Message, MessageHandler, MessagePayload};

pub const APPROVED_MESSAGE: &str = "Task approved successfully";
pub const REJECTED_MESSAGE: &str = "Task rejected";

/// Serves every task, approval and summary request.
pub struct WorkflowHandler<S> {
    engine: Arc<Engine<S>>,
}

impl<S: Store> WorkflowHandler<S> {
    pub fn new(engine: Arc<Engine<S>>) -> Self {
        WorkflowHandler { engine }
    }

    fn payload_for(&self, payload: &MessagePayload) -> ApiResult<MessagePayload> {
        let engine = &self.engine;
        let reply = match payload {
            MessagePayload::HealthCheck => MessagePayload::HealthStatus(engine.health()?),
            MessagePayload::CreateTask(new) => {
                let task = engine.create_task(new.clone())?;
                info!(task = %task.id, "task created");
                MessagePayload::Task(task)
            }
            MessagePayload::ApproveTask(req) => {
                let decision = engine.approve_task(&req.task_id, &req.approver)?;
                decision_reply(decision, APPROVED_MESSAGE)
            }
            MessagePayload::RejectTask(req) => {
                let decision =
                    engine.reject_task(&req.task_id, &req.approver, req.reason.as_deref())?;
                decision_reply(decision, REJECTED_MESSAGE)
            }
            MessagePayload::GetTask(q) => MessagePayload::Task(engine.get_task(&q.task_id)?),
            MessagePayload::ListTasks => MessagePayload::Tasks(engine.list_tasks()?),
            MessagePayload::GetTaskApprovals(q) => {
                MessagePayload::Approvals(engine.task_approvals(&q.task_id)?)
            }
            MessagePayload::GetTaskProgress(q) => {
                MessagePayload::Progress(engine.progress(&q.task_id)?)
            }
            MessagePayload::GetUserPendingApprovals(q) => {
                MessagePayload::UserApprovals(engine.pending_approvals_for(&q.user)?)
            }
            MessagePayload::GetUserApprovalHistory(q) => {
                MessagePayload::UserApprovals(engine.approval_history_for(&q.user)?)
            }
            MessagePayload::GetStats => MessagePayload::Stats(engine.stats()?),
            other => {
                return Err(ApiError::HandlerNotFound {
                    message_type: other.message_type().to_string(),
                })
            }
        };
        Ok(reply)
    }
}

fn decision_reply(decision: Decision, message: &str) -> MessagePayload {
    MessagePayload::TaskDecision(DecisionMessage {
        task: decision.task,
        approval: decision.approval,
        message: message.to_string(),
    })
}

impl<S: Store> MessageHandler for WorkflowHandler<S> {
    fn handle_message(&self, message: &Message) -> ApiResult<Option<Message>> {
        let payload = self.payload_for(&message.payload)?;
        Ok(Some(message.reply(payload)))
    }

    fn message_types(&self) -> Vec<&'static str> {
        vec![
            "health_check",
            "create_task",
            "approve_task",
            "reject_task",
            "get_task",
            "list_tasks",
            "get_task_approvals",
            "get_task_progress",
            "get_user_pending_approvals",
            "get_user_approval_history",
            "get_stats",
        ]
    }
}

/// Serves the configured user directory.
pub struct DirectoryHandler {
    directory: Directory,
}

impl DirectoryHandler {
    pub fn new(directory: Directory) -> Self {
        DirectoryHandler { directory }
    }
}

impl MessageHandler for DirectoryHandler {
    fn handle_message(&self, message: &Message) -> ApiResult<Option<Message>> {
        match message.payload {
            MessagePayload::ListUsers => Ok(Some(
                message.reply(MessagePayload::Users(self.directory.users().to_vec())),
            )),
            ref other => Err(ApiError::HandlerNotFound {
                message_type: other.message_type().to_string(),
            }),
        }
    }

    fn message_types(&self) -> Vec<&'static str> {
        vec!["list_users"]
    }
}
