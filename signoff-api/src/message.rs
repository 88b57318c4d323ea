//! Message envelope and payloads for the workflow API.
//!
//! Requests and replies share one envelope. A reply carries the request's
//! id as its `correlationId` and is addressed back to the sender.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use libsignoff::{Approval, ApprovalWithTask, Health, NewTask, Progress, Stats, Task, TaskId};
use serde::{Deserialize, Serialize};
use signoff_config::User;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorResponse};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub correlation_id: Option<Uuid>,
    pub payload: MessagePayload,
}

impl Message {
    pub fn new(payload: MessagePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            sender: None,
            recipient: None,
            correlation_id: None,
            payload,
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn reply(&self, payload: MessagePayload) -> Self {
        let reply = Message::new(payload).with_correlation_id(self.id);
        match self.sender {
            Some(ref sender) => reply.with_recipient(sender.clone()),
            None => reply,
        }
    }

    /// Parse either a full envelope or a bare payload, which gets wrapped
    /// in a fresh envelope. Any object with a `payload` key is an envelope.
    pub fn from_json(input: &str) -> ApiResult<Self> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        if value.get("payload").is_some() {
            return serde_json::from_value(value)
                .map_err(|e| ApiError::invalid_format(format!("envelope: {}", e)));
        }
        let payload: MessagePayload = serde_json::from_value(value)?;
        Ok(Message::new(payload))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MessagePayload {
    // Requests
    HealthCheck,
    CreateTask(NewTask),
    ApproveTask(ApproveTaskMessage),
    RejectTask(RejectTaskMessage),
    GetTask(TaskQuery),
    ListTasks,
    GetTaskApprovals(TaskQuery),
    GetTaskProgress(TaskQuery),
    GetUserPendingApprovals(UserQuery),
    GetUserApprovalHistory(UserQuery),
    GetStats,
    ListUsers,

    // Replies
    HealthStatus(Health),
    Task(Task),
    TaskDecision(DecisionMessage),
    Tasks(Vec<Task>),
    Approvals(Vec<Approval>),
    UserApprovals(Vec<ApprovalWithTask>),
    Progress(Progress),
    Stats(Stats),
    Users(Vec<User>),
    Success(SuccessMessage),
    Error(ErrorResponse),
}

impl MessagePayload {
    pub fn message_type(&self) -> &'static str {
        match self {
            MessagePayload::HealthCheck => "health_check",
            MessagePayload::CreateTask(_) => "create_task",
            MessagePayload::ApproveTask(_) => "approve_task",
            MessagePayload::RejectTask(_) => "reject_task",
            MessagePayload::GetTask(_) => "get_task",
            MessagePayload::ListTasks => "list_tasks",
            MessagePayload::GetTaskApprovals(_) => "get_task_approvals",
            MessagePayload::GetTaskProgress(_) => "get_task_progress",
            MessagePayload::GetUserPendingApprovals(_) => "get_user_pending_approvals",
            MessagePayload::GetUserApprovalHistory(_) => "get_user_approval_history",
            MessagePayload::GetStats => "get_stats",
            MessagePayload::ListUsers => "list_users",
            MessagePayload::HealthStatus(_) => "health_status",
            MessagePayload::Task(_) => "task",
            MessagePayload::TaskDecision(_) => "task_decision",
            MessagePayload::Tasks(_) => "tasks",
            MessagePayload::Approvals(_) => "approvals",
            MessagePayload::UserApprovals(_) => "user_approvals",
            MessagePayload::Progress(_) => "progress",
            MessagePayload::Stats(_) => "stats",
            MessagePayload::Users(_) => "users",
            MessagePayload::Success(_) => "success",
            MessagePayload::Error(_) => "error",
        }
    }

    pub fn error(err: &ApiError) -> Self {
        MessagePayload::Error(ErrorResponse::from(err))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveTaskMessage {
    pub task_id: TaskId,
    pub approver: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectTaskMessage {
    pub task_id: TaskId,
    pub approver: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub task_id: TaskId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuery {
    pub user: String,
}

/// Reply to an approve or reject request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMessage {
    pub task: Task,
    pub approval: Approval,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessMessage {
    pub message: String,
    pub data: Option<serde_json::Value>,
}

pub trait MessageHandler: Send + Sync {
    /// Handle a request. `None` means there is nothing to report beyond
    /// success, and the router acknowledges with a `Success` reply.
    fn handle_message(&self, message: &Message) -> ApiResult<Option<Message>>;

    /// Request types this handler answers.
    fn message_types(&self) -> Vec<&'static str>;
}

/// Dispatches messages to handlers by payload type.
pub struct MessageRouter {
    handlers: HashMap<&'static str, Arc<dyn MessageHandler>>,
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().collect();
        types.sort();
        f.debug_struct("MessageRouter")
            .field("handler_types", &types)
            .finish()
    }
}

impl MessageRouter {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for every type it declares. A type can only have
    /// one handler.
    pub fn register_handler<H>(&mut self, handler: H) -> ApiResult<()>
    where
        H: MessageHandler + 'static,
    {
        let types = handler.message_types();
        if let Some(taken) = types.iter().find(|t| self.handlers.contains_key(*t)) {
            return Err(ApiError::Configuration {
                message: format!("duplicate handler for message type {}", taken),
            });
        }
        let handler: Arc<dyn MessageHandler> = Arc::new(handler);
        for message_type in types {
            self.handlers.insert(message_type, handler.clone());
        }
        Ok(())
    }

    pub fn handles(&self, message_type: &str) -> bool {
        self.handlers.contains_key(message_type)
    }

    pub fn route_message(&self, message: &Message) -> ApiResult<Option<Message>> {
        let message_type = message.payload.message_type();
        match self.handlers.get(message_type) {
            Some(handler) => handler.handle_message(message),
            None => Err(ApiError::HandlerNotFound {
                message_type: message_type.to_string(),
            }),
        }
    }

    /// Route `message` and always produce a reply. Failures become an
    /// `Error` payload correlated with the request.
    pub fn dispatch(&self, message: &Message) -> Message {
        debug!(
            "dispatching {} ({})",
            message.payload.message_type(),
            message.id
        );
        match self.route_message(message) {
            Ok(Some(reply)) => reply,
            Ok(None) => message.reply(MessagePayload::Success(SuccessMessage {
                message: "OK".to_string(),
                data: None,
            })),
            Err(err) => {
                warn!(
                    "{} ({}) failed: {}",
                    message.payload.message_type(),
                    message.id,
                    err
                );
                message.reply(MessagePayload::error(&err))
            }
        }
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_correlation() {
        let original = Message::new(MessagePayload::HealthCheck).with_sender("client");
        let reply = original.reply(MessagePayload::Success(SuccessMessage {
            message: "ok".to_string(),
            data: None,
        }));
        assert_eq!(reply.correlation_id, Some(original.id));
        assert_eq!(reply.recipient, Some("client".to_string()));

        let anonymous = Message::new(MessagePayload::ListTasks);
        assert_eq!(anonymous.reply(MessagePayload::Tasks(vec![])).recipient, None);
    }

    #[test]
    fn test_bare_payload_is_wrapped() {
        let message = Message::from_json(
            r#"{"type":"ApproveTask","data":{"taskId":"7","approver":"a@company.com"}}"#,
        )
        .unwrap();
        assert_eq!(
            message.payload,
            MessagePayload::ApproveTask(ApproveTaskMessage {
                task_id: TaskId::from("7"),
                approver: "a@company.com".to_string(),
            })
        );
        assert_eq!(message.sender, None);
    }

    #[test]
    fn test_envelope_without_id_gets_one() {
        let message = Message::from_json(
            r#"{"sender":"pm@company.com","payload":{"type":"RejectTask","data":{"taskId":"7","approver":"a"}}}"#,
        )
        .unwrap();
        assert_eq!(message.sender.as_deref(), Some("pm@company.com"));
        assert!(matches!(
            message.payload,
            MessagePayload::RejectTask(RejectTaskMessage { reason: None, .. })
        ));
    }

    #[test]
    fn test_broken_envelope_reports_its_payload() {
        let err = Message::from_json(
            r#"{"sender":"pm@company.com","payload":{"type":"ApproveTask","data":{"taskId":"7"}}}"#,
        )
        .unwrap_err();
        match err {
            ApiError::InvalidFormat { ref message } => {
                assert!(message.contains("approver"), "{}", message)
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(ErrorResponse::from(&err).code, "MSG_002");
    }

    #[test]
    fn test_unit_payloads() {
        let message = Message::from_json(r#"{"type":"GetStats"}"#).unwrap();
        assert_eq!(message.payload.message_type(), "get_stats");
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            Message::from_json("not json"),
            Err(ApiError::Serialization(_))
        ));
        assert!(Message::from_json(r#"{"type":"Teleport"}"#).is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let message = Message::new(MessagePayload::CreateTask(
            NewTask::new("t", "d", "r").approver("a"),
        ))
        .with_sender("r");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(Message::from_json(&json).unwrap(), message);
    }

    struct Echo;

    impl MessageHandler for Echo {
        fn handle_message(&self, message: &Message) -> ApiResult<Option<Message>> {
            match message.payload {
                MessagePayload::ListTasks => Ok(Some(message.reply(MessagePayload::Tasks(vec![])))),
                _ => Ok(None),
            }
        }

        fn message_types(&self) -> Vec<&'static str> {
            vec!["list_tasks", "get_stats"]
        }
    }

    #[test]
    fn test_router_registers_every_type() {
        let mut router = MessageRouter::new();
        router.register_handler(Echo).unwrap();
        assert!(router.handles("list_tasks"));
        assert!(router.handles("get_stats"));
        assert!(!router.handles("health_check"));

        let request = Message::new(MessagePayload::GetStats);
        let reply = router.dispatch(&request);
        assert_eq!(reply.correlation_id, Some(request.id));
        assert_eq!(reply.payload.message_type(), "success");
    }

    #[test]
    fn test_router_rejects_duplicate_types() {
        let mut router = MessageRouter::new();
        router.register_handler(Echo).unwrap();
        assert!(matches!(
            router.register_handler(Echo),
            Err(ApiError::Configuration { .. })
        ));
    }

    #[test]
    fn test_unhandled_type_replies_with_error() {
        let router = MessageRouter::default();
        let request = Message::new(MessagePayload::HealthCheck).with_sender("probe");
        let reply = router.dispatch(&request);
        assert_eq!(reply.recipient.as_deref(), Some("probe"));
        match reply.payload {
            MessagePayload::Error(e) => assert_eq!(e.code, "MSG_003"),
            other => panic!("unexpected reply {:?}", other),
        }
    }
}
