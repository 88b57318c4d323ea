//! # signoff-api
//!
//! A transport-agnostic message API over the signoff workflow engine.
//! Requests arrive as [`Message`] envelopes, are routed by payload type and
//! always produce a correlated reply, with failures carried as an `Error`
//! payload holding a stable code.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use libsignoff::{Engine, MemoryStore, NewTask, Policy};
//! use signoff_api::{router, Message, MessagePayload};
//! use signoff_config::Global;
//!
//! let engine = Arc::new(Engine::new(MemoryStore::new(), Policy::default()));
//! let router = router(engine, Global::default().directory()).unwrap();
//!
//! let request = Message::new(MessagePayload::CreateTask(
//!     NewTask::new("Ship 2.0", "Cut the release branch", "pm@company.com")
//!         .approver("qa@company.com"),
//! ));
//! let reply = router.dispatch(&request);
//! assert_eq!(reply.correlation_id, Some(request.id));
//! assert!(matches!(reply.payload, MessagePayload::Task(_)));
//! ```

use std::sync::Arc;

use libsignoff::{Engine, Store};
use signoff_config::Directory;

pub use crate::error::{ApiError, ApiResult, ErrorResponse};
pub use crate::handlers::{DirectoryHandler, WorkflowHandler};
pub use crate::message::{Message, MessageHandler, MessagePayload, MessageRouter};

pub mod error;
pub mod handlers;
pub mod message;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A router serving every request type.
pub fn router<S: Store + 'static>(
    engine: Arc<Engine<S>>,
    directory: Directory,
) -> ApiResult<MessageRouter> {
    let mut router = MessageRouter::new();
    router.register_handler(WorkflowHandler::new(engine))?;
    router.register_handler(DirectoryHandler::new(directory))?;
    Ok(router)
}
