//! # libsignoff
//!
//! Unanimous multi-party approval of work items. A requester submits a task
//! naming a fixed set of approvers; the task is approved only once every
//! approver has approved, and is rejected as soon as any approver rejects.
//!
//! ```rust
//! use libsignoff::{Engine, MemoryStore, NewTask, Policy, Status};
//!
//! let engine = Engine::new(MemoryStore::new(), Policy::default());
//! let task = engine
//!     .create_task(
//!         NewTask::new("Ship 2.0", "Cut the release branch", "pm@company.com")
//!             .approvers(["qa@company.com", "security@company.com"]),
//!     )
//!     .unwrap();
//!
//! engine.approve_task(&task.id, "qa@company.com").unwrap();
//! assert_eq!(engine.progress(&task.id).unwrap().progress_percentage, 50.0);
//!
//! let decision = engine.approve_task(&task.id, "security@company.com").unwrap();
//! assert_eq!(decision.task.status(), Status::Approved);
//! assert!(decision.task.can_proceed());
//! ```

pub mod engine;
pub mod error;
pub mod ids;
pub mod model;
pub mod projector;
pub mod state;
pub mod store;

pub use engine::{Decision, Engine};
pub use error::{Entity, ErrorKind, ValidationError, WorkflowError};
pub use ids::{IdGenerator, SequenceGenerator, UuidGenerator};
pub use model::{Approval, ApprovalId, NewTask, Rejection, Status, Task, TaskId};
pub use projector::{ApprovalWithTask, Health, Progress, Stats, StatusCounts};
pub use store::{MemoryStore, MutTxnT, Store, StoreError, TxnT};

pub use signoff_config::{DuplicateApprovers, Policy, RejectionPolicy};
