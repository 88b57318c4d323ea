//! Task identifier generation. The only contract is uniqueness within a
//! store; approval identifiers are derived from the task id.

use std::sync::atomic::{AtomicU64, Ordering};

use signoff_config::IdScheme;
use uuid::Uuid;

use crate::model::TaskId;

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> TaskId;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> TaskId {
        TaskId::new(Uuid::new_v4().to_string())
    }
}

/// Decimal counter: `1`, `2`, `3`, ...
#[derive(Debug)]
pub struct SequenceGenerator {
    next: AtomicU64,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        SequenceGenerator {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequenceGenerator {
    fn next_id(&self) -> TaskId {
        TaskId::new(self.next.fetch_add(1, Ordering::SeqCst).to_string())
    }
}

pub fn from_scheme(scheme: IdScheme) -> Box<dyn IdGenerator> {
    match scheme {
        IdScheme::Uuid => Box::new(UuidGenerator),
        IdScheme::Sequence => Box::new(SequenceGenerator::new()),
    }
}
