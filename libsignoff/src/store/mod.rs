//! Storage for tasks and approval records.
//!
//! The engine only talks to a [`Store`] through transactions. A read
//! transaction ([`TxnT`]) sees a consistent snapshot and may run alongside
//! other readers. A write transaction ([`MutTxnT`]) is exclusive: nothing it
//! writes is visible until [`MutTxnT::commit`], and dropping it without
//! committing discards every write.

use thiserror::Error;

use crate::model::{Approval, ApprovalId, Status, Task, TaskId};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Key {0} is already in use")]
    DuplicateKey(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub trait Store: Send + Sync {
    type Txn<'a>: TxnT
    where
        Self: 'a;
    type MutTxn<'a>: MutTxnT
    where
        Self: 'a;

    fn txn_begin(&self) -> Result<Self::Txn<'_>, StoreError>;

    fn mut_txn_begin(&self) -> Result<Self::MutTxn<'_>, StoreError>;
}

/// Read access to both tables.
pub trait TxnT {
    fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;

    /// All tasks, in insertion order.
    fn tasks(&self) -> Result<Vec<Task>, StoreError>;

    fn get_approval(&self, id: &ApprovalId) -> Result<Option<Approval>, StoreError>;

    /// Approvals matching `pred`, in insertion order.
    fn approvals_where(
        &self,
        pred: &mut dyn FnMut(&Approval) -> bool,
    ) -> Result<Vec<Approval>, StoreError>;

    fn approvals(&self) -> Result<Vec<Approval>, StoreError> {
        self.approvals_where(&mut |_: &Approval| true)
    }

    fn approvals_for_task(&self, task: &TaskId) -> Result<Vec<Approval>, StoreError> {
        self.approvals_where(&mut |a: &Approval| &a.task_id == task)
    }

    fn approvals_for_approver(
        &self,
        approver: &str,
        status: Status,
    ) -> Result<Vec<Approval>, StoreError> {
        self.approvals_where(&mut |a: &Approval| a.approver == approver && a.status() == status)
    }
}

/// Write access. `put_*` inserts or replaces by id.
pub trait MutTxnT: TxnT {
    fn put_task(&mut self, task: Task) -> Result<(), StoreError>;

    fn put_approval(&mut self, approval: Approval) -> Result<(), StoreError>;

    fn commit(self) -> Result<(), StoreError>;
}
