//! In-memory store. A single reader-writer lock guards both tables, so a
//! write transaction excludes every other transaction for its lifetime and
//! readers never observe half of a commit.

use std::collections::HashMap;

use log::*;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{MutTxnT, Store, StoreError, TxnT};
use crate::model::{Approval, ApprovalId, Task, TaskId};

#[derive(Debug, Default)]
struct Tables {
    tasks: Vec<Task>,
    task_index: HashMap<TaskId, usize>,
    approvals: Vec<Approval>,
    approval_index: HashMap<ApprovalId, usize>,
}

impl Tables {
    fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.task_index.get(id).map(|&i| &self.tasks[i])
    }

    fn get_approval(&self, id: &ApprovalId) -> Option<&Approval> {
        self.approval_index.get(id).map(|&i| &self.approvals[i])
    }

    fn upsert_task(&mut self, task: Task) {
        if let Some(&i) = self.task_index.get(&task.id) {
            self.tasks[i] = task;
        } else {
            self.task_index.insert(task.id.clone(), self.tasks.len());
            self.tasks.push(task);
        }
    }

    fn upsert_approval(&mut self, approval: Approval) {
        if let Some(&i) = self.approval_index.get(&approval.id) {
            self.approvals[i] = approval;
        } else {
            self.approval_index
                .insert(approval.id.clone(), self.approvals.len());
            self.approvals.push(approval);
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type Txn<'a> = Txn<'a>;
    type MutTxn<'a> = MutTxn<'a>;

    fn txn_begin(&self) -> Result<Txn<'_>, StoreError> {
        Ok(Txn {
            tables: self.tables.read(),
        })
    }

    fn mut_txn_begin(&self) -> Result<MutTxn<'_>, StoreError> {
        Ok(MutTxn {
            tables: self.tables.write(),
            tasks: Vec::new(),
            approvals: Vec::new(),
        })
    }
}

pub struct Txn<'a> {
    tables: RwLockReadGuard<'a, Tables>,
}

impl<'a> TxnT for Txn<'a> {
    fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.get_task(id).cloned())
    }

    fn tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tables.tasks.clone())
    }

    fn get_approval(&self, id: &ApprovalId) -> Result<Option<Approval>, StoreError> {
        Ok(self.tables.get_approval(id).cloned())
    }

    fn approvals_where(
        &self,
        pred: &mut dyn FnMut(&Approval) -> bool,
    ) -> Result<Vec<Approval>, StoreError> {
        Ok(self
            .tables
            .approvals
            .iter()
            .filter(|a| pred(*a))
            .cloned()
            .collect())
    }
}

/// Exclusive write transaction. Writes are staged and only reach the
/// tables on commit.
pub struct MutTxn<'a> {
    tables: RwLockWriteGuard<'a, Tables>,
    tasks: Vec<Task>,
    approvals: Vec<Approval>,
}

impl<'a> MutTxn<'a> {
    fn staged_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    fn staged_approval(&self, id: &ApprovalId) -> Option<&Approval> {
        self.approvals.iter().find(|a| &a.id == id)
    }
}

impl<'a> TxnT for MutTxn<'a> {
    fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self
            .staged_task(id)
            .or_else(|| self.tables.get_task(id))
            .cloned())
    }

    fn tasks(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tables
            .tasks
            .iter()
            .map(|t| self.staged_task(&t.id).unwrap_or(t).clone())
            .collect();
        tasks.extend(
            self.tasks
                .iter()
                .filter(|t| !self.tables.task_index.contains_key(&t.id))
                .cloned(),
        );
        Ok(tasks)
    }

    fn get_approval(&self, id: &ApprovalId) -> Result<Option<Approval>, StoreError> {
        Ok(self
            .staged_approval(id)
            .or_else(|| self.tables.get_approval(id))
            .cloned())
    }

    fn approvals_where(
        &self,
        pred: &mut dyn FnMut(&Approval) -> bool,
    ) -> Result<Vec<Approval>, StoreError> {
        let committed = self
            .tables
            .approvals
            .iter()
            .map(|a| self.staged_approval(&a.id).unwrap_or(a));
        let added = self
            .approvals
            .iter()
            .filter(|a| !self.tables.approval_index.contains_key(&a.id));
        Ok(committed
            .chain(added)
            .filter(|a| pred(*a))
            .cloned()
            .collect())
    }
}

impl<'a> MutTxnT for MutTxn<'a> {
    fn put_task(&mut self, task: Task) -> Result<(), StoreError> {
        if let Some(staged) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *staged = task;
        } else {
            self.tasks.push(task);
        }
        Ok(())
    }

    fn put_approval(&mut self, approval: Approval) -> Result<(), StoreError> {
        if let Some(staged) = self.approvals.iter_mut().find(|a| a.id == approval.id) {
            *staged = approval;
        } else {
            self.approvals.push(approval);
        }
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        let MutTxn {
            mut tables,
            tasks,
            approvals,
        } = self;
        debug!(
            "committing {} task(s), {} approval(s)",
            tasks.len(),
            approvals.len()
        );
        for task in tasks {
            tables.upsert_task(task);
        }
        for approval in approvals {
            tables.upsert_approval(approval);
        }
        Ok(())
    }
}
