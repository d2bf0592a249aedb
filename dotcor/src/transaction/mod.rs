//! All-or-nothing execution of filesystem and registry changes.
//!
//! A [`Transaction`] runs [`Operation`]s in order and remembers each one that
//! succeeded. When a step fails, every earlier step is undone in reverse
//! order before the error is returned, so the filesystem ends up where it
//! started. A transaction that is dropped while still open rolls back the
//! same way.
//!
//! ```text
//!   Open ──commit()──▶ Committed
//!    │
//!    └──rollback() / failed execute()──▶ RolledBack
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use dotcor::transaction::{operations::CreateDir, Transaction};
//!
//! let mut tx = Transaction::new();
//! tx.execute(Box::new(CreateDir::new("/tmp/dotcor/files/shell"))).unwrap();
//! tx.commit().unwrap();
//! ```

pub mod builders;
pub mod operations;

use std::fmt;

use crate::error::{Error, Result, RollbackFailure};

/// One reversible step.
///
/// `undo` is only called after a successful `execute`, and at most once.
#[cfg_attr(test, mockall::automock)]
pub trait Operation {
    /// Perform the forward action.
    ///
    /// # Errors
    ///
    /// Returns the reason the action failed. A failing `execute` must leave
    /// nothing behind that needs undoing.
    fn execute(&mut self) -> Result<()>;

    /// Reverse a successful `execute`.
    ///
    /// # Errors
    ///
    /// Returns the reason the inverse action failed.
    fn undo(&mut self) -> Result<()>;

    /// Human-readable description used in errors and logs.
    fn description(&self) -> String;
}

/// Lifecycle state of a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Accepting operations.
    Open,
    /// Finished successfully; undo information discarded.
    Committed,
    /// Every executed operation has been undone (or attempted).
    RolledBack,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Committed => write!(f, "committed"),
            Self::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// An ordered group of operations that succeed or fail together.
pub struct Transaction {
    state: TransactionState,
    executed: Vec<Box<dyn Operation>>,
    planned: Vec<Box<dyn Operation>>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("state", &self.state)
            .field("executed", &self.executed.len())
            .field("planned", &self.planned.len())
            .finish()
    }
}

impl Transaction {
    /// Start an empty, open transaction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: TransactionState::Open,
            executed: Vec::new(),
            planned: Vec::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Number of operations executed and not yet undone or committed.
    #[must_use]
    pub fn executed_count(&self) -> usize {
        self.executed.len()
    }

    /// Descriptions of the queued operations, in execution order.
    #[must_use]
    pub fn planned_descriptions(&self) -> Vec<String> {
        self.planned.iter().map(|op| op.description()).collect()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == TransactionState::Open {
            Ok(())
        } else {
            Err(Error::TransactionClosed {
                state: self.state.to_string(),
            })
        }
    }

    /// Run `op` now.
    ///
    /// On failure every previously executed operation is undone and the
    /// transaction is closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] if the transaction is not open,
    /// or [`Error::OperationFailed`] naming the failed step, carrying its
    /// error and any undo failures.
    pub fn execute(&mut self, mut op: Box<dyn Operation>) -> Result<()> {
        self.ensure_open()?;
        let description = op.description();
        log::debug!("executing: {description}");

        match op.execute() {
            Ok(()) => {
                self.executed.push(op);
                Ok(())
            }
            Err(source) => {
                log::warn!("{description} failed: {source}; rolling back");
                self.planned.clear();
                let rollback_failures = self.undo_all();
                self.state = TransactionState::RolledBack;
                Err(Error::OperationFailed {
                    description,
                    source: Box::new(source),
                    rollback_failures,
                })
            }
        }
    }

    /// Queue `op` for [`Transaction::execute_all`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] if the transaction is not open.
    pub fn plan(&mut self, op: Box<dyn Operation>) -> Result<()> {
        self.ensure_open()?;
        self.planned.push(op);
        Ok(())
    }

    /// Move every operation of `other` into this transaction.
    ///
    /// Operations `other` already executed become this transaction's to
    /// undo. Its queued operations run after the ones queued here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] if either transaction is not
    /// open.
    pub fn append(&mut self, mut other: Transaction) -> Result<()> {
        self.ensure_open()?;
        other.ensure_open()?;
        self.executed.append(&mut other.executed);
        self.planned.append(&mut other.planned);
        Ok(())
    }

    /// Execute every queued operation in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failure; see [`Transaction::execute`].
    pub fn execute_all(&mut self) -> Result<()> {
        self.ensure_open()?;
        let planned: Vec<_> = self.planned.drain(..).collect();
        for op in planned {
            self.execute(op)?;
        }
        Ok(())
    }

    /// Undo every executed operation, most recent first.
    ///
    /// Every undo is attempted even if an earlier one fails. Rolling back an
    /// already rolled back transaction does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CannotRollbackCommitted`] after a commit, or
    /// [`Error::RollbackIncomplete`] listing each undo that failed.
    pub fn rollback(&mut self) -> Result<()> {
        match self.state {
            TransactionState::Committed => return Err(Error::CannotRollbackCommitted),
            TransactionState::RolledBack => return Ok(()),
            TransactionState::Open => {}
        }
        self.planned.clear();
        let failures = self.undo_all();
        self.state = TransactionState::RolledBack;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::RollbackIncomplete { failures })
        }
    }

    /// Make the executed operations permanent.
    ///
    /// Committing twice is a no-op. Queued but unexecuted operations are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] if the transaction was rolled
    /// back.
    pub fn commit(&mut self) -> Result<()> {
        match self.state {
            TransactionState::Committed => Ok(()),
            TransactionState::RolledBack => Err(Error::TransactionClosed {
                state: self.state.to_string(),
            }),
            TransactionState::Open => {
                log::debug!("committing {} operations", self.executed.len());
                self.executed.clear();
                self.planned.clear();
                self.state = TransactionState::Committed;
                Ok(())
            }
        }
    }

    fn undo_all(&mut self) -> Vec<RollbackFailure> {
        let mut failures = Vec::new();
        while let Some(mut op) = self.executed.pop() {
            let description = op.description();
            match op.undo() {
                Ok(()) => log::debug!("undid: {description}"),
                Err(e) => {
                    log::warn!("undo of '{description}' failed: {e}");
                    failures.push(RollbackFailure {
                        description,
                        message: e.to_string(),
                    });
                }
            }
        }
        failures
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.state == TransactionState::Open && !self.executed.is_empty() {
            log::warn!(
                "transaction dropped with {} uncommitted operations; rolling back",
                self.executed.len()
            );
            for failure in self.undo_all() {
                log::error!("rollback incomplete: {failure}");
            }
            self.state = TransactionState::RolledBack;
        }
    }
}
