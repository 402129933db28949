//! Snapshot-based undo and redo.
//!
//! The [`History`] runs actions against a workflow it does not own and keeps
//! whole-workflow snapshots on two stacks. Snapshots are taken lazily: right
//! before an action runs, the current workflow is compared with the newest
//! undo entry, and only pushed if the previous edits actually changed
//! something. Idempotent or failed edits therefore never leave empty steps
//! behind in the undo stack.

use crate::action::Action;
use crate::error::WorkflowError;
use crate::graph::Workflow;
use crate::session::Session;
use crate::snapshot::Snapshot;

/// How [`History::execute`] classified the workflow before running an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// History is frozen, nothing was recorded.
    Frozen,
    /// First entry ever; the workflow was pushed.
    NoHistory,
    /// Task count differs from the newest entry; the workflow was pushed.
    CountChanged,
    /// Same task count, different tasks; the workflow was pushed.
    ContentChanged,
    /// Nothing changed since the newest entry; nothing was pushed.
    Unchanged,
    /// Equality could not be determined because a live artifact is gone.
    /// Treated like [`Outcome::Unchanged`].
    Undetermined,
}

impl Outcome {
    /// Whether an undo entry was recorded.
    pub fn pushed(self) -> bool {
        matches!(
            self,
            Outcome::NoHistory | Outcome::CountChanged | Outcome::ContentChanged
        )
    }
}

/// Settings for a [`History`].
#[derive(Clone, Debug, Default)]
pub struct HistoryOptions {
    /// Start out frozen.
    pub frozen: bool,
    /// Upper bound on the number of undo entries. The oldest entries are
    /// discarded first. Unlimited when `None`.
    pub max_depth: Option<usize>,
}

impl HistoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// Undo/redo controller.
///
/// Owns both stacks; the live [`Workflow`] stays with the caller and is lent
/// to every call.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    frozen: bool,
    max_depth: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: HistoryOptions) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            frozen: options.frozen,
            max_depth: options.max_depth,
        }
    }

    /// Runs `action` against `workflow`, first recording the workflow as an
    /// undo entry if it changed since the newest one.
    ///
    /// The action always runs. If it fails, the undo entry recorded for it is
    /// taken back and the redo stack is restored, then the error is returned.
    pub fn execute<A>(
        &mut self,
        action: &A,
        workflow: &mut Workflow,
        session: &mut dyn Session,
    ) -> Result<Outcome, WorkflowError>
    where
        A: Action + ?Sized,
    {
        if self.frozen {
            action.execute(workflow, session)?;
            return Ok(Outcome::Frozen);
        }

        let current = Snapshot::capture(workflow);
        let outcome = self.classify(&current, session);
        tracing::debug!("history: {:?}", outcome);

        let redo = if outcome.pushed() {
            self.undo_stack.push(current);
            Some(std::mem::take(&mut self.redo_stack))
        } else {
            None
        };

        if let Err(err) = action.execute(workflow, session) {
            if let Some(redo) = redo {
                self.undo_stack.pop();
                self.redo_stack = redo;
            }
            return Err(err);
        }

        self.trim();
        Ok(outcome)
    }

    /// Steps back. Returns the workflow to install as the live one, or `None`
    /// if there is nothing to undo.
    pub fn undo(&mut self, workflow: &Workflow) -> Option<Snapshot> {
        let snapshot = self.undo_stack.pop()?;

        if !self.frozen {
            self.redo_stack.push(Snapshot::capture(workflow));
        }

        tracing::info!(
            "undo ({} left, {} to redo)",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        Some(snapshot)
    }

    /// Steps forward again after an [`undo`](History::undo).
    pub fn redo(&mut self, workflow: &Workflow) -> Option<Snapshot> {
        let snapshot = self.redo_stack.pop()?;

        if !self.frozen {
            self.undo_stack.push(Snapshot::capture(workflow));
            self.trim();
        }

        tracing::info!(
            "redo ({} left, {} to undo)",
            self.redo_stack.len(),
            self.undo_stack.len()
        );
        Some(snapshot)
    }

    /// Undoes and installs the result into `workflow` in one go. Returns
    /// whether anything happened. Raw data entries of `workflow` are not part
    /// of snapshots and are gone afterwards.
    pub fn undo_into(&mut self, workflow: &mut Workflow) -> bool {
        match self.undo(workflow) {
            Some(snapshot) => {
                *workflow = snapshot.to_workflow();
                true
            }
            None => false,
        }
    }

    /// Counterpart of [`History::undo_into`].
    pub fn redo_into(&mut self, workflow: &mut Workflow) -> bool {
        match self.redo(workflow) {
            Some(snapshot) => {
                *workflow = snapshot.to_workflow();
                true
            }
            None => false,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// While frozen, actions still run but neither stack is touched.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Newest undo entry.
    pub fn peek_undo(&self) -> Option<&Snapshot> {
        self.undo_stack.last()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn classify(&self, current: &Snapshot, session: &dyn Session) -> Outcome {
        let Some(top) = self.undo_stack.last() else {
            return Outcome::NoHistory;
        };

        if top.len() != current.len() {
            return Outcome::CountChanged;
        }

        match current.structurally_eq(top, session) {
            Ok(true) => Outcome::Unchanged,
            Ok(false) => Outcome::ContentChanged,
            Err(err) => {
                tracing::warn!("cannot determine layer from artifact, undo impaired: {}", err);
                Outcome::Undetermined
            }
        }
    }

    fn trim(&mut self) {
        if let Some(max) = self.max_depth
            && self.undo_stack.len() > max
        {
            let excess = self.undo_stack.len() - max;
            self.undo_stack.drain(..excess);
        }
    }
}
