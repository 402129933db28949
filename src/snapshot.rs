use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ResolveError;
use crate::graph::Workflow;
use crate::resolver::same_arg;
use crate::session::Session;
use crate::task::{Head, Task};

/// Frozen structural copy of a [`Workflow`], as kept in the history.
///
/// Only callable tasks are captured; raw data stored in the workflow (input
/// images and the like) is left behind. Array buffers referenced by literal
/// arguments are immutable and shared rather than copied.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    tasks: Arc<IndexMap<String, Task>>,
}

impl Snapshot {
    pub fn capture(workflow: &Workflow) -> Self {
        let tasks = workflow
            .iter()
            .filter(|(_, task)| task.is_callable())
            .map(|(name, task)| (name.to_string(), task.clone()))
            .collect();

        Self {
            tasks: Arc::new(tasks),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get_task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Rebuilds a live workflow from this snapshot.
    pub fn to_workflow(&self) -> Workflow {
        self.tasks
            .iter()
            .map(|(name, task)| (name.clone(), task.clone()))
            .collect()
    }

    /// Structural equality: same names, and under each name the same task.
    ///
    /// References compare by name and literals by value, except that arrays
    /// bound to a live artifact compare through the resolver. Fails when such
    /// an artifact has disappeared from the session, in which case equality
    /// cannot be determined.
    pub fn structurally_eq<S>(&self, other: &Snapshot, session: &S) -> Result<bool, ResolveError>
    where
        S: Session + ?Sized,
    {
        if Arc::ptr_eq(&self.tasks, &other.tasks) {
            return Ok(true);
        }

        if self.tasks.len() != other.tasks.len() {
            return Ok(false);
        }

        for (name, task) in self.tasks.iter() {
            let Some(theirs) = other.tasks.get(name) else {
                return Ok(false);
            };

            if !same_task(task, theirs, session)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl From<&Workflow> for Snapshot {
    fn from(workflow: &Workflow) -> Self {
        Snapshot::capture(workflow)
    }
}

impl From<Snapshot> for Workflow {
    fn from(snapshot: Snapshot) -> Self {
        snapshot.to_workflow()
    }
}

fn same_task<S>(a: &Task, b: &Task, session: &S) -> Result<bool, ResolveError>
where
    S: Session + ?Sized,
{
    let same_head = match (a.head(), b.head()) {
        (Head::Operation(a), Head::Operation(b)) => a == b,
        (Head::Data(a), Head::Data(b)) => a == b,
        _ => false,
    };

    if !same_head || a.args().len() != b.args().len() || a.kwargs().len() != b.kwargs().len() {
        return Ok(false);
    }

    for (x, y) in a.args().iter().zip(b.args()) {
        if !same_arg(x, y, session)? {
            return Ok(false);
        }
    }

    for (key, x) in a.kwargs() {
        let Some(y) = b.kwargs().get(key) else {
            return Ok(false);
        };
        if !same_arg(x, y, session)? {
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ArtifactKind, Operation};
    use crate::session::MemorySession;
    use crate::value::{ArrayData, Arg};

    fn op(name: &str) -> Operation {
        Operation::new(name, ["image", "sigma"], ArtifactKind::Image)
    }

    #[test]
    fn test_capture_skips_data() {
        let mut workflow = Workflow::new();
        workflow.set_data("raw", ArrayData::new(vec![1], vec![1.0]));
        workflow.set("blur", Task::new(op("blur"), [Arg::reference("raw")]));

        let snapshot = Snapshot::capture(&workflow);
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), ["blur"]);

        let restored = snapshot.to_workflow();
        assert_eq!(restored.len(), 1);
        assert!(restored.get_task("raw").is_none());
    }

    #[test]
    fn test_snapshot_does_not_follow_live_edits() {
        let mut workflow = Workflow::new();
        workflow.set("blur", Task::new(op("blur"), [Arg::reference("raw")]));

        let snapshot = Snapshot::capture(&workflow);
        workflow.set("blur", Task::new(op("blur"), [Arg::reference("other")]));
        workflow.remove("blur");

        assert_eq!(snapshot.get_task("blur").unwrap().args(), [Arg::reference("raw")]);
    }

    #[test]
    fn test_structural_equality() {
        let session = MemorySession::new();
        let mut a = Workflow::new();
        a.set("x", Task::new(op("blur"), [Arg::reference("raw"), Arg::literal(1.0)]));
        a.set("y", Task::new(op("sharpen"), [Arg::reference("x")]));

        // insertion order does not matter
        let mut b = Workflow::new();
        b.set("y", Task::new(op("sharpen"), [Arg::reference("x")]));
        b.set("x", Task::new(op("blur"), [Arg::reference("raw"), Arg::literal(1.0)]));

        let mut c = b.clone();
        c.set("x", Task::new(op("blur"), [Arg::reference("raw"), Arg::literal(2.0)]));

        let (a, b, c) = (Snapshot::from(&a), Snapshot::from(&b), Snapshot::from(&c));
        assert_eq!(a.structurally_eq(&b, &session), Ok(true));
        assert_eq!(a.structurally_eq(&c, &session), Ok(false));
    }

    #[test]
    fn test_kwargs_and_arity() {
        let session = MemorySession::new();
        let base = Task::new(op("blur"), [Arg::reference("raw")]);

        let mut a = Workflow::new();
        a.set("x", base.clone().with_kwarg("sigma", Arg::literal(1)));
        let mut b = Workflow::new();
        b.set("x", base.clone().with_kwarg("sigma", Arg::literal(2)));
        let mut c = Workflow::new();
        c.set("x", Task::new(op("blur"), [Arg::reference("raw"), Arg::literal(1)]));

        let (a, b, c) = (Snapshot::from(&a), Snapshot::from(&b), Snapshot::from(&c));
        assert_eq!(a.structurally_eq(&b, &session), Ok(false));
        assert_eq!(a.structurally_eq(&c, &session), Ok(false));
    }

    #[test]
    fn test_bound_array_compares_by_name() {
        let mut session = MemorySession::new();
        session.insert("raw", ArrayData::new(vec![2], vec![1.0, 2.0]));
        let bound = session.value("raw").unwrap();

        let mut a = Workflow::new();
        a.set("x", Task::new(op("blur"), [Arg::Literal(bound)]));
        let mut b = Workflow::new();
        b.set("x", Task::new(op("blur"), [Arg::reference("raw")]));

        let (a, b) = (Snapshot::from(&a), Snapshot::from(&b));
        assert_eq!(a.structurally_eq(&b, &session), Ok(true));

        session.remove("raw");
        assert_eq!(
            a.structurally_eq(&b, &session),
            Err(ResolveError::ArtifactGone("raw".into()))
        );
    }
}
