//! Edits to a workflow, packaged as values.
//!
//! An action is built up front with everything it needs, then handed to the
//! [`History`](crate::History), which decides whether the edit deserves an
//! undo entry before running it.

use std::fmt::{Display, Formatter};

use crate::error::WorkflowError;
use crate::graph::Workflow;
use crate::registry::Operation;
use crate::resolver::name_or_value;
use crate::session::Session;
use crate::task::Task;
use crate::value::{Literal, Param};

/// Keyword under which GUI glue tends to pass the session context along.
const CONTEXT_KWARG: &str = "viewer";

/// A single edit to a workflow.
pub trait Action: Display {
    /// Applies the edit. Mutating `workflow` (and marking artifacts in the
    /// session) is the only effect.
    fn execute(
        &self,
        workflow: &mut Workflow,
        session: &mut dyn Session,
    ) -> Result<(), WorkflowError>;
}

/// Drops every task whose artifact is no longer live in the session.
pub fn kill_zombies(workflow: &mut Workflow, session: &dyn Session) -> Vec<String> {
    let live = session.artifact_names();
    workflow.remove_all_except(&live)
}

/// Records (or re-records) how an artifact was produced.
///
/// Arguments are normalized through the resolver, the session context is
/// never stored, and zombie tasks are cleaned up afterwards. The target is
/// then marked valid in the session and everything downstream of it stale.
///
/// The target itself has to be live in the session, otherwise the zombie
/// cleanup removes the freshly recorded task right away.
pub struct UpdateStep {
    target: String,
    operation: Operation,
    params: Vec<Param>,
    kwargs: Vec<(String, Param)>,
    previous: Option<Task>,
    verify_acyclic: bool,
}

impl UpdateStep {
    pub fn new(
        workflow: &Workflow,
        target: impl Into<String>,
        operation: Operation,
        params: impl IntoIterator<Item = Param>,
    ) -> Self {
        let target = target.into();
        let previous = workflow.get_task(&target).cloned();

        Self {
            target,
            operation,
            params: params.into_iter().collect(),
            kwargs: Vec::new(),
            previous,
            verify_acyclic: false,
        }
    }

    pub fn kwarg(mut self, key: impl Into<String>, param: impl Into<Param>) -> Self {
        self.kwargs.push((key.into(), param.into()));
        self
    }

    /// Reject the edit with [`GraphError::Cycle`](crate::GraphError::Cycle)
    /// instead of recording a task that depends on itself.
    pub fn verify_acyclic(mut self, verify: bool) -> Self {
        self.verify_acyclic = verify;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn build_task(&self, session: &dyn Session) -> Task {
        let mut params = self.params.as_slice();
        if let Some((last, rest)) = params.split_last()
            && last.is_context()
        {
            params = rest;
        }

        // a context anywhere else cannot be stored either and resolves to None
        let args = params
            .iter()
            .filter_map(|param| name_or_value(param, session));

        let kwargs = self
            .kwargs
            .iter()
            .filter(|(key, param)| !param.is_context() && key != CONTEXT_KWARG)
            .filter_map(|(key, param)| name_or_value(param, session).map(|arg| (key.clone(), arg)));

        Task::new(self.operation.clone(), args).with_kwargs(kwargs)
    }
}

impl Action for UpdateStep {
    fn execute(
        &self,
        workflow: &mut Workflow,
        session: &mut dyn Session,
    ) -> Result<(), WorkflowError> {
        let task = self.build_task(session);

        if self.verify_acyclic {
            workflow.try_set(self.target.as_str(), task)?;
        } else {
            workflow.set(self.target.as_str(), task);
        }

        kill_zombies(workflow, session);

        session.set_valid(&self.target, true);
        for follower in workflow.followers_of(&self.target) {
            session.set_valid(&follower, false);
        }

        Ok(())
    }
}

impl Display for UpdateStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let change = match self.previous {
            Some(_) => "changed",
            None => "added",
        };

        let args: Vec<String> = self.params.iter().filter_map(describe).collect();
        let kwargs: Vec<String> = self
            .kwargs
            .iter()
            .filter_map(|(key, param)| describe(param).map(|value| format!("{key}: {value}")))
            .collect();

        writeln!(f, "Function: {} {}", self.operation, change)?;
        writeln!(f, "    args: [{}]", args.join(", "))?;
        writeln!(f, "    kwargs: {{{}}}", kwargs.join(", "))?;
        writeln!(f, "    layer name: {}", self.target)
    }
}

/// Short form of a parameter for descriptions. Array data and the session
/// context are left out.
fn describe(param: &Param) -> Option<String> {
    match param {
        Param::Artifact(name) => Some(format!("@{name}")),
        Param::Value(Literal::Array(_)) | Param::Context => None,
        Param::Value(value) => Some(value.to_string()),
    }
}

/// Drops tasks whose artifacts have left the session.
#[derive(Default)]
pub struct RemoveZombies;

impl Action for RemoveZombies {
    fn execute(
        &self,
        workflow: &mut Workflow,
        session: &mut dyn Session,
    ) -> Result<(), WorkflowError> {
        kill_zombies(workflow, session);
        Ok(())
    }
}

impl Display for RemoveZombies {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Remove zombies")
    }
}

/// Forgets the task producing one artifact.
pub struct RemoveArtifact {
    name: String,
    previous: Option<Task>,
}

impl RemoveArtifact {
    pub fn new(workflow: &Workflow, name: impl Into<String>) -> Self {
        let name = name.into();
        let previous = workflow.get_task(&name).cloned();
        Self { name, previous }
    }
}

impl Action for RemoveArtifact {
    fn execute(&self, workflow: &mut Workflow, _: &mut dyn Session) -> Result<(), WorkflowError> {
        workflow.remove(&self.name);
        Ok(())
    }
}

impl Display for RemoveArtifact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Layer removed: {}", self.name)?;
        if let Some(task) = &self.previous {
            writeln!(f, "    task: {task}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::registry::ArtifactKind;
    use crate::session::MemorySession;
    use crate::value::{ArrayData, Arg};

    fn blur() -> Operation {
        Operation::new("gaussian_blur", ["image", "sigma"], ArtifactKind::Image)
    }

    fn session() -> MemorySession {
        let mut session = MemorySession::new();
        session.insert("raw", ArrayData::new(vec![2], vec![1.0, 2.0]));
        session.insert("blurred", ArrayData::new(vec![2], vec![1.5, 1.5]));
        session
    }

    #[test]
    fn test_update_normalizes_arguments() {
        let mut session = session();
        let mut workflow = Workflow::new();
        let raw = session.value("raw").unwrap();

        let action = UpdateStep::new(
            &workflow,
            "blurred",
            blur(),
            [Param::Value(raw), Param::value(2.0), Param::Context],
        )
        .kwarg("viewer", Param::value("ignored"))
        .kwarg("ctx", Param::Context)
        .kwarg("mode", Param::value("nearest"));

        action.execute(&mut workflow, &mut session).unwrap();

        let task = workflow.get_task("blurred").unwrap();
        assert_eq!(task.args(), [Arg::reference("raw"), Arg::literal(2.0)]);
        assert_eq!(task.kwargs().len(), 1);
        assert_eq!(task.kwargs()["mode"], Arg::literal("nearest"));
        assert_eq!(workflow.roots().iter().collect::<Vec<_>>(), ["raw"]);
    }

    #[test]
    fn test_update_removes_zombies_and_marks_followers() {
        let mut session = session();
        session.insert("labels", 0);

        let mut workflow = Workflow::new();
        workflow.set("gone", Task::new(blur(), [Arg::reference("raw")]));
        workflow.set("labels", Task::new(blur(), [Arg::reference("blurred")]));

        let action = UpdateStep::new(&workflow, "blurred", blur(), [Param::artifact("raw")]);
        action.execute(&mut workflow, &mut session).unwrap();

        assert_eq!(workflow.keys().collect::<Vec<_>>(), ["labels", "blurred"]);
        assert_eq!(session.is_valid("blurred"), Some(true));
        assert_eq!(session.is_valid("labels"), Some(false));
    }

    #[test]
    fn test_update_of_dead_target_is_dropped() {
        let mut session = session();
        let mut workflow = Workflow::new();

        UpdateStep::new(&workflow, "not live", blur(), [Param::artifact("raw")])
            .execute(&mut workflow, &mut session)
            .unwrap();

        assert!(workflow.is_empty());
    }

    #[test]
    fn test_update_verify_acyclic() {
        let mut session = session();
        let mut workflow = Workflow::new();
        workflow.set("raw", Task::new(blur(), [Arg::reference("blurred")]));

        let action = UpdateStep::new(&workflow, "blurred", blur(), [Param::artifact("raw")])
            .verify_acyclic(true);
        let err = action.execute(&mut workflow, &mut session).unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Graph(GraphError::Cycle { ref name }) if name == "blurred"
        ));
        assert!(!workflow.contains("blurred"));
    }

    #[test]
    fn test_remove_actions() {
        let mut session = session();
        let mut workflow = Workflow::new();
        workflow.set("blurred", Task::new(blur(), [Arg::reference("raw")]));
        workflow.set("zombie", Task::new(blur(), [Arg::reference("raw")]));

        RemoveZombies.execute(&mut workflow, &mut session).unwrap();
        assert_eq!(workflow.keys().collect::<Vec<_>>(), ["blurred"]);

        let action = RemoveArtifact::new(&workflow, "blurred");
        action.execute(&mut workflow, &mut session).unwrap();
        assert!(workflow.is_empty());

        // removing again is a no-op
        action.execute(&mut workflow, &mut session).unwrap();
        assert!(action.to_string().starts_with("Layer removed: blurred"));
    }

    #[test]
    fn test_update_description() {
        let mut workflow = Workflow::new();
        let raw = ArrayData::new(vec![2], vec![1.0, 2.0]);

        let added = UpdateStep::new(
            &workflow,
            "blurred",
            blur(),
            [Param::value(raw), Param::value(2.0), Param::Context],
        )
        .kwarg("mode", Param::value("nearest"));

        assert_eq!(
            added.to_string(),
            "Function: gaussian_blur added\n    args: [2.0]\n    kwargs: {mode: \"nearest\"}\n    layer name: blurred\n"
        );

        workflow.set("blurred", Task::new(blur(), [Arg::reference("raw")]));
        let changed = UpdateStep::new(&workflow, "blurred", blur(), [Param::artifact("raw")]);
        assert!(changed.to_string().starts_with("Function: gaussian_blur changed"));
    }
}
