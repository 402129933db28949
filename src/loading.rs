//! Helpers for bringing a stored workflow back into a session.
//!
//! When a workflow recorded elsewhere is replayed, its steps have to be
//! wired to whatever artifacts the user has loaded. These functions answer
//! the bookkeeping questions that come up along the way; building any
//! actual forms or widgets is left to the host.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::graph::Workflow;
use crate::registry::Operation;
use crate::task::Task;
use crate::value::Arg;

/// Parameter names conventionally used for the image a step operates on.
/// They are bound to artifacts by the host, never to stored values.
pub const IMAGE_PARAMETERS: [&str; 3] = ["image", "label_image", "binary_image"];

/// Steps which consume at least one root, i.e. the entry points that need
/// an artifact supplied from outside.
pub fn steps_with_root_input(workflow: &Workflow) -> Vec<String> {
    let roots = workflow.roots();

    workflow
        .iter()
        .filter(|(_, task)| task.references().any(|name| roots.contains(name)))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Proposes a fresh artifact name for every step: `Result of <operation>`.
pub fn default_renames(workflow: &Workflow) -> IndexMap<String, String> {
    workflow
        .iter()
        .filter_map(|(name, task)| {
            let operation = task.operation()?;
            Some((name.to_string(), format!("Result of {}", operation.name())))
        })
        .collect()
}

/// Pairs the stored arguments of a task with its operation's declared
/// parameter names. Image parameters are left out, and so are extra
/// positional arguments without a declared name. Keyword arguments keep
/// their own names.
pub fn bind_parameters(task: &Task) -> IndexMap<String, Arg> {
    let Some(operation) = task.operation() else {
        return IndexMap::new();
    };

    let mut bound: IndexMap<String, Arg> = operation
        .params()
        .iter()
        .zip(task.args())
        .map(|(param, arg)| (param.clone(), arg.clone()))
        .collect();

    for (key, arg) in task.kwargs() {
        bound.entry(key.clone()).or_insert_with(|| arg.clone());
    }

    let skip: HashSet<&str> = IMAGE_PARAMETERS.into_iter().collect();
    bound.retain(|key, _| !skip.contains(key.as_str()));
    bound
}

/// For each reference argument of `step`, the parameter it binds and the
/// artifact it should be bound to, after applying `renames`. Names missing
/// from `renames` are kept as they are.
pub fn input_choices(
    workflow: &Workflow,
    step: &str,
    renames: Option<&IndexMap<String, String>>,
) -> IndexMap<String, String> {
    let Some(task) = workflow.get_task(step) else {
        return IndexMap::new();
    };
    let Some(operation) = task.operation() else {
        return IndexMap::new();
    };

    let positional = operation.params().iter().zip(task.args());
    let named = task.kwargs().iter();

    positional
        .chain(named)
        .filter_map(|(param, arg)| {
            let name = arg.as_reference()?;
            let name = renames
                .and_then(|renames| renames.get(name))
                .map(String::as_str)
                .unwrap_or(name);
            Some((param.clone(), name.to_string()))
        })
        .collect()
}

/// Name given to a new artifact produced by `operation`, or `None` if the
/// operation does not produce artifacts at all.
pub fn result_name(operation: &Operation) -> Option<String> {
    operation
        .kind()
        .is_artifact()
        .then(|| format!("{} result", operation.name()))
}
