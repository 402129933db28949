use std::fmt::{Display, Formatter};

use indexmap::IndexMap;

use crate::registry::Operation;
use crate::value::{Arg, Literal};

/// What sits in the callable slot of a task.
#[derive(Clone, Debug, PartialEq)]
pub enum Head {
    /// The task reproduces its artifact by calling this operation.
    Operation(Operation),
    /// Raw data stored directly under a name, e.g. an input image. Not
    /// callable, so it never makes it into a snapshot.
    Data(Literal),
}

/// A recorded function call: an operation and the arguments it was given.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    head: Head,
    args: Vec<Arg>,
    kwargs: IndexMap<String, Arg>,
}

impl Task {
    pub fn new(operation: Operation, args: impl IntoIterator<Item = Arg>) -> Self {
        Self {
            head: Head::Operation(operation),
            args: args.into_iter().collect(),
            kwargs: IndexMap::new(),
        }
    }

    /// A task holding data instead of a call.
    pub fn data(value: impl Into<Literal>) -> Self {
        Self {
            head: Head::Data(value.into()),
            args: Vec::new(),
            kwargs: IndexMap::new(),
        }
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: Arg) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    pub fn with_kwargs(mut self, kwargs: impl IntoIterator<Item = (String, Arg)>) -> Self {
        self.kwargs.extend(kwargs);
        self
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn operation(&self) -> Option<&Operation> {
        match &self.head {
            Head::Operation(operation) => Some(operation),
            Head::Data(_) => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.head, Head::Operation(_))
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn kwargs(&self) -> &IndexMap<String, Arg> {
        &self.kwargs
    }

    /// Names referenced by this task, positional arguments first.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .chain(self.kwargs.values())
            .filter_map(Arg::as_reference)
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.head {
            Head::Operation(operation) => write!(f, "{operation}(")?,
            Head::Data(value) => return write!(f, "{value}"),
        }

        let mut first = true;
        for arg in &self.args {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{arg}")?;
        }
        for (key, arg) in &self.kwargs {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{key}={arg}")?;
        }

        write!(f, ")")
    }
}
