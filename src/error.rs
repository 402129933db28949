use thiserror::Error;

/// A literal is bound to a live artifact which the session no longer holds.
///
/// This only ever shows up while comparing two graphs. The history
/// controller turns it into a warning instead of failing the edit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Artifact '{0}' no longer exists in the session")]
    ArtifactGone(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Setting '{name}' would introduce a cycle")]
    Cycle { name: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Operation '{0}' is already registered")]
    Duplicate(String),

    #[error("Operation '{0}' is not registered")]
    Unknown(String),
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
