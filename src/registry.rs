use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::RegistryError;

/// The kind of artifact an operation declares it returns.
///
/// Resolved once when the operation is registered, so nothing downstream
/// has to inspect values at runtime to decide what a result is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ArtifactKind {
    /// Intensity image.
    Image,
    /// Label image, one integer id per object.
    Labels,
    /// Anything else; such results are not shown as artifacts.
    #[default]
    Other,
}

impl ArtifactKind {
    /// Whether results of this kind become live artifacts in a session.
    pub fn is_artifact(self) -> bool {
        matches!(self, ArtifactKind::Image | ArtifactKind::Labels)
    }
}

struct Signature {
    name: Arc<str>,
    params: Vec<String>,
    kind: ArtifactKind,
}

/// A cheap, comparable handle to a named operation.
///
/// Two handles are equal when they name the same operation, regardless of
/// whether they came from the same [`Registry`].
#[derive(Clone)]
pub struct Operation(Arc<Signature>);

impl Operation {
    pub fn new<I, S>(name: impl Into<Arc<str>>, params: I, kind: ArtifactKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Arc::new(Signature {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            kind,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Declared parameter names, in positional order.
    pub fn params(&self) -> &[String] {
        &self.0.params
    }

    pub fn kind(&self) -> ArtifactKind {
        self.0.kind
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for Operation {}

impl Debug for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.0.name)
            .field("params", &self.0.params)
            .field("kind", &self.0.kind)
            .finish()
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Catalogue of the operations a session knows how to record.
#[derive(Default)]
pub struct Registry {
    operations: IndexMap<Arc<str>, Operation>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation under a unique name and returns its handle.
    pub fn register<I, S>(
        &mut self,
        name: &str,
        params: I,
        kind: ArtifactKind,
    ) -> Result<Operation, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.operations.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        let operation = Operation::new(name, params, kind);
        self.operations
            .insert(Arc::from(name), operation.clone());

        tracing::debug!("registered operation {}", name);
        Ok(operation)
    }

    pub fn get(&self, name: &str) -> Result<Operation, RegistryError> {
        self.operations
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
