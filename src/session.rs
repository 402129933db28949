//! The live side of a workflow.
//!
//! A session holds the artifacts a user currently sees, e.g. the layers of
//! an image viewer. The graph only ever stores names and literal arguments;
//! whenever it needs to know what is live right now, it asks a [`Session`].

use indexmap::IndexMap;

use crate::value::Literal;

/// Contract a hosting application provides to the workflow core.
pub trait Session {
    /// Names of all live artifacts, in display order.
    fn artifact_names(&self) -> Vec<String>;

    /// Current value of a live artifact.
    fn value(&self, name: &str) -> Option<Literal>;

    fn contains(&self, name: &str) -> bool {
        self.artifact_names().iter().any(|live| live == name)
    }

    /// Marks an artifact as up to date with its recorded task, or as stale
    /// because something upstream changed. Unknown names are ignored.
    fn set_valid(&mut self, _name: &str, _valid: bool) {}
}

#[derive(Clone, Debug)]
struct Artifact {
    value: Literal,
    valid: bool,
}

/// Session kept entirely in memory, for headless use and for tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySession {
    artifacts: IndexMap<String, Artifact>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a live artifact. Array values are bound to `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Literal>) {
        let name = name.into();
        let value = match value.into() {
            Literal::Array(array) => Literal::Array(array.bound_to(name.as_str())),
            other => other,
        };

        self.artifacts
            .insert(name, Artifact { value, valid: true });
    }

    pub fn remove(&mut self, name: &str) -> Option<Literal> {
        self.artifacts
            .shift_remove(name)
            .map(|artifact| artifact.value)
    }

    pub fn is_valid(&self, name: &str) -> Option<bool> {
        self.artifacts.get(name).map(|artifact| artifact.valid)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl Session for MemorySession {
    fn artifact_names(&self) -> Vec<String> {
        self.artifacts.keys().cloned().collect()
    }

    fn value(&self, name: &str) -> Option<Literal> {
        self.artifacts
            .get(name)
            .map(|artifact| artifact.value.clone())
    }

    fn contains(&self, name: &str) -> bool {
        self.artifacts.contains_key(name)
    }

    fn set_valid(&mut self, name: &str, valid: bool) {
        if let Some(artifact) = self.artifacts.get_mut(name) {
            artifact.valid = valid;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ArrayData;

    #[test]
    fn test_arrays_are_bound_on_insert() {
        let mut session = MemorySession::new();
        session.insert("raw", ArrayData::new(vec![2], vec![0.0, 1.0]));

        let value = session.value("raw").unwrap();
        assert_eq!(value.as_array().and_then(ArrayData::origin), Some("raw"));
    }

    #[test]
    fn test_order_and_validity() {
        let mut session = MemorySession::new();
        session.insert("b", 1);
        session.insert("a", 2);
        session.set_valid("a", false);
        session.set_valid("missing", false);

        assert_eq!(session.artifact_names(), ["b", "a"]);
        assert_eq!(session.is_valid("a"), Some(false));
        assert_eq!(session.is_valid("missing"), None);

        session.remove("b");
        assert!(!session.contains("b"));
        assert_eq!(session.len(), 1);
    }
}
