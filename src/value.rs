//! Values that can appear as task arguments.
//!
//! There are two sides to this module. [`Param`] is what a caller hands over
//! when recording a step: it may be a live artifact handle, a plain value, or
//! the session context itself. [`Arg`] is what actually gets stored in the
//! graph after the resolver has normalized a `Param`: either a reference to
//! another artifact by name, or a literal value.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Dense numeric array, e.g. the pixel buffer of an image.
///
/// The buffer is shared, so cloning an `ArrayData` never copies pixels. An
/// array handed out by a session remembers the artifact it was read from
/// (its *origin*); this is what lets two snapshots compare such arrays by
/// artifact name rather than by content.
#[derive(Clone, Debug)]
pub struct ArrayData {
    shape: Vec<usize>,
    data: Arc<[f64]>,
    origin: Option<Arc<str>>,
}

impl ArrayData {
    pub fn new(shape: impl Into<Vec<usize>>, data: impl Into<Arc<[f64]>>) -> Self {
        Self {
            shape: shape.into(),
            data: data.into(),
            origin: None,
        }
    }

    /// Marks this buffer as the current value of the live artifact `name`.
    pub fn bound_to(mut self, name: impl Into<Arc<str>>) -> Self {
        self.origin = Some(name.into());
        self
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Name of the live artifact this buffer was taken from, if any.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Whether both values share the very same buffer.
    pub fn same_buffer(&self, other: &ArrayData) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

// Shapes are compared first, so arrays of different shapes are simply
// unequal. The origin is bookkeeping and never part of the value.
impl PartialEq for ArrayData {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape
            && (self.same_buffer(other)
                || self.data.len() == other.data.len()
                    && self.data.iter().zip(other.data.iter()).all(|(a, b)| same_float(*a, *b)))
    }
}

/// Floats compare by bit pattern, so a NaN argument still equals itself.
fn same_float(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}

/// A plain value stored as a task argument.
#[derive(Clone, Debug)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Literal>),
    Array(ArrayData),
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::None, Literal::None) => true,
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            (Literal::Int(a), Literal::Int(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => same_float(*a, *b),
            (Literal::Text(a), Literal::Text(b)) => a == b,
            (Literal::List(a), Literal::List(b)) => a == b,
            (Literal::Array(a), Literal::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Literal {
    pub fn as_array(&self) -> Option<&ArrayData> {
        match self {
            Literal::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::None => write!(f, "None"),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value:?}"),
            Literal::Text(value) => write!(f, "{value:?}"),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Literal::Array(array) => write!(f, "array{:?}", array.shape()),
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value.into())
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<ArrayData> for Literal {
    fn from(value: ArrayData) -> Self {
        Literal::Array(value)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(value: Vec<T>) -> Self {
        Literal::List(value.into_iter().map(Into::into).collect())
    }
}

/// An argument as stored in the graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// Output of another task, or a root input supplied from outside.
    Reference(String),
    /// Any other value.
    Literal(Literal),
}

impl Arg {
    pub fn reference(name: impl Into<String>) -> Self {
        Arg::Reference(name.into())
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Arg::Literal(value.into())
    }

    /// The referenced artifact name, if this is a reference.
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Arg::Reference(name) => Some(name),
            Arg::Literal(_) => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Arg::Reference(_))
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Reference(name) => write!(f, "@{name}"),
            Arg::Literal(value) => write!(f, "{value}"),
        }
    }
}

/// An argument as supplied by a caller, before normalization.
#[derive(Clone, Debug)]
pub enum Param {
    /// Handle to a live artifact, known by its current name.
    Artifact(String),
    /// A value. Text matching a live artifact name, or an array sharing a
    /// live artifact's buffer, is still turned into a reference.
    Value(Literal),
    /// The session context itself, as passed along by GUI glue. Never stored.
    Context,
}

impl Param {
    pub fn artifact(name: impl Into<String>) -> Self {
        Param::Artifact(name.into())
    }

    pub fn value(value: impl Into<Literal>) -> Self {
        Param::Value(value.into())
    }

    pub fn is_context(&self) -> bool {
        matches!(self, Param::Context)
    }
}

impl From<Literal> for Param {
    fn from(value: Literal) -> Self {
        Param::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_shape_mismatch_is_unequal() {
        let a = ArrayData::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
        let b = ArrayData::new(vec![4], vec![1.0, 2.0, 3.0, 4.0]);
        let c = ArrayData::new(vec![3], vec![1.0, 2.0, 3.0]);

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(Literal::from(a), Literal::from(c));
    }

    #[test]
    fn test_array_equality_ignores_origin() {
        let a = ArrayData::new(vec![2], vec![1.0, 2.0]);
        let b = a.clone().bound_to("image");

        assert!(a.same_buffer(&b));
        assert_eq!(a, b);
        assert_eq!(b.origin(), Some("image"));
    }

    #[test]
    fn test_nan_equals_itself() {
        assert_eq!(Literal::Float(f64::NAN), Literal::Float(f64::NAN));
        assert_ne!(Literal::Float(0.0), Literal::Float(-0.0));
        assert_ne!(Literal::Float(1.0), Literal::Int(1));

        let a = ArrayData::new(vec![2], vec![f64::NAN, 1.0]);
        let b = ArrayData::new(vec![2], vec![f64::NAN, 1.0]);
        assert!(!a.same_buffer(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let array = ArrayData::new(vec![3, 4], vec![0.0; 12]);
        assert_eq!(Literal::from(array).to_string(), "array[3, 4]");
        assert_eq!(Arg::reference("blobs").to_string(), "@blobs");
        assert_eq!(Arg::literal(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Arg::literal(2.0).to_string(), "2.0");
    }
}
