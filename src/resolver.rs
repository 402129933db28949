//! Boundary between live artifacts and stored arguments.
//!
//! Callers hand over whatever they have at hand, live handles included. The
//! graph must only ever see names and plain values, so every argument goes
//! through [`name_or_value`] before it is stored. Comparisons between graphs
//! go through [`identity`] so that a buffer bound to a live artifact compares
//! by that artifact's name.

use crate::error::ResolveError;
use crate::session::Session;
use crate::value::{Arg, Literal, Param};

/// Returns the live value for `name`, if the session still holds it.
pub fn resolve<S>(name: &str, session: &S) -> Option<Literal>
where
    S: Session + ?Sized,
{
    session.value(name)
}

/// Normalizes a caller-supplied parameter into a storable argument.
///
/// * a live artifact handle becomes a reference to its name;
/// * text naming a live artifact becomes a reference;
/// * an array sharing its buffer with a live artifact becomes a reference;
/// * anything else is stored as a literal.
///
/// The session context itself is not storable and yields `None`.
pub fn name_or_value<S>(param: &Param, session: &S) -> Option<Arg>
where
    S: Session + ?Sized,
{
    match param {
        Param::Context => None,
        Param::Artifact(name) => Some(Arg::Reference(name.clone())),
        Param::Value(Literal::Text(text)) if session.contains(text) => {
            Some(Arg::Reference(text.clone()))
        }
        Param::Value(Literal::Array(array)) => {
            let owner = session.artifact_names().into_iter().find(|name| {
                matches!(session.value(name), Some(Literal::Array(live)) if live.same_buffer(array))
            });

            Some(match owner {
                Some(name) => Arg::Reference(name),
                None => Arg::Literal(Literal::Array(array.clone())),
            })
        }
        Param::Value(value) => Some(Arg::Literal(value.clone())),
    }
}

/// The key under which an argument is compared with another one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Identity<'a> {
    Name(&'a str),
    Value(&'a Literal),
}

/// Computes the comparison key of a stored argument.
///
/// References compare by name. An array bound to a live artifact compares
/// by that artifact's name while the artifact still holds the same buffer,
/// and by value once the artifact moved on to a new buffer. If the artifact
/// is gone altogether there is no way to tell, and this fails.
pub fn identity<'a, S>(arg: &'a Arg, session: &S) -> Result<Identity<'a>, ResolveError>
where
    S: Session + ?Sized,
{
    match arg {
        Arg::Reference(name) => Ok(Identity::Name(name)),
        Arg::Literal(literal @ Literal::Array(array)) => match array.origin() {
            None => Ok(Identity::Value(literal)),
            Some(origin) => match session.value(origin) {
                None => Err(ResolveError::ArtifactGone(origin.to_string())),
                Some(Literal::Array(live)) if live.same_buffer(array) => Ok(Identity::Name(origin)),
                Some(_) => Ok(Identity::Value(literal)),
            },
        },
        Arg::Literal(literal) => Ok(Identity::Value(literal)),
    }
}

/// Compares two stored arguments under the name-or-value rule.
pub fn same_arg<S>(a: &Arg, b: &Arg, session: &S) -> Result<bool, ResolveError>
where
    S: Session + ?Sized,
{
    Ok(identity(a, session)? == identity(b, session)?)
}
