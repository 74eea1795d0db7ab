//! Live call arguments and opaque payload values.
//!
//! The interception layer never looks inside a payload: it only needs the
//! `Display` rendering for the access log. Handlers get their typed values
//! back through [`Args::get`] / [`Args::required`], which downcast.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::Error;

/// Anything that can travel through an intercepted call as an argument or
/// a response.
///
/// Blanket-implemented for every `Display + Send + Sync + 'static` type, so
/// you never implement it yourself. Give your DTO a `Display` impl instead.
pub trait Payload: fmt::Display + Any + Send + Sync {
    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;
}

impl<T> Payload for T
where
    T: fmt::Display + Any + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for dyn Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A shared, type-erased payload.
pub type Value = Arc<dyn Payload>;

/// Wraps a concrete payload into a [`Value`].
pub fn value<T: Payload>(v: T) -> Value {
    Arc::new(v)
}

fn downcast<T: Payload>(p: &dyn Payload) -> Option<&T> {
    Payload::as_any(p).downcast_ref::<T>()
}

/// The ordered argument list of one call. Each slot may be null.
#[derive(Clone, Default)]
pub struct Args {
    slots: Vec<Option<Value>>,
}

impl Args {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Appends a non-null argument. Returns `self` for chaining.
    pub fn arg<T: Payload>(mut self, v: T) -> Self {
        self.slots.push(Some(value(v)));
        self
    }

    /// Appends a null argument.
    pub fn null(mut self) -> Self {
        self.slots.push(None);
        self
    }

    /// Appends an optional argument; `None` becomes a null slot.
    pub fn opt<T: Payload>(mut self, v: Option<T>) -> Self {
        self.slots.push(v.map(value));
        self
    }

    pub fn len(&self) -> usize { self.slots.len() }
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    /// The raw slot at `index`. Out of range reads as null.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Typed access to a nullable argument.
    ///
    /// Returns `Ok(None)` for a null or absent slot and
    /// [`Error::ArgumentType`] when the slot holds some other type.
    pub fn get<T: Payload>(&self, index: usize) -> Result<Option<&T>, Error> {
        match self.value(index) {
            None => Ok(None),
            Some(v) => downcast::<T>(&**v)
                .map(Some)
                .ok_or(Error::ArgumentType { index, expected: type_name::<T>() }),
        }
    }

    /// Typed access to an argument that must be present.
    pub fn required<T: Payload>(&self, index: usize) -> Result<&T, Error> {
        self.get::<T>(index)?.ok_or(Error::MissingArgument { index })
    }
}

impl FromIterator<Option<Value>> for Args {
    fn from_iter<I: IntoIterator<Item = Option<Value>>>(iter: I) -> Self {
        Self { slots: iter.into_iter().collect() }
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|s| match s {
                Some(v) => v.to_string(),
                None => "null".to_owned(),
            }))
            .finish()
    }
}
