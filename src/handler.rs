//! Controller trait and the type-erased async reply.
//!
//! # How calls are represented
//!
//! A controller exposes many methods with different argument and result
//! types, yet the interceptor must hold all of them behind one interface.
//! Arguments are therefore passed as [`Args`] (a list of type-erased
//! [`Value`]s) and results come back as a [`Returned`]:
//!
//! ```text
//! intercepted.call(&sig, args)                    ← caller
//!        ↓ route lookup, path resolution
//! controller.call(&sig, args)                     ← one vtable dispatch
//!        ↓
//! Returned::deferred(async { … Ok(Some(dto)) })   ← handler builds its reply
//!        ↓
//! Box::pin(observer(reply))                       ← Reply = BoxFuture
//! ```
//!
//! Awaiting a [`Returned`] directly yields the final
//! `Result<Option<Value>, Error>`, whichever variant it is.

use std::any::type_name;
use std::future::{Future, IntoFuture};
use std::pin::Pin;

use crate::args::{Args, Payload, Value, value};
use crate::descriptor::{MethodDescriptor, Signature};
use crate::error::Error;

/// A heap-allocated, type-erased future.
///
/// `Send + 'static` so the reply can complete on whichever worker the
/// runtime picks, long after the call that produced it returned.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What an async reply eventually produces: a response (possibly empty) or
/// a failure.
pub type Outcome = Result<Option<Value>, Error>;

/// An asynchronous single-value result.
pub type Reply = BoxFuture<Outcome>;

/// What a controller method hands back.
pub enum Returned {
    /// An async reply. The only shape a routed method may return.
    Async(Reply),
    /// A plain value, or nothing.
    Value(Option<Value>),
}

impl Returned {
    /// An async reply resolving to an optional typed response.
    pub fn deferred<F, T>(fut: F) -> Self
    where
        F: Future<Output = Result<Option<T>, Error>> + Send + 'static,
        T: Payload,
    {
        Self::Async(Box::pin(async move { fut.await.map(|v| v.map(value)) }))
    }

    /// An async reply with no response value.
    pub fn deferred_empty<F>(fut: F) -> Self
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        Self::Async(Box::pin(async move { fut.await.map(|()| None) }))
    }

    /// An async reply that has already failed.
    pub fn failed(err: Error) -> Self {
        Self::Async(failed(err))
    }

    /// A plain synchronous value.
    pub fn value<T: Payload>(v: T) -> Self {
        Self::Value(Some(value(v)))
    }

    /// No value at all.
    pub fn unit() -> Self {
        Self::Value(None)
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl IntoFuture for Returned {
    type Output = Outcome;
    type IntoFuture = Reply;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Async(reply) => reply,
            Self::Value(v) => Box::pin(std::future::ready(Ok(v))),
        }
    }
}

impl std::fmt::Debug for Returned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Async(_) => f.write_str("Async(..)"),
            Self::Value(Some(v)) => write!(f, "Value({v})"),
            Self::Value(None) => f.write_str("Value(null)"),
        }
    }
}

pub(crate) fn failed(err: Error) -> Reply {
    Box::pin(std::future::ready(Err(err)))
}

// ── Controller ────────────────────────────────────────────────────────────────

/// A handler-bearing object: a set of methods, described once and called
/// by [`Signature`].
///
/// ```rust
/// use routelog::{Args, Controller, Error, MethodDescriptor, Param, Returned, Signature};
///
/// struct Greeter;
///
/// impl Controller for Greeter {
///     fn base_path(&self) -> &str { "/greet" }
///
///     fn methods(&self) -> Vec<MethodDescriptor> {
///         vec![MethodDescriptor::new("hello")
///             .get("{name}")
///             .param(Param::of::<String>("name").path_variable())]
///     }
///
///     fn call(&self, method: &Signature, args: Args) -> Result<Returned, Error> {
///         match method.name() {
///             "hello" => {
///                 let name = args.required::<String>(0)?.clone();
///                 Ok(Returned::deferred(async move { Ok(Some(format!("hello, {name}"))) }))
///             }
///             _ => Err(Error::UnknownMethod(method.to_string())),
///         }
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// Used in diagnostics and as the `controller` log field.
    fn name(&self) -> &str {
        let full = type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Path prefix shared by every mapped method. May be empty.
    fn base_path(&self) -> &str {
        ""
    }

    /// Every method this controller declares, mapped or not.
    fn methods(&self) -> Vec<MethodDescriptor>;

    /// Runs `method`.
    ///
    /// An `Err` is a synchronous failure: the method failed before producing
    /// anything.
    fn call(&self, method: &Signature, args: Args) -> Result<Returned, Error>;
}
