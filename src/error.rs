//! Unified error type.

use std::error::Error as StdError;
use std::sync::Arc;

/// Shorthand for results carrying a routelog [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type flowing through intercepted calls.
///
/// Handler failures travel as [`Error::Handler`] and are handed back to the
/// caller untouched: the inner `Arc` is the same allocation the handler
/// created. The remaining variants are produced by the interception layer
/// itself or by the typed argument accessors on [`Args`](crate::Args).
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// The handler failed, synchronously or through its reply.
    #[error("{0}")]
    Handler(Arc<dyn StdError + Send + Sync + 'static>),

    /// A routed method handed back a plain value instead of an async reply.
    #[error("method returned no async result: {method}")]
    MissingAsyncResult { method: String },

    /// The handler panicked while being called or while its reply was polled.
    #[error("{method} panicked: {message}")]
    Panicked { method: String, message: String },

    /// The interception layer itself failed.
    #[error("interceptor failure: {0}")]
    Internal(String),

    /// Fewer live arguments than the route's bindings refer to.
    #[error("{method} expects at least {expected} arguments, got {actual}")]
    ArgumentCount { method: String, expected: usize, actual: usize },

    /// A required argument was null or absent.
    #[error("argument {index} is missing")]
    MissingArgument { index: usize },

    /// An argument holds a value of a different type than requested.
    #[error("argument {index} is not a {expected}")]
    ArgumentType { index: usize, expected: &'static str },

    /// A controller was asked to run a method it does not declare.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// A verb string that is not a known HTTP method.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The access log configuration could not be loaded.
    #[error("invalid access log config: {0}")]
    Config(String),
}

impl Error {
    /// Wraps a handler's own error.
    pub fn handler<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Handler(Arc::new(err))
    }

    /// A handler failure carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::handler(Message(message.into()))
    }

    /// Returns the wrapped handler error, if this is a handler failure.
    pub fn as_handler(&self) -> Option<&Arc<dyn StdError + Send + Sync + 'static>> {
        match self {
            Self::Handler(inner) => Some(inner),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);
