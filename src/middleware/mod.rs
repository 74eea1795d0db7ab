//! Middleware layer.
//!
//! Middleware wraps calls and is the right place for cross-cutting
//! concerns. This module holds the two halves of access logging:
//!
//! - [`intercept`]: the [`Intercepted`] decorator that wraps every routed
//!   method of a controller
//! - [`access_log`]: line formatting and the sinks lines are emitted to

pub mod access_log;
pub mod intercept;

pub use access_log::{AccessLogger, AccessRecord, AccessSink, Emission, MemorySink, TracingSink};
pub use intercept::{Intercepted, instrument, instrument_traced};
