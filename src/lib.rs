//! # routelog
//!
//! Declarative access logging for async request handlers.
//! Describe each handler method once; every call is logged once.
//!
//! ## The contract
//!
//! A [`Controller`] declares its methods with [`MethodDescriptor`]s: verb,
//! path template, and the role of each parameter (body, path variable,
//! query parameter). [`instrument`] scans those descriptors into a
//! read-only [`RouteTable`] and hands back an [`Intercepted`] wrapper.
//! Calling a routed method through the wrapper:
//!
//! - resolves the path template against the live arguments
//! - captures the request body and query parameters
//! - runs the real method
//! - logs one line when the async reply settles, success or failure
//!
//! ```text
//! POST /student/add, req={firstName:"Ann"}, rsp={id:1,firstName:"Ann"}, time=5
//! GET /student/7, error=Student is not found by ID 7, time=0
//! ```
//!
//! Methods without a route pass straight through, unlogged.
//!
//! What routelog does *not* do: match incoming request paths, parse or
//! serialize payloads, persist logs, or retry failed calls. Payloads are
//! only ever rendered with `Display`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use routelog::{
//!     Args, Controller, Error, MemorySink, MethodDescriptor, Param, Returned, Signature,
//!     instrument,
//! };
//!
//! struct Books;
//!
//! impl Controller for Books {
//!     fn base_path(&self) -> &str { "/book" }
//!
//!     fn methods(&self) -> Vec<MethodDescriptor> {
//!         vec![MethodDescriptor::new("getById")
//!             .get("{id}")
//!             .param(Param::of::<i64>("id").path_variable())]
//!     }
//!
//!     fn call(&self, method: &Signature, args: Args) -> Result<Returned, Error> {
//!         match method.name() {
//!             "getById" => {
//!                 let id = *args.required::<i64>(0)?;
//!                 Ok(Returned::deferred(async move {
//!                     Ok(Some(format!("book #{id}")))
//!                 }))
//!             }
//!             _ => Err(Error::UnknownMethod(method.to_string())),
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let sink = Arc::new(MemorySink::new());
//!     let books = instrument(Books, sink.clone());
//!
//!     let sig = Signature::new("getById").param::<i64>();
//!     let reply = books.intercept(&sig, Args::new().arg(42_i64)).unwrap();
//!     reply.await.unwrap();
//!
//!     assert!(sink.infos()[0].starts_with("GET /book/42, rsp=book #42, time="));
//! }
//! ```

mod args;
mod config;
mod descriptor;
mod error;
mod handler;
mod method;
mod route;

pub mod middleware;
pub mod path;

pub use args::{Args, Payload, Value, value};
pub use config::AccessLogConfig;
pub use descriptor::{Marker, MethodDescriptor, Param, RequestMapping, ReturnShape, Signature};
pub use error::{Error, Result};
pub use handler::{BoxFuture, Controller, Outcome, Reply, Returned};
pub use method::Method;
pub use middleware::{
    AccessLogger, AccessRecord, AccessSink, Intercepted, MemorySink, TracingSink, instrument,
    instrument_traced,
};
pub use route::{ParameterBinding, Role, RouteEntry, RouteTable, join_path, normalize_path};
