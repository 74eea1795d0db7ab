//! The call-wrapping decorator.
//!
//! [`Intercepted`] holds a controller, the route table scanned from it and
//! an [`AccessLogger`]. It implements [`Controller`] itself, so callers use
//! it exactly like the controller it wraps.
//!
//! # Per-call flow
//!
//! ```text
//! Received ── no route ──▶ PassThrough ──▶ Done
//!    │
//!    └─ route ─▶ Invoking ─┬─ Err / panic / no async reply ─▶ Logged ─▶ Done
//!                          └─ Async reply ─▶ (Ok | Err | panic) ─▶ Logged ─▶ Done
//! ```
//!
//! Every routed call is logged exactly once. A routed call always returns
//! `Ok(Returned::Async(_))`; failures travel inside the reply.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tokio::time::Instant;
use tracing::info;

use crate::args::{Args, Value};
use crate::descriptor::{MethodDescriptor, Signature};
use crate::error::Error;
use crate::handler::{Controller, Outcome, Reply, Returned, failed};
use crate::method::Method;
use crate::middleware::access_log::{AccessLogger, AccessRecord, AccessSink, TracingSink};
use crate::path;
use crate::route::{RouteEntry, RouteTable};

/// Wraps `controller` with access logging to `sink`.
///
/// This is the registration step: it scans the controller's descriptors
/// once and logs the registration.
pub fn instrument<C: Controller>(controller: C, sink: Arc<dyn AccessSink>) -> Intercepted<C> {
    Intercepted::new(controller, AccessLogger::new(sink))
}

/// Wraps `controller`, logging through `tracing` under the controller's name.
pub fn instrument_traced<C: Controller>(controller: C) -> Intercepted<C> {
    let sink = Arc::new(TracingSink::new(controller.name()));
    instrument(controller, sink)
}

/// A controller with every routed method wrapped in access logging.
pub struct Intercepted<C> {
    inner: Arc<C>,
    routes: Arc<RouteTable>,
    logger: AccessLogger,
}

impl<C: Controller> Intercepted<C> {
    pub fn new(controller: C, logger: AccessLogger) -> Self {
        let routes = RouteTable::scan(&controller);
        info!(
            controller = controller.name(),
            routes = routes.len(),
            "registering controller"
        );
        Self { inner: Arc::new(controller), routes: Arc::new(routes), logger }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn logger(&self) -> &AccessLogger {
        &self.logger
    }

    /// Runs `method` on the wrapped controller.
    ///
    /// Methods without a route go straight through and their result is
    /// returned as is. Routed methods always yield an async reply that logs
    /// one access line when it settles.
    pub fn intercept(&self, method: &Signature, args: Args) -> Result<Returned, Error> {
        let Some(route) = self.routes.get(method) else {
            return self.inner.call(method, args);
        };

        let reply = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(route, method, args)))
            .unwrap_or_else(|payload| {
                failed(Error::Internal(panic_message(&*payload)))
            });
        Ok(Returned::Async(reply))
    }

    fn dispatch(&self, route: &RouteEntry, method: &Signature, args: Args) -> Reply {
        if !route.covers(&args) {
            let err = Error::ArgumentCount {
                method: method.to_string(),
                expected: route.min_arity(),
                actual: args.len(),
            };
            let call = Call::unresolved(route);
            return settled(call.settle(&self.logger, Err(err), Instant::now()));
        }

        let call = Call::capture(route, &args);
        let started = Instant::now();

        let returned = panic::catch_unwind(AssertUnwindSafe(|| self.inner.call(method, args)))
            .unwrap_or_else(|payload| Err(panicked(method, &*payload)));

        let reply = match returned {
            Ok(Returned::Async(reply)) => reply,
            Ok(Returned::Value(_)) => {
                let err = Error::MissingAsyncResult { method: method.to_string() };
                return settled(call.settle(&self.logger, Err(err), started));
            }
            Err(err) => return settled(call.settle(&self.logger, Err(err), started)),
        };

        let logger = self.logger.clone();
        let method = method.to_string();
        Box::pin(async move {
            let outcome: Outcome = AssertUnwindSafe(reply)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(Error::Panicked {
                    message: panic_message(&*payload),
                    method,
                }));
            call.settle(&logger, outcome, started)
        })
    }
}

impl<C: Controller> Controller for Intercepted<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn base_path(&self) -> &str {
        self.inner.base_path()
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        self.inner.methods()
    }

    fn call(&self, method: &Signature, args: Args) -> Result<Returned, Error> {
        self.intercept(method, args)
    }
}

impl<C> Clone for Intercepted<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            routes: Arc::clone(&self.routes),
            logger: self.logger.clone(),
        }
    }
}

// ── Per-call capture ──────────────────────────────────────────────────────────

/// Display values captured before the handler runs.
#[derive(Clone)]
struct Call {
    verb: Method,
    path: String,
    body: Option<Value>,
    query: String,
}

impl Call {
    fn capture(route: &RouteEntry, args: &Args) -> Self {
        let resolved = path::resolve(route, args);
        Self {
            verb: route.verb(),
            path: resolved.path,
            body: route.body_index().and_then(|i| args.value(i).cloned()),
            query: resolved.query,
        }
    }

    fn unresolved(route: &RouteEntry) -> Self {
        Self {
            verb: route.verb(),
            path: route.path_template().to_owned(),
            body: None,
            query: String::new(),
        }
    }

    /// Logs the line for `outcome` and hands the outcome back.
    ///
    /// Rendering runs user `Display` impls and the sink is user code, so
    /// either may panic. A panic turns the outcome into `Error::Internal`,
    /// and a line without payloads is still attempted for it.
    fn settle(&self, logger: &AccessLogger, outcome: Outcome, started: Instant) -> Outcome {
        let logged = panic::catch_unwind(AssertUnwindSafe(|| {
            let record = match &outcome {
                Ok(rsp) => self.finish(rsp.clone(), None, started),
                Err(err) => self.finish(None, Some(err), started),
            };
            logger.log(&record);
        }));
        let Err(payload) = logged else {
            return outcome;
        };

        let err = Error::Internal(panic_message(&*payload));
        let bare = Self { body: None, ..self.clone() };
        // The sink itself may be what panicked; nothing more to do then.
        let _ = panic::catch_unwind(AssertUnwindSafe(|| {
            logger.log(&bare.finish(None, Some(&err), started));
        }));
        Err(err)
    }

    fn finish(&self, response: Option<Value>, error: Option<&Error>, started: Instant) -> AccessRecord {
        AccessRecord {
            verb: self.verb,
            path: self.path.clone(),
            body: self.body.clone(),
            query: self.query.clone(),
            response,
            error: error.map(ToString::to_string),
            elapsed: started.elapsed(),
        }
    }
}

fn settled(outcome: Outcome) -> Reply {
    Box::pin(std::future::ready(outcome))
}

fn panicked(method: &Signature, payload: &(dyn Any + Send)) -> Error {
    Error::Panicked { method: method.to_string(), message: panic_message(payload) }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Param;
    use crate::middleware::access_log::MemorySink;

    struct Echo;

    impl Controller for Echo {
        fn base_path(&self) -> &str { "/echo" }

        fn methods(&self) -> Vec<MethodDescriptor> {
            vec![
                MethodDescriptor::new("say").post("say").param(Param::of::<String>("text").body()),
                MethodDescriptor::new("version"),
            ]
        }

        fn call(&self, method: &Signature, args: Args) -> Result<Returned, Error> {
            match method.name() {
                "say" => {
                    let text = args.required::<String>(0)?.clone();
                    Ok(Returned::deferred(async move { Ok(Some(text)) }))
                }
                "version" => Ok(Returned::value("1.0")),
                _ => Err(Error::UnknownMethod(method.to_string())),
            }
        }
    }

    fn echo() -> (Intercepted<Echo>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (instrument(Echo, sink.clone()), sink)
    }

    fn say() -> Signature {
        Signature::new("say").param::<String>()
    }

    #[tokio::test]
    async fn logs_after_the_reply_settles() {
        let (echo, sink) = echo();
        let returned = echo.intercept(&say(), Args::new().arg("hi".to_owned())).unwrap();
        assert!(sink.is_empty());

        let out = returned.await.unwrap().unwrap();
        assert_eq!(out.to_string(), "hi");
        assert_eq!(sink.infos().len(), 1);
        assert!(sink.infos()[0].starts_with("POST /echo/say, req=hi, rsp=hi, time="));
    }

    #[tokio::test]
    async fn unrouted_method_passes_through() {
        let (echo, sink) = echo();
        let out = echo.intercept(&Signature::new("version"), Args::new()).unwrap();
        assert!(!out.is_async());
        assert_eq!(out.await.unwrap().unwrap().to_string(), "1.0");
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn short_argument_list_fails_and_logs_once() {
        let (echo, sink) = echo();
        let err = echo.intercept(&say(), Args::new()).unwrap().await.unwrap_err();
        assert!(matches!(err, Error::ArgumentCount { expected: 1, actual: 0, .. }));
        assert_eq!(sink.errors().len(), 1);
        assert!(sink.errors()[0].starts_with("POST /echo/say, error="));
    }

    struct BrokenSink;

    impl AccessSink for BrokenSink {
        fn info(&self, _: &str) {
            panic!("sink down");
        }

        fn error(&self, _: &str) {
            panic!("sink down");
        }
    }

    #[tokio::test]
    async fn panicking_sink_becomes_an_internal_error() {
        let echo = instrument(Echo, Arc::new(BrokenSink));

        let ok = echo.intercept(&say(), Args::new().arg("hi".to_owned())).unwrap().await;
        let short = echo.intercept(&say(), Args::new()).unwrap().await;

        assert!(matches!(ok, Err(Error::Internal(m)) if m == "sink down"));
        assert!(matches!(short, Err(Error::Internal(m)) if m == "sink down"));
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "opaque panic payload");
    }
}
