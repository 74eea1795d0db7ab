//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use routelog::{
    Args, Controller, Error, Intercepted, MemorySink, Method, MethodDescriptor, Param, Returned,
    ReturnShape, Signature, instrument,
};

pub struct AddStudent {
    pub first_name: String,
}

impl fmt::Display for AddStudent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{firstName:\"{}\"}}", self.first_name)
    }
}

pub struct Student {
    pub id: i64,
    pub first_name: String,
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{id:{},firstName:\"{}\"}}", self.id, self.first_name)
    }
}

/// A response whose rendering panics.
pub struct Garbled;

impl fmt::Display for Garbled {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        panic!("garbled display")
    }
}

/// A controller exercising every interception path.
pub struct Students {
    /// Returned by `add` when set, instead of a student.
    pub failure: Option<Error>,
    pub delay: Duration,
}

impl Default for Students {
    fn default() -> Self {
        Self { failure: None, delay: Duration::from_millis(5) }
    }
}

impl Controller for Students {
    fn base_path(&self) -> &str {
        "/student"
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("add")
                .post("add")
                .param(Param::of::<AddStudent>("dto").body()),
            MethodDescriptor::new("get")
                .get("{id}")
                .param(Param::of::<i64>("id").path_variable()),
            MethodDescriptor::new("get")
                .get("/by-name/{name}")
                .param(Param::of::<String>("name").path_variable()),
            MethodDescriptor::new("search")
                .get("search")
                .param(Param::of::<u32>("page").query())
                .param(Param::of::<u32>("size").query()),
            MethodDescriptor::new("remove")
                .request(Method::Delete, "{id}")
                .param(Param::of::<i64>("id").path_variable()),
            MethodDescriptor::new("explode").post("explode"),
            MethodDescriptor::new("crash").post("crash"),
            MethodDescriptor::new("crashLater").post("crash-later"),
            MethodDescriptor::new("forgetful").get("forgetful"),
            MethodDescriptor::new("count").get("count").returns(ReturnShape::Value),
            MethodDescriptor::new("garbled").get("garbled"),
            MethodDescriptor::new("health"),
            MethodDescriptor::new("echo").param(Param::of::<String>("text")),
        ]
    }

    fn call(&self, method: &Signature, args: Args) -> Result<Returned, Error> {
        let delay = self.delay;
        match method.name() {
            "add" => {
                let first_name = args.required::<AddStudent>(0)?.first_name.clone();
                let failure = self.failure.clone();
                Ok(Returned::deferred(async move {
                    tokio::time::sleep(delay).await;
                    match failure {
                        Some(err) => Err(err),
                        None => Ok(Some(Student { id: 1, first_name })),
                    }
                }))
            }
            "get" if *method == Signature::new("get").param::<i64>() => {
                let id = *args.required::<i64>(0)?;
                Ok(Returned::deferred(async move {
                    Ok(Some(Student { id, first_name: "Ann".into() }))
                }))
            }
            "get" => {
                let name = args.required::<String>(0)?.clone();
                Ok(Returned::deferred(async move { Ok(Some(Student { id: 9, first_name: name })) }))
            }
            "search" | "remove" => Ok(Returned::deferred_empty(async { Ok(()) })),
            "explode" => Err(Error::msg("refused")),
            "crash" => panic!("crashed before replying"),
            "crashLater" => Ok(Returned::deferred_empty(crash_later())),
            "forgetful" => Ok(Returned::unit()),
            "count" => Ok(Returned::value(3_usize)),
            "garbled" => Ok(Returned::deferred(async { Ok(Some(Garbled)) })),
            "health" => Ok(Returned::value("ok")),
            "echo" => Ok(Returned::Value(args.value(0).cloned())),
            _ => Err(Error::UnknownMethod(method.to_string())),
        }
    }
}

async fn crash_later() -> Result<(), Error> {
    panic!("crashed while replying")
}

pub fn students(controller: Students) -> (Intercepted<Students>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (instrument(controller, sink.clone()), sink)
}

pub fn add() -> Signature {
    Signature::new("add").param::<AddStudent>()
}

pub fn ann() -> Args {
    Args::new().arg(AddStudent { first_name: "Ann".into() })
}

/// The `time=` value of an access line.
pub fn elapsed_ms(line: &str) -> u128 {
    line.rsplit("time=").next().and_then(|t| t.parse().ok()).unwrap_or(u128::MAX)
}
