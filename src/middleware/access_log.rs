//! One access line per completed call.
//!
//! ```text
//! <VERB> <path>[, req=<body>][<query>][, rsp=<response>][, error=<message>], time=<ms>
//! ```
//!
//! Lines with an error go to the sink's error level, all others to info.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::Level;

use crate::args::Value;
use crate::config::AccessLogConfig;
use crate::method::Method;

// ── AccessRecord ──────────────────────────────────────────────────────────────

/// Everything logged about one intercepted call. Built per call, dropped
/// once emitted.
#[derive(Clone)]
pub struct AccessRecord {
    pub verb: Method,
    pub path: String,
    pub body: Option<Value>,
    pub query: String,
    pub response: Option<Value>,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl AccessRecord {
    /// Formats the access line, cutting payloads longer than `max_payload`
    /// characters.
    pub fn line(&self, max_payload: Option<usize>) -> String {
        let mut out = format!("{} {}", self.verb, self.path);
        if let Some(body) = &self.body {
            out.push_str(", req=");
            push_payload(&mut out, body, max_payload);
        }
        out.push_str(&self.query);
        if let Some(rsp) = &self.response {
            out.push_str(", rsp=");
            push_payload(&mut out, rsp, max_payload);
        }
        if let Some(err) = &self.error {
            out.push_str(", error=");
            out.push_str(err);
        }
        out.push_str(&format!(", time={}", self.elapsed.as_millis()));
        out
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

fn push_payload(out: &mut String, v: &Value, max: Option<usize>) {
    let rendered = v.to_string();
    match max {
        Some(max) if rendered.chars().count() > max => {
            out.extend(rendered.chars().take(max));
            out.push_str("...");
        }
        _ => out.push_str(&rendered),
    }
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Where access lines go. Must accept lines from many tasks at once; each
/// call carries one complete line.
pub trait AccessSink: Send + Sync + 'static {
    fn info(&self, line: &str);
    fn error(&self, line: &str);
}

/// Emits through `tracing`, tagged with the controller name.
#[derive(Clone, Debug)]
pub struct TracingSink {
    controller: String,
}

impl TracingSink {
    pub fn new(controller: impl Into<String>) -> Self {
        Self { controller: controller.into() }
    }
}

impl AccessSink for TracingSink {
    fn info(&self, line: &str) {
        tracing::info!(controller = %self.controller, "{line}");
    }

    fn error(&self, line: &str) {
        tracing::error!(controller = %self.controller, "{line}");
    }
}

/// One line captured by a [`MemorySink`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Emission {
    pub level: Level,
    pub line: String,
}

/// Keeps every line in memory. Meant for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<Emission>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> Vec<Emission> {
        self.lines.lock().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.at(Level::INFO)
    }

    pub fn errors(&self) -> Vec<String> {
        self.at(Level::ERROR)
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }

    fn at(&self, level: Level) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.line.clone())
            .collect()
    }

    fn push(&self, level: Level, line: &str) {
        self.lines.lock().push(Emission { level, line: line.to_owned() });
    }
}

impl AccessSink for MemorySink {
    fn info(&self, line: &str) {
        self.push(Level::INFO, line);
    }

    fn error(&self, line: &str) {
        self.push(Level::ERROR, line);
    }
}

// ── AccessLogger ──────────────────────────────────────────────────────────────

/// Formats [`AccessRecord`]s and hands them to the injected sink.
///
/// Cheap to clone: a completion observer carries its own copy.
#[derive(Clone)]
pub struct AccessLogger {
    sink: Arc<dyn AccessSink>,
    config: Arc<AccessLogConfig>,
}

impl AccessLogger {
    pub fn new(sink: Arc<dyn AccessSink>) -> Self {
        Self { sink, config: Arc::new(AccessLogConfig::default()) }
    }

    pub fn with_config(mut self, config: AccessLogConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &AccessLogConfig {
        &self.config
    }

    /// Emits exactly one line for `record`, unless logging is disabled.
    pub fn log(&self, record: &AccessRecord) {
        if !self.config.enabled {
            return;
        }
        let line = record.line(self.config.max_payload_len);
        if record.is_error() {
            self.sink.error(&line);
        } else {
            self.sink.info(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::value;

    struct Student {
        id: Option<u32>,
        first_name: &'static str,
    }

    impl std::fmt::Display for Student {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self.id {
                Some(id) => write!(f, "{{id:{id},firstName:\"{}\"}}", self.first_name),
                None => write!(f, "{{firstName:\"{}\"}}", self.first_name),
            }
        }
    }

    fn add_student() -> AccessRecord {
        AccessRecord {
            verb: Method::Post,
            path: "/student/add".into(),
            body: Some(value(Student { id: None, first_name: "Ann" })),
            query: String::new(),
            response: Some(value(Student { id: Some(1), first_name: "Ann" })),
            error: None,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn success_line() {
        assert_eq!(
            add_student().line(None),
            r#"POST /student/add, req={firstName:"Ann"}, rsp={id:1,firstName:"Ann"}, time=5"#
        );
    }

    #[test]
    fn failure_line_has_no_response() {
        let record = AccessRecord {
            response: None,
            error: Some("not found".into()),
            ..add_student()
        };
        assert_eq!(
            record.line(None),
            r#"POST /student/add, req={firstName:"Ann"}, error=not found, time=5"#
        );
    }

    #[test]
    fn optional_fragments_are_omitted() {
        let record = AccessRecord {
            verb: Method::Get,
            path: "/book/all".into(),
            body: None,
            query: ", page=2, size=10".into(),
            response: None,
            error: None,
            elapsed: Duration::from_micros(1500),
        };
        assert_eq!(record.line(None), "GET /book/all, page=2, size=10, time=1");
    }

    #[test]
    fn long_payloads_are_cut() {
        assert_eq!(
            add_student().line(Some(6)),
            "POST /student/add, req={first..., rsp={id:1,..., time=5"
        );
    }

    #[test]
    fn routes_by_level() {
        let sink = Arc::new(MemorySink::new());
        let logger = AccessLogger::new(sink.clone());

        logger.log(&add_student());
        logger.log(&AccessRecord { error: Some("boom".into()), ..add_student() });

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.infos().len(), 1);
        assert!(sink.errors()[0].ends_with("error=boom, time=5"));
    }

    #[test]
    fn disabled_logger_emits_nothing() {
        let sink = Arc::new(MemorySink::new());
        let logger = AccessLogger::new(sink.clone())
            .with_config(AccessLogConfig { enabled: false, ..Default::default() });

        logger.log(&add_student());
        assert!(sink.is_empty());
    }
}
