//! Scanner diagnostics, captured through a `tracing` subscriber.

mod common;

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use routelog::RouteTable;
use tracing::Level;

use common::Students;

/// Collects everything the fmt subscriber writes.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock()).lines().map(str::to_owned).collect()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn scan_with_logs() -> (RouteTable, Vec<String>) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .finish();

    let table = tracing::subscriber::with_default(subscriber, || {
        RouteTable::scan(&Students::default())
    });
    (table, captured.lines())
}

#[test]
fn non_async_mapped_method_is_skipped_with_a_warning() {
    let (table, lines) = scan_with_logs();

    assert!(table.iter().all(|e| e.signature().name() != "count"));
    let warned: Vec<_> = lines
        .iter()
        .filter(|l| l.contains("WARN") && l.contains("not intercepted"))
        .collect();
    assert_eq!(warned.len(), 1, "{lines:#?}");
    assert!(warned[0].contains("method=count()"), "{}", warned[0]);
    assert!(warned[0].contains("controller=\"Students\""), "{}", warned[0]);
}

#[test]
fn unmapped_methods_are_skipped_quietly() {
    let (table, lines) = scan_with_logs();

    assert!(table.iter().all(|e| !matches!(e.signature().name(), "health" | "echo")));
    assert!(!lines.iter().any(|l| l.contains("health") || l.contains("echo(")));
}

#[test]
fn registered_routes_are_logged_at_debug() {
    let (table, lines) = scan_with_logs();

    let registered = lines.iter().filter(|l| l.contains("route registered")).count();
    assert_eq!(registered, table.len());
    assert!(lines.iter().any(|l| {
        l.contains("DEBUG") && l.contains("method=add(AddStudent)") && l.contains("path=\"/student/add\"")
    }));
}
