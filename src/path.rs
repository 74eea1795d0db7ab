//! Path and query rendering for the access log.
//!
//! This is a best-effort diagnostic renderer, not a strict one: a null path
//! variable leaves its `{name}` placeholder in place rather than failing.

use crate::args::Args;
use crate::route::{RouteEntry, Role};

/// The display values of one call: the resolved path and the query
/// diagnostic.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Resolved {
    pub path: String,
    pub query: String,
}

/// Renders the path and query diagnostic of `entry` for a live call.
///
/// Every occurrence of `{name}` is replaced by the matching argument's
/// `Display` output when that argument is non-null. Query parameters render
/// as `, name=value` in declaration order, with `null` for missing values.
pub fn resolve(entry: &RouteEntry, args: &Args) -> Resolved {
    Resolved {
        path: resolve_path(entry, args),
        query: query_diagnostic(entry, args),
    }
}

pub fn resolve_path(entry: &RouteEntry, args: &Args) -> String {
    let mut path = entry.path_template().to_owned();
    for b in entry.bindings() {
        let Role::PathVariable(name) = &b.role else { continue };
        if let Some(v) = args.value(b.argument_index) {
            path = path.replace(&format!("{{{name}}}"), &v.to_string());
        }
    }
    path
}

pub fn query_diagnostic(entry: &RouteEntry, args: &Args) -> String {
    let mut out = String::new();
    for b in entry.bindings() {
        let Role::QueryParam(name) = &b.role else { continue };
        match args.value(b.argument_index) {
            Some(v) => out.push_str(&format!(", {name}={v}")),
            None => out.push_str(&format!(", {name}=null")),
        }
    }
    out
}
