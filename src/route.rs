//! Route table and the metadata scanner that builds it.
//!
//! One entry per eligible method, keyed by [`Signature`]. Build it once when
//! a controller is wrapped; after that it is only read, so it is shared
//! behind an `Arc` with no locking.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::args::Args;
use crate::descriptor::{Marker, MethodDescriptor, ReturnShape, Signature};
use crate::handler::Controller;
use crate::method::Method;

/// The role one argument plays in a route.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Role {
    Body,
    /// Substituted for the `{name}` placeholder in the path template.
    PathVariable(String),
    /// Rendered as `, name=value` in the query diagnostic.
    QueryParam(String),
}

/// Binds an argument position to a [`Role`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParameterBinding {
    pub argument_index: usize,
    pub role: Role,
}

/// Immutable routing metadata for one method.
#[derive(Clone, Debug)]
pub struct RouteEntry {
    signature: Signature,
    verb: Method,
    path_template: String,
    bindings: Vec<ParameterBinding>,
}

impl RouteEntry {
    /// Builds the entry for `descriptor` under `prefix`, or `None` when the
    /// method is not mapped or does not return an async reply.
    pub fn from_descriptor(prefix: &str, descriptor: &MethodDescriptor) -> Option<Self> {
        let (verb, raw_path) = descriptor.mapping()?;
        if descriptor.return_shape() != ReturnShape::Async {
            return None;
        }

        let mut bindings = Vec::new();
        let mut has_body = false;
        for (argument_index, p) in descriptor.params().iter().enumerate() {
            let role = if !has_body && p.has(|m| *m == Marker::Body) {
                has_body = true;
                Role::Body
            } else if let Some(name) = marker_name(p.markers(), p.name(), Marker::is_path_variable) {
                Role::PathVariable(name)
            } else if let Some(name) = marker_name(p.markers(), p.name(), Marker::is_query_param) {
                Role::QueryParam(name)
            } else {
                continue;
            };
            bindings.push(ParameterBinding { argument_index, role });
        }

        Some(Self {
            signature: descriptor.signature(),
            verb,
            path_template: join_path(prefix, raw_path),
            bindings,
        })
    }

    pub fn signature(&self) -> &Signature { &self.signature }
    pub fn verb(&self) -> Method { self.verb }
    pub fn path_template(&self) -> &str { &self.path_template }
    pub fn bindings(&self) -> &[ParameterBinding] { &self.bindings }

    /// Index of the body argument, if the route has one.
    pub fn body_index(&self) -> Option<usize> {
        self.bindings
            .iter()
            .find(|b| b.role == Role::Body)
            .map(|b| b.argument_index)
    }

    /// Number of live arguments a call must supply for every binding to
    /// refer to a real slot.
    pub fn min_arity(&self) -> usize {
        self.bindings
            .iter()
            .map(|b| b.argument_index + 1)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn covers(&self, args: &Args) -> bool {
        args.len() >= self.min_arity()
    }
}

fn marker_name(markers: &[Marker], param: &str, want: fn(&Marker) -> bool) -> Option<String> {
    let m = markers.iter().find(|m| want(m))?;
    let explicit = match m {
        Marker::PathVariable(n) | Marker::QueryParam(n) => n.as_deref(),
        Marker::Body => None,
    };
    Some(explicit.unwrap_or(param).to_owned())
}

impl Marker {
    fn is_path_variable(&self) -> bool {
        matches!(self, Self::PathVariable(_))
    }

    fn is_query_param(&self) -> bool {
        matches!(self, Self::QueryParam(_))
    }
}

// ── Path joining ──────────────────────────────────────────────────────────────

/// Joins a controller prefix and a method path with a `/`, then collapses
/// every run of separators into one.
///
/// ```rust
/// use routelog::join_path;
///
/// assert_eq!(join_path("/book", "/all"), "/book/all");
/// assert_eq!(join_path("", "all"), "/all");
/// ```
pub fn join_path(prefix: &str, path: &str) -> String {
    normalize_path(&format!("{prefix}/{path}"))
}

/// Collapses repeated `/` separators.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' && prev_slash {
            continue;
        }
        prev_slash = c == '/';
        out.push(c);
    }
    out
}

// ── RouteTable ────────────────────────────────────────────────────────────────

/// The read-only collection of route entries for one controller.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: HashMap<Signature, Arc<RouteEntry>>,
}

impl RouteTable {
    /// Scans every method `controller` declares.
    ///
    /// Unmapped methods are skipped quietly. Mapped methods that do not
    /// return an async reply are skipped with a warning, as are later
    /// duplicates of an already registered signature.
    pub fn scan<C: Controller + ?Sized>(controller: &C) -> Self {
        let prefix = controller.base_path();
        let mut routes = HashMap::new();

        for descriptor in controller.methods() {
            if descriptor.mapping().is_none() {
                continue;
            }
            let Some(entry) = RouteEntry::from_descriptor(prefix, &descriptor) else {
                warn!(
                    controller = controller.name(),
                    method = %descriptor.signature(),
                    "mapped method does not return an async reply, not intercepted"
                );
                continue;
            };
            if routes.contains_key(entry.signature()) {
                warn!(
                    controller = controller.name(),
                    method = %entry.signature(),
                    "duplicate method signature, keeping the first"
                );
                continue;
            }
            debug!(
                controller = controller.name(),
                method = %entry.signature(),
                verb = %entry.verb(),
                path = entry.path_template(),
                "route registered"
            );
            routes.insert(entry.signature().clone(), Arc::new(entry));
        }

        Self { routes }
    }

    pub fn get(&self, signature: &Signature) -> Option<&Arc<RouteEntry>> {
        self.routes.get(signature)
    }

    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.routes.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.values().map(|e| &**e)
    }
}
